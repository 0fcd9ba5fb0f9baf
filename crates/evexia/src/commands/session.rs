//! Session command - inactivity monitoring.

use std::io::BufRead;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use tokio::sync::mpsc;

use evexia_session::{
    ActivityKind, AuthStore, DriveOutcome, MonitorCommand, SessionHooks, SessionMonitor,
    SystemClock, TimeoutConfig,
};

use super::Context;

/// Arguments for the session command.
#[derive(Args, Debug)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Monitor the signed-in session until it expires or input ends.
    ///
    /// Every line on stdin counts as keyboard activity. Type `extend` to
    /// dismiss the expiry warning, or `logout` to sign out.
    Watch {
        /// Override the stored timeout preference (minutes)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        timeout_minutes: Option<u32>,
    },
}

/// Run the session command.
pub async fn run(args: SessionArgs, ctx: &Context) -> Result<()> {
    match args.command {
        SessionCommand::Watch { timeout_minutes } => cmd_watch(timeout_minutes, ctx).await,
    }
}

async fn cmd_watch(timeout_minutes: Option<u32>, ctx: &Context) -> Result<()> {
    let storage = ctx.open_storage()?;
    let auth = AuthStore::new(storage.clone());

    if !auth.is_authenticated() {
        bail!("Not signed in. Run `evexia auth login --token <TOKEN>` first.");
    }

    let config = match timeout_minutes {
        Some(minutes) => TimeoutConfig::from_minutes(minutes),
        None => TimeoutConfig::load(storage.as_ref()),
    };

    let hooks = ConsoleHooks {
        auth: auth.clone(),
        json: ctx.json_output,
    };
    let mut monitor = SessionMonitor::new(config, SystemClock::new(), hooks);

    let (tx, mut rx) = mpsc::channel(32);
    tx.send(MonitorCommand::SetAuthenticated(true)).await?;
    spawn_input_reader(tx, auth);

    if !ctx.json_output {
        println!(
            "Watching session (timeout: {} min). Press Enter for activity, `extend` to stay signed in, `logout` to sign out.",
            config.minutes()
        );
    }

    let outcome = evexia_session::drive(&mut monitor, &mut rx).await;

    match outcome {
        DriveOutcome::LoggedOut => emit(ctx.json_output, "logged_out", None),
        DriveOutcome::SignedOut => emit(ctx.json_output, "signed_out", None),
        DriveOutcome::Shutdown => emit(ctx.json_output, "stopped", None),
    }

    Ok(())
}

/// Forward stdin lines to the monitor from a detached thread.
///
/// The thread must never be joined: a pending read would hold the runtime open.
fn spawn_input_reader(tx: mpsc::Sender<MonitorCommand>, auth: AuthStore) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let command = match line.trim() {
                "extend" => MonitorCommand::Extend,
                "logout" => {
                    if let Err(e) = auth.logout() {
                        tracing::warn!(error = %e, "Failed to clear credentials");
                    }
                    let _ = tx.blocking_send(MonitorCommand::SetAuthenticated(false));
                    return;
                }
                _ => MonitorCommand::Activity(ActivityKind::Keyboard),
            };
            if tx.blocking_send(command).is_err() {
                return;
            }
        }
        let _ = tx.blocking_send(MonitorCommand::Shutdown);
    });
}

/// Prints monitor events and clears credentials on expiry.
struct ConsoleHooks {
    auth: AuthStore,
    json: bool,
}

impl SessionHooks for ConsoleHooks {
    fn on_logout(&mut self) {
        self.auth.on_logout();
        if !self.json {
            println!(
                "Session expired due to inactivity at {}.",
                chrono::Local::now().format("%H:%M:%S")
            );
        }
    }

    fn on_warning(&mut self, remaining: Duration) {
        emit(self.json, "warning", Some(remaining));
        if !self.json {
            println!("Type `extend` to stay signed in.");
        }
    }

    fn on_countdown(&mut self, remaining: Duration) {
        let secs = remaining.as_secs();
        if secs % 10 == 0 || secs <= 5 {
            emit(self.json, "countdown", Some(remaining));
        }
    }

    fn on_warning_cleared(&mut self) {
        emit(self.json, "extended", None);
    }
}

fn emit(json: bool, event: &str, remaining: Option<Duration>) {
    if json {
        let value = serde_json::json!({
            "event": event,
            "remaining_secs": remaining.map(|r| r.as_secs()),
            "at": chrono::Utc::now().to_rfc3339(),
        });
        println!("{}", value);
        return;
    }

    match (event, remaining) {
        ("warning", Some(r)) => println!(
            "Your session will expire in {}s due to inactivity.",
            r.as_secs()
        ),
        ("countdown", Some(r)) => println!("  {}s remaining", r.as_secs()),
        ("extended", _) => println!("Session extended."),
        ("logged_out", _) => println!("Signed out after inactivity."),
        ("signed_out", _) => println!("Signed out."),
        ("stopped", _) => println!("Session monitoring stopped."),
        _ => {}
    }
}
