//! Prefs command - session timeout preference.

use anyhow::Result;
use clap::{Args, Subcommand};

use evexia_session::{SESSION_TIMEOUT_KEY, TimeoutConfig};
use evexia_store::LocalStorage;

use super::Context;

/// Arguments for the prefs command.
#[derive(Args, Debug)]
pub struct PrefsArgs {
    #[command(subcommand)]
    pub command: PrefsCommand,
}

#[derive(Subcommand, Debug)]
pub enum PrefsCommand {
    /// Show the effective session timeout
    Show,

    /// Set the session timeout
    SetTimeout {
        /// Minutes of inactivity before automatic logout
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        minutes: u32,
    },

    /// Remove the stored timeout so the default applies
    ResetTimeout,
}

/// Run the prefs command.
pub async fn run(args: PrefsArgs, ctx: &Context) -> Result<()> {
    match args.command {
        PrefsCommand::Show => cmd_show(ctx),
        PrefsCommand::SetTimeout { minutes } => cmd_set_timeout(minutes, ctx),
        PrefsCommand::ResetTimeout => cmd_reset_timeout(ctx),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let storage = ctx.open_storage()?;
    let stored = storage.get_item(SESSION_TIMEOUT_KEY)?;
    let config = TimeoutConfig::parse(stored.as_deref());

    if ctx.json_output {
        let value = serde_json::json!({
            "timeout_minutes": config.minutes(),
            "stored": stored,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match stored {
        Some(raw) if raw.trim() == config.minutes().to_string() => {
            println!("Session timeout: {} min", config.minutes());
        }
        Some(raw) => println!(
            "Session timeout: {} min (default; stored value {:?} is invalid)",
            config.minutes(),
            raw
        ),
        None => println!("Session timeout: {} min (default)", config.minutes()),
    }
    Ok(())
}

fn cmd_set_timeout(minutes: u32, ctx: &Context) -> Result<()> {
    let storage = ctx.open_storage()?;
    TimeoutConfig::from_minutes(minutes).save(storage.as_ref())?;
    tracing::debug!(minutes = minutes, "Session timeout preference saved");
    println!("Session timeout set to {} min", minutes);
    Ok(())
}

fn cmd_reset_timeout(ctx: &Context) -> Result<()> {
    let storage = ctx.open_storage()?;
    TimeoutConfig::reset(storage.as_ref())?;
    println!(
        "Session timeout reset to default ({} min)",
        TimeoutConfig::default().minutes()
    );
    Ok(())
}
