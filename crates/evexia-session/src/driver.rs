//! Real-time host loop for the session monitor.

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::debug;

use crate::clock::SystemClock;
use crate::config::TimeoutConfig;
use crate::hooks::SessionHooks;
use crate::monitor::{ActivityKind, SessionMonitor, SessionState};

/// Input delivered to a driven monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorCommand {
    /// Tracked user input.
    Activity(ActivityKind),
    /// Explicit "stay signed in".
    Extend,
    /// Authentication changed.
    SetAuthenticated(bool),
    /// The timeout preference changed.
    SetTimeout(TimeoutConfig),
    /// Stop driving.
    Shutdown,
}

/// Why [`drive`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    /// The session expired.
    LoggedOut,
    /// Authentication was withdrawn by the owner.
    SignedOut,
    /// Shutdown was requested or every sender was dropped.
    Shutdown,
}

/// Run `monitor` against real time until the session expires, the user
/// signs out, or the command channel shuts down.
///
/// Sleeps until the monitor's next deadline, polling it on wake, while
/// applying commands as they arrive. An overdue deadline is always handled
/// before a queued command. Every timer is cancelled before returning.
pub async fn drive<H: SessionHooks>(
    monitor: &mut SessionMonitor<SystemClock, H>,
    commands: &mut mpsc::Receiver<MonitorCommand>,
) -> DriveOutcome {
    loop {
        let deadline = monitor
            .next_deadline()
            .map(|offset| monitor.clock().instant_at(offset));

        tokio::select! {
            biased;

            _ = wait_until(deadline) => {
                monitor.poll();
            }
            command = commands.recv() => match command {
                Some(MonitorCommand::Shutdown) | None => {
                    debug!("Session driver shutting down");
                    monitor.teardown();
                    return DriveOutcome::Shutdown;
                }
                Some(MonitorCommand::SetAuthenticated(false)) => {
                    debug!("Session driver stopping after sign-out");
                    monitor.set_authenticated(false);
                    return DriveOutcome::SignedOut;
                }
                Some(command) => apply(monitor, command),
            },
        }

        if monitor.state() == SessionState::LoggedOut {
            return DriveOutcome::LoggedOut;
        }
    }
}

fn apply<H: SessionHooks>(monitor: &mut SessionMonitor<SystemClock, H>, command: MonitorCommand) {
    match command {
        MonitorCommand::Activity(kind) => {
            monitor.record_activity(kind);
        }
        MonitorCommand::Extend => {
            monitor.extend_session();
        }
        MonitorCommand::SetAuthenticated(authenticated) => {
            monitor.set_authenticated(authenticated);
        }
        MonitorCommand::SetTimeout(config) => monitor.set_timeout(config),
        MonitorCommand::Shutdown => monitor.teardown(),
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct Counter {
        logouts: usize,
        warnings: usize,
    }

    impl SessionHooks for Counter {
        fn on_logout(&mut self) {
            self.logouts += 1;
        }

        fn on_warning(&mut self, _remaining: Duration) {
            self.warnings += 1;
        }
    }

    fn monitor(minutes: u32) -> SessionMonitor<SystemClock, Counter> {
        SessionMonitor::new(
            TimeoutConfig::from_minutes(minutes),
            SystemClock::new(),
            Counter::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_drive_until_logout() {
        let mut monitor = monitor(2);
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(MonitorCommand::SetAuthenticated(true))
            .await
            .unwrap();

        let started = Instant::now();
        let outcome = drive(&mut monitor, &mut rx).await;

        assert_eq!(outcome, DriveOutcome::LoggedOut);
        assert_eq!(monitor.hooks().warnings, 1);
        assert_eq!(monitor.hooks().logouts, 1);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(120));
        assert!(elapsed < Duration::from_secs(121));
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_keeps_session_alive() {
        let mut monitor = monitor(2);
        let (tx, mut rx) = mpsc::channel(8);

        let script = async {
            tx.send(MonitorCommand::SetAuthenticated(true))
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_secs(50)).await;
            tx.send(MonitorCommand::Activity(ActivityKind::Keyboard))
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_secs(100)).await;
            tx.send(MonitorCommand::Shutdown).await.unwrap();
        };

        let (outcome, ()) = tokio::join!(drive(&mut monitor, &mut rx), script);

        assert_eq!(outcome, DriveOutcome::Shutdown);
        assert_eq!(monitor.hooks().logouts, 0);
        // Reset at 50s moved the warning from 60s to 110s.
        assert_eq!(monitor.hooks().warnings, 1);
        assert_eq!(monitor.state(), SessionState::Inactive);
        assert_eq!(monitor.next_deadline(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_extend_from_warning() {
        let mut monitor = monitor(2);
        let (tx, mut rx) = mpsc::channel(8);

        let script = async {
            tx.send(MonitorCommand::SetAuthenticated(true))
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_secs(100)).await;
            tx.send(MonitorCommand::Extend).await.unwrap();
            tokio::time::sleep(Duration::from_secs(100)).await;
            tx.send(MonitorCommand::SetAuthenticated(false))
                .await
                .unwrap();
        };

        let (outcome, ()) = tokio::join!(drive(&mut monitor, &mut rx), script);

        assert_eq!(outcome, DriveOutcome::SignedOut);
        assert_eq!(monitor.hooks().warnings, 2);
        assert_eq!(monitor.hooks().logouts, 0);
        assert_eq!(monitor.state(), SessionState::Inactive);
        assert_eq!(monitor.next_deadline(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overdue_deadline_beats_queued_activity() {
        let mut monitor = monitor(2);
        monitor.set_authenticated(true);

        let (tx, mut rx) = mpsc::channel(8);
        tx.send(MonitorCommand::Activity(ActivityKind::Pointer))
            .await
            .unwrap();
        tx.send(MonitorCommand::Extend).await.unwrap();
        tokio::time::advance(Duration::from_secs(200)).await;

        let outcome = drive(&mut monitor, &mut rx).await;

        assert_eq!(outcome, DriveOutcome::LoggedOut);
        assert_eq!(monitor.hooks().logouts, 1);
        assert_eq!(monitor.state(), SessionState::LoggedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_channel_shuts_down() {
        let mut monitor = monitor(5);
        let (tx, mut rx) = mpsc::channel(1);
        drop(tx);

        assert_eq!(drive(&mut monitor, &mut rx).await, DriveOutcome::Shutdown);
        assert_eq!(monitor.hooks().logouts, 0);
    }
}
