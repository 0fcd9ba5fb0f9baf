//! Inactivity-based automatic logout.

use std::time::Duration;

use tracing::{debug, info, trace};

use crate::clock::Clock;
use crate::config::{ACTIVITY_THROTTLE, COUNTDOWN_INTERVAL, TimeoutConfig, WARNING_WINDOW};
use crate::hooks::SessionHooks;
use crate::timers::{TimerKind, TimerQueue};

/// Lifecycle of a monitored session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No authenticated session is being monitored.
    Inactive,
    /// Timers running, no warning shown.
    Active,
    /// Final window before logout; countdown visible.
    Warning,
    /// The session expired. Re-authentication starts a fresh cycle.
    LoggedOut,
}

/// Tracked user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Pointer,
    Keyboard,
    Scroll,
    Touch,
}

/// Point-in-time view of the monitor, for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutSnapshot {
    pub state: SessionState,
    pub last_activity: Option<Duration>,
    pub warning_shown_at: Option<Duration>,
    pub show_warning: bool,
    pub time_remaining: Option<Duration>,
}

/// Logs an authenticated user out after a period of inactivity.
///
/// The monitor is a plain state machine: it never sleeps or spawns. Time
/// comes from the injected [`Clock`], deadlines live in an internal timer
/// queue, and the owner calls [`poll`](Self::poll) whenever time may have
/// passed (see [`drive`](crate::drive) for a tokio host loop). Timers that
/// fire during one poll see their own deadline as the current time.
///
/// During the warning window both the logout timer and the countdown can end
/// the session; whichever runs first wins and the other is cancelled, so
/// [`SessionHooks::on_logout`] runs once per expiry.
pub struct SessionMonitor<C: Clock, H: SessionHooks> {
    clock: C,
    hooks: H,
    config: TimeoutConfig,
    state: SessionState,
    timers: TimerQueue,
    last_activity: Option<Duration>,
    warning_shown_at: Option<Duration>,
    time_remaining: Option<Duration>,
}

impl<C: Clock, H: SessionHooks> SessionMonitor<C, H> {
    /// Create an inactive monitor.
    pub fn new(config: TimeoutConfig, clock: C, hooks: H) -> Self {
        Self {
            clock,
            hooks,
            config,
            state: SessionState::Inactive,
            timers: TimerQueue::new(),
            last_activity: None,
            warning_shown_at: None,
            time_remaining: None,
        }
    }

    /// Follow the authentication state.
    ///
    /// Becoming authenticated starts a fresh cycle unless one is already
    /// running. Becoming unauthenticated cancels every timer.
    pub fn set_authenticated(&mut self, authenticated: bool) {
        match (authenticated, self.state) {
            (true, SessionState::Inactive | SessionState::LoggedOut) => {
                let now = self.clock.now();
                debug!(
                    timeout_minutes = self.config.minutes(),
                    "Session monitoring started"
                );
                self.reset(now);
            }
            (true, _) | (false, SessionState::Inactive) => {}
            (false, _) => self.teardown(),
        }
    }

    /// Record user input.
    ///
    /// Overdue timers fire first, so input arriving after the deadline
    /// cannot revive an expired session. Resets the timers unless the
    /// previous reset was less than a second ago. Returns whether the reset
    /// was applied.
    pub fn record_activity(&mut self, kind: ActivityKind) -> bool {
        self.poll();
        if !self.is_monitoring() {
            return false;
        }

        let now = self.clock.now();
        if let Some(last) = self.last_activity
            && now.saturating_sub(last) < ACTIVITY_THROTTLE
        {
            trace!(activity = ?kind, "Activity throttled");
            return false;
        }

        trace!(activity = ?kind, "Activity reset session timers");
        self.reset(now);
        true
    }

    /// Restart the full timeout window, typically from the warning prompt.
    ///
    /// Not throttled. Returns `false` when no session is being monitored,
    /// including one whose deadline passed before this call.
    pub fn extend_session(&mut self) -> bool {
        self.poll();
        if !self.is_monitoring() {
            return false;
        }
        let now = self.clock.now();
        debug!("Session extended");
        self.reset(now);
        true
    }

    /// Change the timeout. A running cycle restarts with the new length.
    pub fn set_timeout(&mut self, config: TimeoutConfig) {
        self.poll();
        self.config = config;
        if self.is_monitoring() {
            let now = self.clock.now();
            self.reset(now);
        }
    }

    /// Fire every timer that is due. Returns how many fired.
    pub fn poll(&mut self) -> usize {
        let now = self.clock.now();
        let mut fired = 0;
        while let Some((kind, at)) = self.timers.pop_due(now) {
            fired += 1;
            self.fire(kind, at);
        }
        fired
    }

    /// Stop monitoring and cancel all timers.
    pub fn teardown(&mut self) {
        if self.state != SessionState::Inactive {
            debug!(from = ?self.state, "Session monitoring stopped");
        }
        self.timers.cancel_all();
        self.state = SessionState::Inactive;
        self.last_activity = None;
        self.warning_shown_at = None;
        self.time_remaining = None;
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether timers are running.
    pub fn is_monitoring(&self) -> bool {
        matches!(self.state, SessionState::Active | SessionState::Warning)
    }

    /// Whether the warning countdown should be visible.
    pub fn show_warning(&self) -> bool {
        self.state == SessionState::Warning
    }

    /// Remaining time while the warning is shown.
    pub fn time_remaining(&self) -> Option<Duration> {
        self.time_remaining
    }

    /// When the last applied activity happened.
    pub fn last_activity(&self) -> Option<Duration> {
        self.last_activity
    }

    /// When the warning window opened.
    pub fn warning_shown_at(&self) -> Option<Duration> {
        self.warning_shown_at
    }

    /// The configured timeout.
    pub fn timeout(&self) -> TimeoutConfig {
        self.config
    }

    /// When `kind` is next due, if pending.
    pub fn scheduled(&self, kind: TimerKind) -> Option<Duration> {
        self.timers.deadline(kind)
    }

    /// The earliest pending deadline, on the monitor's clock.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    /// Everything a UI needs to render the session state.
    pub fn snapshot(&self) -> TimeoutSnapshot {
        TimeoutSnapshot {
            state: self.state,
            last_activity: self.last_activity,
            warning_shown_at: self.warning_shown_at,
            show_warning: self.show_warning(),
            time_remaining: self.time_remaining,
        }
    }

    /// The injected clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// The injected hooks.
    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Mutable access to the injected hooks.
    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    /// Start a fresh window at `now`, replacing all timers.
    fn reset(&mut self, now: Duration) {
        let was_warning = self.state == SessionState::Warning;

        self.timers.cancel_all();
        self.state = SessionState::Active;
        self.last_activity = Some(now);
        self.warning_shown_at = None;
        self.time_remaining = None;

        if let Some(delay) = self.config.warning_delay() {
            self.timers.schedule_once(TimerKind::Warning, now + delay);
        }
        self.timers
            .schedule_once(TimerKind::Logout, now + self.config.duration());

        if was_warning {
            self.hooks.on_warning_cleared();
        }
    }

    fn fire(&mut self, kind: TimerKind, at: Duration) {
        match kind {
            TimerKind::Warning => self.open_warning(at),
            TimerKind::Logout => self.expire(at, "logout timer"),
            TimerKind::Countdown => self.tick_countdown(at),
        }
    }

    fn open_warning(&mut self, at: Duration) {
        if self.state != SessionState::Active {
            return;
        }

        self.state = SessionState::Warning;
        self.warning_shown_at = Some(at);
        self.time_remaining = Some(WARNING_WINDOW);
        self.timers.schedule_repeating(
            TimerKind::Countdown,
            at + COUNTDOWN_INTERVAL,
            COUNTDOWN_INTERVAL,
        );

        debug!(at_ms = at.as_millis() as u64, "Session timeout warning shown");
        self.hooks.on_warning(WARNING_WINDOW);
    }

    fn tick_countdown(&mut self, at: Duration) {
        let Some(shown_at) = self.warning_shown_at else {
            self.timers.cancel(TimerKind::Countdown);
            return;
        };

        let remaining = WARNING_WINDOW.saturating_sub(at.saturating_sub(shown_at));
        self.time_remaining = Some(remaining);

        if remaining.is_zero() {
            self.expire(at, "countdown");
        } else {
            self.hooks.on_countdown(remaining);
        }
    }

    /// Terminal action shared by both logout paths.
    fn expire(&mut self, at: Duration, trigger: &'static str) {
        if !self.is_monitoring() {
            return;
        }

        self.timers.cancel_all();
        self.state = SessionState::LoggedOut;
        self.warning_shown_at = None;
        self.time_remaining = None;

        info!(
            at_ms = at.as_millis() as u64,
            trigger = trigger,
            "Session expired due to inactivity"
        );
        self.hooks.on_logout();
    }
}

impl<C: Clock + std::fmt::Debug, H: SessionHooks> std::fmt::Debug for SessionMonitor<C, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionMonitor")
            .field("clock", &self.clock)
            .field("config", &self.config)
            .field("state", &self.state)
            .field("timers", &self.timers)
            .field("last_activity", &self.last_activity)
            .finish()
    }
}
