//! Session timeout preference.

use std::time::Duration;

use evexia_store::LocalStorage;
use tracing::{debug, warn};

/// Local storage key holding the timeout in minutes.
pub const SESSION_TIMEOUT_KEY: &str = "sessionTimeout";

/// Timeout used when no valid preference is stored.
pub const DEFAULT_TIMEOUT_MINUTES: u32 = 30;

/// Length of the warning window before logout.
pub const WARNING_WINDOW: Duration = Duration::from_millis(60_000);

/// Minimum spacing between activity-triggered resets.
pub const ACTIVITY_THROTTLE: Duration = Duration::from_millis(1_000);

/// Countdown refresh period during the warning window.
pub const COUNTDOWN_INTERVAL: Duration = Duration::from_millis(1_000);

/// Inactivity timeout, in whole minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    minutes: u32,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            minutes: DEFAULT_TIMEOUT_MINUTES,
        }
    }
}

impl TimeoutConfig {
    /// Create a configuration with an explicit timeout.
    pub fn from_minutes(minutes: u32) -> Self {
        Self { minutes }
    }

    /// Parse a stored preference, falling back to the default.
    ///
    /// Missing, non-numeric, negative and zero values all yield
    /// [`DEFAULT_TIMEOUT_MINUTES`].
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim).map(str::parse::<u32>) {
            Some(Ok(minutes)) if minutes > 0 => Self { minutes },
            Some(_) => {
                warn!(raw = ?raw, "Invalid session timeout preference, using default");
                Self::default()
            }
            None => Self::default(),
        }
    }

    /// Read the preference from local storage.
    ///
    /// Storage errors are logged and treated like a missing value.
    pub fn load(storage: &dyn LocalStorage) -> Self {
        match storage.get_item(SESSION_TIMEOUT_KEY) {
            Ok(raw) => {
                let config = Self::parse(raw.as_deref());
                debug!(minutes = config.minutes, "Loaded session timeout preference");
                config
            }
            Err(e) => {
                warn!(error = %e, "Failed to read session timeout preference, using default");
                Self::default()
            }
        }
    }

    /// Persist the preference to local storage.
    pub fn save(&self, storage: &dyn LocalStorage) -> evexia_store::Result<()> {
        storage.set_item(SESSION_TIMEOUT_KEY, &self.minutes.to_string())
    }

    /// Remove the stored preference so the default applies again.
    pub fn reset(storage: &dyn LocalStorage) -> evexia_store::Result<()> {
        storage.remove_item(SESSION_TIMEOUT_KEY)
    }

    /// Timeout in minutes.
    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    /// Timeout as a duration.
    pub fn duration(&self) -> Duration {
        Duration::from_millis(u64::from(self.minutes) * 60_000)
    }

    /// Delay before the warning window opens.
    ///
    /// `None` when the timeout is no longer than the window itself.
    pub fn warning_delay(&self) -> Option<Duration> {
        self.duration()
            .checked_sub(WARNING_WINDOW)
            .filter(|delay| !delay.is_zero())
    }
}
