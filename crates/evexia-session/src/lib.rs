//! Session inactivity timeout for the Evexia admin front end.
//!
//! This crate provides:
//! - [`SessionMonitor`], an explicit state machine that logs the user out
//!   after inactivity, with a 60-second warning window before expiry
//! - Injectable time ([`Clock`], [`ManualClock`]) so timeouts can be
//!   simulated deterministically
//! - The timeout preference and stored credentials in local storage
//! - [`drive`], a tokio loop that runs a monitor against real time
//!
//! # Example
//!
//! ```rust,ignore
//! use evexia_session::{AuthStore, SessionMonitor, SystemClock, TimeoutConfig};
//!
//! let config = TimeoutConfig::load(storage.as_ref());
//! let mut monitor = SessionMonitor::new(config, SystemClock::new(), auth.clone());
//! monitor.set_authenticated(auth.is_authenticated());
//! ```

mod auth;
mod clock;
mod config;
mod driver;
mod hooks;
mod monitor;
mod timers;

pub use auth::{AuthStore, TOKEN_KEY, USER_KEY};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    ACTIVITY_THROTTLE, COUNTDOWN_INTERVAL, DEFAULT_TIMEOUT_MINUTES, SESSION_TIMEOUT_KEY,
    TimeoutConfig, WARNING_WINDOW,
};
pub use driver::{DriveOutcome, MonitorCommand, drive};
pub use hooks::{NoHooks, SessionHooks};
pub use monitor::{ActivityKind, SessionMonitor, SessionState, TimeoutSnapshot};
pub use timers::{TimerKind, TimerQueue};
