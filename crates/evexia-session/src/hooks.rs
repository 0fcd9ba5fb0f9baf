//! Callbacks from the session monitor to its collaborators.

use std::time::Duration;

/// Receives session monitor events.
///
/// `on_logout` is the terminal action and is required; the warning
/// callbacks default to doing nothing, for collaborators that only need
/// the logout.
pub trait SessionHooks {
    /// The session expired. Called exactly once per expiry.
    fn on_logout(&mut self);

    /// The warning window opened with `remaining` time left.
    fn on_warning(&mut self, _remaining: Duration) {}

    /// The warning countdown was recomputed.
    fn on_countdown(&mut self, _remaining: Duration) {}

    /// The warning was dismissed by activity or an explicit extension.
    fn on_warning_cleared(&mut self) {}
}

/// Hooks that ignore every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl SessionHooks for NoHooks {
    fn on_logout(&mut self) {}
}

impl<H: SessionHooks + ?Sized> SessionHooks for Box<H> {
    fn on_logout(&mut self) {
        (**self).on_logout()
    }

    fn on_warning(&mut self, remaining: Duration) {
        (**self).on_warning(remaining)
    }

    fn on_countdown(&mut self, remaining: Duration) {
        (**self).on_countdown(remaining)
    }

    fn on_warning_cleared(&mut self) {
        (**self).on_warning_cleared()
    }
}
