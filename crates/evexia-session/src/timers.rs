//! Deferred actions of the session monitor.

use std::collections::BTreeMap;
use std::time::Duration;

/// The monitor's deferred actions.
///
/// Declaration order breaks ties between timers due at the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerKind {
    /// One-shot: enter the warning window.
    Warning,
    /// One-shot: end the session.
    Logout,
    /// Recurring: recompute the remaining time during the warning window.
    Countdown,
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    deadline: Duration,
    period: Option<Duration>,
}

/// Pending deadlines, at most one per [`TimerKind`].
///
/// Scheduling a kind that is already pending replaces it, so a reset can
/// never leave a stale timer running next to its replacement.
#[derive(Debug, Default)]
pub struct TimerQueue {
    timers: BTreeMap<TimerKind, Scheduled>,
}

impl TimerQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a one-shot timer at `deadline`.
    pub fn schedule_once(&mut self, kind: TimerKind, deadline: Duration) {
        self.timers.insert(
            kind,
            Scheduled {
                deadline,
                period: None,
            },
        );
    }

    /// Schedule a recurring timer, first due at `first`.
    pub fn schedule_repeating(&mut self, kind: TimerKind, first: Duration, period: Duration) {
        self.timers.insert(
            kind,
            Scheduled {
                deadline: first,
                period: Some(period),
            },
        );
    }

    /// Cancel a timer. Returns whether it was pending.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        self.timers.remove(&kind).is_some()
    }

    /// Cancel every timer.
    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    /// When `kind` is next due, if pending.
    pub fn deadline(&self, kind: TimerKind) -> Option<Duration> {
        self.timers.get(&kind).map(|s| s.deadline)
    }

    /// The earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.values().map(|s| s.deadline).min()
    }

    /// Take the earliest timer due at or before `now`.
    ///
    /// Returns the kind and the deadline it was due at. Recurring timers are
    /// rescheduled one period later; one-shot timers are removed.
    pub fn pop_due(&mut self, now: Duration) -> Option<(TimerKind, Duration)> {
        let (kind, scheduled) = self
            .timers
            .iter()
            .filter(|(_, s)| s.deadline <= now)
            .min_by_key(|(kind, s)| (s.deadline, **kind))
            .map(|(kind, s)| (*kind, *s))?;

        match scheduled.period {
            Some(period) if !period.is_zero() => {
                self.timers.insert(
                    kind,
                    Scheduled {
                        deadline: scheduled.deadline + period,
                        period: Some(period),
                    },
                );
            }
            _ => {
                self.timers.remove(&kind);
            }
        }

        Some((kind, scheduled.deadline))
    }

    /// Number of pending timers.
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// Check if no timers are pending.
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_pop_due_in_deadline_order() {
        let mut queue = TimerQueue::new();
        queue.schedule_once(TimerKind::Logout, secs(10));
        queue.schedule_once(TimerKind::Warning, secs(5));

        assert_eq!(queue.pop_due(secs(4)), None);
        assert_eq!(queue.pop_due(secs(20)), Some((TimerKind::Warning, secs(5))));
        assert_eq!(queue.pop_due(secs(20)), Some((TimerKind::Logout, secs(10))));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_ties_break_by_kind() {
        let mut queue = TimerQueue::new();
        queue.schedule_repeating(TimerKind::Countdown, secs(10), secs(1));
        queue.schedule_once(TimerKind::Logout, secs(10));

        assert_eq!(queue.pop_due(secs(10)), Some((TimerKind::Logout, secs(10))));
        assert_eq!(
            queue.pop_due(secs(10)),
            Some((TimerKind::Countdown, secs(10)))
        );
    }

    #[test]
    fn test_repeating_reschedules() {
        let mut queue = TimerQueue::new();
        queue.schedule_repeating(TimerKind::Countdown, secs(1), secs(1));

        assert_eq!(queue.pop_due(secs(3)), Some((TimerKind::Countdown, secs(1))));
        assert_eq!(queue.pop_due(secs(3)), Some((TimerKind::Countdown, secs(2))));
        assert_eq!(queue.pop_due(secs(3)), Some((TimerKind::Countdown, secs(3))));
        assert_eq!(queue.pop_due(secs(3)), None);
        assert_eq!(queue.deadline(TimerKind::Countdown), Some(secs(4)));
    }

    #[test]
    fn test_reschedule_replaces() {
        let mut queue = TimerQueue::new();
        queue.schedule_once(TimerKind::Logout, secs(10));
        queue.schedule_once(TimerKind::Logout, secs(30));

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.deadline(TimerKind::Logout), Some(secs(30)));
    }

    #[test]
    fn test_cancel() {
        let mut queue = TimerQueue::new();
        queue.schedule_once(TimerKind::Warning, secs(1));
        queue.schedule_once(TimerKind::Logout, secs(2));

        assert!(queue.cancel(TimerKind::Warning));
        assert!(!queue.cancel(TimerKind::Warning));
        assert_eq!(queue.next_deadline(), Some(secs(2)));

        queue.cancel_all();
        assert_eq!(queue.next_deadline(), None);
        assert_eq!(queue.pop_due(secs(100)), None);
    }
}
