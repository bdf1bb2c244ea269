//! Expiry timers and the default-timeout policy.
//!
//! Timers are plain deadlines. The event loop sleeps until
//! [`TimeoutScheduler::next_deadline`] and then collects whatever expired, so
//! cancelling a timer is just removing its deadline: nothing can fire after
//! [`TimeoutScheduler::stop`] returns.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::value::HintValue;

/// `expire_timeout` value asking the server to pick the duration.
pub const DEFAULT_EXPIRE_TIMEOUT: i32 = -1;

/// Notification urgency from the `urgency` hint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Urgency {
    #[default]
    Low = 0,
    Normal = 1,
    Critical = 2,
}

impl Urgency {
    /// Read the `urgency` hint. Missing or out-of-range values count as low.
    pub fn from_hint(hint: Option<&HintValue>) -> Self {
        match hint.and_then(HintValue::as_int) {
            Some(1) => Urgency::Normal,
            Some(2) => Urgency::Critical,
            _ => Urgency::Low,
        }
    }
}

/// Per-urgency default durations in milliseconds. 0 means never expire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutPolicy {
    pub low: u32,
    pub normal: u32,
    pub critical: u32,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            low: 3500,
            normal: 5000,
            critical: 0,
        }
    }
}

impl TimeoutPolicy {
    /// Effective expiry for a `Notify` call.
    ///
    /// Negative requests use the urgency table, 0 never expires, anything
    /// else is taken verbatim. `None` means the notification stays until closed.
    pub fn effective(&self, requested: i32, urgency: Urgency) -> Option<Duration> {
        let ms = if requested < 0 {
            match urgency {
                Urgency::Low => self.low,
                Urgency::Normal => self.normal,
                Urgency::Critical => self.critical,
            }
        } else {
            requested as u32
        };
        (ms > 0).then(|| Duration::from_millis(u64::from(ms)))
    }
}

/// Identity of one armed countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

/// Per-notification one-shot timers.
#[derive(Debug, Default)]
pub struct TimeoutScheduler {
    /// Armed deadlines in firing order
    queue: BTreeSet<(Instant, TimerToken, u32)>,
    /// Notification id → its armed deadline
    armed: HashMap<u32, (Instant, TimerToken)>,
    next_token: u64,
}

impl TimeoutScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a timer for `id`, replacing any running one.
    ///
    /// A restart counts the full duration again from `now`.
    pub fn start(&mut self, id: u32, duration: Duration, now: Instant) -> TimerToken {
        self.stop(id);

        let token = TimerToken(self.next_token);
        self.next_token += 1;

        let deadline = now + duration;
        self.queue.insert((deadline, token, id));
        self.armed.insert(id, (deadline, token));
        token
    }

    /// Cancel the timer for `id`. Returns whether one was running.
    pub fn stop(&mut self, id: u32) -> bool {
        match self.armed.remove(&id) {
            Some((deadline, token)) => {
                self.queue.remove(&(deadline, token, id));
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self, id: u32) -> bool {
        self.armed.contains_key(&id)
    }

    /// When the timer for `id` will fire.
    pub fn deadline(&self, id: u32) -> Option<Instant> {
        self.armed.get(&id).map(|&(deadline, _)| deadline)
    }

    /// Earliest armed deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.first().map(|&(deadline, _, _)| deadline)
    }

    /// Disarm and return every timer whose deadline is at or before `now`,
    /// earliest first.
    pub fn expire(&mut self, now: Instant) -> Vec<u32> {
        let mut fired = Vec::new();
        while let Some(&(deadline, token, id)) = self.queue.first() {
            if deadline > now {
                break;
            }
            self.queue.remove(&(deadline, token, id));
            self.armed.remove(&id);
            fired.push(id);
        }
        fired
    }

    pub fn len(&self) -> usize {
        self.armed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.armed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_default_policy_by_urgency() {
        let policy = TimeoutPolicy::default();
        assert_eq!(policy.effective(-1, Urgency::Low), Some(ms(3500)));
        assert_eq!(policy.effective(-1, Urgency::Normal), Some(ms(5000)));
        assert_eq!(policy.effective(-1, Urgency::Critical), None);
    }

    #[test]
    fn test_explicit_timeouts() {
        let policy = TimeoutPolicy::default();
        assert_eq!(policy.effective(0, Urgency::Normal), None);
        assert_eq!(policy.effective(1234, Urgency::Critical), Some(ms(1234)));
    }

    #[test]
    fn test_urgency_from_hint() {
        assert_eq!(Urgency::from_hint(None), Urgency::Low);
        assert_eq!(Urgency::from_hint(Some(&HintValue::Int(1))), Urgency::Normal);
        assert_eq!(Urgency::from_hint(Some(&HintValue::Int(2))), Urgency::Critical);
        assert_eq!(Urgency::from_hint(Some(&HintValue::Int(7))), Urgency::Low);
        assert_eq!(Urgency::from_hint(Some(&"2".into())), Urgency::Low);
    }

    #[test]
    fn test_fires_once_at_deadline() {
        let t0 = Instant::now();
        let mut sched = TimeoutScheduler::new();
        sched.start(1, ms(1000), t0);

        assert!(sched.expire(t0 + ms(999)).is_empty());
        assert_eq!(sched.expire(t0 + ms(1000)), vec![1]);
        assert!(sched.expire(t0 + ms(5000)).is_empty());
        assert!(!sched.is_armed(1));
    }

    #[test]
    fn test_stop_then_start_resets_countdown() {
        let t0 = Instant::now();
        let mut sched = TimeoutScheduler::new();
        sched.start(1, ms(1000), t0);

        assert!(sched.stop(1));
        sched.start(1, ms(1000), t0 + ms(900));

        assert!(sched.expire(t0 + ms(1000)).is_empty());
        assert!(sched.expire(t0 + ms(1899)).is_empty());
        assert_eq!(sched.expire(t0 + ms(1900)), vec![1]);
    }

    #[test]
    fn test_restart_does_not_accumulate() {
        let t0 = Instant::now();
        let mut sched = TimeoutScheduler::new();
        sched.start(1, ms(1000), t0);
        sched.start(1, ms(1000), t0 + ms(500));

        assert_eq!(sched.len(), 1);
        assert_eq!(sched.deadline(1), Some(t0 + ms(1500)));
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut sched = TimeoutScheduler::new();
        assert!(!sched.stop(42));
        sched.start(42, ms(10), Instant::now());
        assert!(sched.stop(42));
        assert!(!sched.stop(42));
        assert_eq!(sched.next_deadline(), None);
    }

    #[test]
    fn test_expire_orders_by_deadline() {
        let t0 = Instant::now();
        let mut sched = TimeoutScheduler::new();
        sched.start(3, ms(300), t0);
        sched.start(1, ms(100), t0);
        sched.start(2, ms(200), t0);

        assert_eq!(sched.next_deadline(), Some(t0 + ms(100)));
        assert_eq!(sched.expire(t0 + ms(300)), vec![1, 2, 3]);
        assert!(sched.is_empty());
    }
}
