//! Keyed cancellable deadlines
//!
//! At most one deadline per key. Scheduling a key again replaces its
//! deadline; cancelling removes it before it can fire.

use std::collections::HashMap;
use std::hash::Hash;
use tokio::time::Instant;

/// Timers owned by the environment monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKey {
    /// Blur grace period
    FocusLoss,
    /// Mouse-outside grace period
    MouseAway,
    /// Corrective fullscreen request after an exit
    FullscreenReentry,
    /// Periodic fullscreen re-assertion
    FullscreenReassert,
}

#[derive(Debug, Clone)]
pub struct DebounceTimers<K> {
    deadlines: HashMap<K, Instant>,
}

impl<K> Default for DebounceTimers<K> {
    fn default() -> Self {
        Self {
            deadlines: HashMap::new(),
        }
    }
}

impl<K: Copy + Eq + Hash + Ord> DebounceTimers<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, key: K, at: Instant) {
        self.deadlines.insert(key, at);
    }

    /// Returns whether a pending deadline was removed
    pub fn cancel(&mut self, key: K) -> bool {
        self.deadlines.remove(&key).is_some()
    }

    pub fn is_pending(&self, key: K) -> bool {
        self.deadlines.contains_key(&key)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    /// Remove and return every key due at `now`, earliest first
    pub fn take_due(&mut self, now: Instant) -> Vec<K> {
        let mut due: Vec<(Instant, K)> = self
            .deadlines
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(key, at)| (*at, *key))
            .collect();
        due.sort();
        for (_, key) in &due {
            self.deadlines.remove(key);
        }
        due.into_iter().map(|(_, key)| key).collect()
    }

    pub fn clear(&mut self) {
        self.deadlines.clear();
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_cancel_before_due() {
        let t0 = Instant::now();
        let mut timers = DebounceTimers::new();
        timers.schedule(TimerKey::FocusLoss, t0 + Duration::from_secs(5));
        assert!(timers.is_pending(TimerKey::FocusLoss));
        assert!(timers.cancel(TimerKey::FocusLoss));
        assert!(!timers.is_pending(TimerKey::FocusLoss));
        assert!(!timers.cancel(TimerKey::FocusLoss));
        assert!(timers.take_due(t0 + Duration::from_secs(10)).is_empty());
    }

    #[test]
    fn test_reschedule_replaces() {
        let t0 = Instant::now();
        let mut timers = DebounceTimers::new();
        timers.schedule(TimerKey::MouseAway, t0 + Duration::from_secs(2));
        timers.schedule(TimerKey::MouseAway, t0 + Duration::from_secs(4));
        assert_eq!(timers.len(), 1);
        assert!(timers.take_due(t0 + Duration::from_secs(3)).is_empty());
        assert_eq!(timers.take_due(t0 + Duration::from_secs(4)), vec![TimerKey::MouseAway]);
    }

    #[test]
    fn test_due_in_deadline_order() {
        let t0 = Instant::now();
        let mut timers = DebounceTimers::new();
        timers.schedule(TimerKey::FullscreenReassert, t0 + Duration::from_secs(3));
        timers.schedule(TimerKey::FocusLoss, t0 + Duration::from_secs(1));
        assert_eq!(timers.next_deadline(), Some(t0 + Duration::from_secs(1)));
        assert_eq!(
            timers.take_due(t0 + Duration::from_secs(5)),
            vec![TimerKey::FocusLoss, TimerKey::FullscreenReassert]
        );
        assert!(timers.is_empty());
    }
}
