//! Deferred work for the engine: the periodic clock tick and the delayed
//! mismatch reset.
//!
//! Timers live in a min-heap ordered by `(due, sequence)` so that events due
//! at the same instant fire in the order they were scheduled. Nothing here
//! reads a wall clock; the host passes `now` into [`Scheduler::pop_due`].

use std::{cmp::Ordering, collections::BinaryHeap, time::Duration};

/// Identity of a pending mismatch. A reset timer only acts when its token
/// still equals the session's live pending mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MismatchToken {
    pub session: u64,
    pub sequence: u64,
}

/// Handle returned by [`Scheduler::schedule`], used for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    ClockTick,
    MismatchReset(MismatchToken),
}

#[derive(Debug, Clone, Copy)]
pub struct ScheduledEvent {
    pub due: Duration,
    pub token: TimerToken,
    pub kind: TimerKind,
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.token == other.token
    }
}

impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap pops the earliest event first.
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.token.0.cmp(&self.token.0))
    }
}

#[derive(Debug, Default)]
pub struct Scheduler {
    heap: BinaryHeap<ScheduledEvent>,
    next_sequence: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Duration, kind: TimerKind) -> TimerToken {
        let token = TimerToken(self.next_sequence);
        self.next_sequence += 1;
        self.heap.push(ScheduledEvent { due, token, kind });
        token
    }

    /// Removes a pending timer. Returns `false` if it already fired or was
    /// cancelled.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        let before = self.heap.len();
        self.heap.retain(|event| event.token != token);
        self.heap.len() != before
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    /// Pops the earliest event if it is due at or before `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<ScheduledEvent> {
        if self.heap.peek().is_some_and(|event| event.due <= now) {
            self.heap.pop()
        } else {
            None
        }
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.heap.peek().map(|event| event.due)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn pops_in_due_order_then_schedule_order() {
        let mut scheduler = Scheduler::new();
        let token = MismatchToken {
            session: 0,
            sequence: 0,
        };
        scheduler.schedule(ms(30), TimerKind::ClockTick);
        scheduler.schedule(ms(10), TimerKind::MismatchReset(token));
        scheduler.schedule(ms(10), TimerKind::ClockTick);

        let kinds: Vec<TimerKind> = std::iter::from_fn(|| scheduler.pop_due(ms(100)))
            .map(|event| event.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                TimerKind::MismatchReset(token),
                TimerKind::ClockTick,
                TimerKind::ClockTick
            ]
        );
    }

    #[test]
    fn holds_back_events_that_are_not_due() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(ms(50), TimerKind::ClockTick);
        assert!(scheduler.pop_due(ms(49)).is_none());
        assert_eq!(scheduler.next_due(), Some(ms(50)));
        assert!(scheduler.pop_due(ms(50)).is_some());
        assert!(scheduler.is_empty());
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let mut scheduler = Scheduler::new();
        let tick = scheduler.schedule(ms(10), TimerKind::ClockTick);
        scheduler.schedule(ms(20), TimerKind::ClockTick);

        assert!(scheduler.cancel(tick));
        assert!(!scheduler.cancel(tick));
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.pop_due(ms(100)).map(|e| e.due), Some(ms(20)));
    }
}
