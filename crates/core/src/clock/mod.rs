use std::time::Duration;

use crate::timeline::{Scheduler, TimerKind, TimerToken};

/// Nominal period of the display tick.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(10);

/// Elapsed play time with a periodic tick driven through the [`Scheduler`].
#[derive(Debug, Clone)]
pub struct Clock {
    interval: Duration,
    started_at: Option<Duration>,
    elapsed: Duration,
    pending_tick: Option<TimerToken>,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL)
    }
}

impl Clock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            started_at: None,
            elapsed: Duration::ZERO,
            pending_tick: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Time as of the last tick. Frozen while stopped.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn display(&self) -> String {
        format_elapsed(self.elapsed)
    }

    /// Records `now` as the reference instant and schedules the first tick.
    /// Starting a running clock is a no-op.
    pub fn start(&mut self, now: Duration, scheduler: &mut Scheduler) {
        if self.is_running() {
            return;
        }
        self.started_at = Some(now);
        self.pending_tick = Some(scheduler.schedule(now + self.interval, TimerKind::ClockTick));
    }

    /// Handles a fired tick timer. Returns the new display string, or `None`
    /// when the timer belongs to a tick that was already cancelled.
    pub fn on_tick(
        &mut self,
        token: TimerToken,
        now: Duration,
        scheduler: &mut Scheduler,
    ) -> Option<String> {
        if self.pending_tick != Some(token) {
            return None;
        }
        let started_at = self.started_at?;
        self.elapsed = self.elapsed.max(now.saturating_sub(started_at));
        self.pending_tick = Some(scheduler.schedule(now + self.interval, TimerKind::ClockTick));
        Some(self.display())
    }

    /// Cancels the pending tick and discards the reference instant. The
    /// elapsed time stays at the last ticked value.
    pub fn stop(&mut self, scheduler: &mut Scheduler) -> String {
        if let Some(token) = self.pending_tick.take() {
            scheduler.cancel(token);
        }
        self.started_at = None;
        self.display()
    }

    /// Stops the clock and returns the elapsed time to zero.
    pub fn reset(&mut self, scheduler: &mut Scheduler) {
        self.stop(scheduler);
        self.elapsed = Duration::ZERO;
    }
}

/// Formats a duration as `mm:ss.mmm`. Minutes are unbounded and padded to at
/// least two digits.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_ms = elapsed.as_millis();
    let minutes = total_ms / 60_000;
    let seconds = (total_ms / 1_000) % 60;
    let millis = total_ms % 1_000;
    format!("{minutes:02}:{seconds:02}.{millis:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn fire_due(clock: &mut Clock, scheduler: &mut Scheduler, now: Duration) -> Vec<String> {
        let mut shown = Vec::new();
        while let Some(event) = scheduler.pop_due(now) {
            if let Some(text) = clock.on_tick(event.token, event.due, scheduler) {
                shown.push(text);
            }
        }
        shown
    }

    #[test]
    fn formats_minutes_seconds_and_millis() {
        assert_eq!(format_elapsed(Duration::ZERO), "00:00.000");
        assert_eq!(format_elapsed(ms(61_007)), "01:01.007");
        assert_eq!(format_elapsed(ms(59_999)), "00:59.999");
        assert_eq!(format_elapsed(ms(125 * 60_000 + 3_450)), "125:03.450");
    }

    #[test]
    fn ticks_every_interval_while_running() {
        let mut scheduler = Scheduler::new();
        let mut clock = Clock::default();
        clock.start(ms(1_000), &mut scheduler);

        let shown = fire_due(&mut clock, &mut scheduler, ms(1_035));
        assert_eq!(shown, vec!["00:00.010", "00:00.020", "00:00.030"]);
        assert_eq!(clock.elapsed(), ms(30));
        assert!(clock.is_running());
    }

    #[test]
    fn stop_freezes_elapsed_and_cancels_tick() {
        let mut scheduler = Scheduler::new();
        let mut clock = Clock::default();
        clock.start(ms(0), &mut scheduler);
        fire_due(&mut clock, &mut scheduler, ms(20));

        assert_eq!(clock.stop(&mut scheduler), "00:00.020");
        assert!(scheduler.is_empty());
        assert!(fire_due(&mut clock, &mut scheduler, ms(5_000)).is_empty());
        assert_eq!(clock.elapsed(), ms(20));
    }

    #[test]
    fn stale_tick_tokens_are_ignored() {
        let mut scheduler = Scheduler::new();
        let mut clock = Clock::default();
        clock.start(ms(0), &mut scheduler);
        let stale = scheduler.pop_due(ms(10)).unwrap();
        clock.stop(&mut scheduler);
        clock.start(ms(100), &mut scheduler);

        assert!(clock.on_tick(stale.token, ms(105), &mut scheduler).is_none());
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }

    #[test]
    fn reset_returns_to_zero() {
        let mut scheduler = Scheduler::new();
        let mut clock = Clock::default();
        clock.start(ms(0), &mut scheduler);
        fire_due(&mut clock, &mut scheduler, ms(500));
        clock.reset(&mut scheduler);
        assert_eq!(clock.display(), "00:00.000");
        assert!(!clock.is_running());
    }
}
