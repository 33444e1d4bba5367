use std::time::{Duration, Instant};

use log::warn;

/// Frequency of the delay and sound timers
pub const TIMER_HZ: u32 = 60;

/// Backlog after which the scheduler gives up catching up
const MAX_LAG: Duration = Duration::from_millis(250);

/// Work the host loop has to perform next
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// 60 Hz timer tick
    Tick,
    /// Execute one instruction, scheduled at the given time
    Step(Instant),
}

/// Interleaves instruction steps and timer ticks on a single clock.
///
/// The host asks for everything due at `now` and performs it in order, so the
/// timers and the instruction stream are never driven from two places.
#[derive(Clone, Debug)]
pub struct Scheduler {
    step_interval: Duration,
    tick_interval: Duration,
    next_step: Instant,
    next_tick: Instant,
}

impl Scheduler {
    /// Creates a scheduler running `ips` instructions per second, starting at `start`
    pub fn new(ips: u32, start: Instant) -> Scheduler {
        let tick_interval = Duration::from_nanos(1_000_000_000 / TIMER_HZ as u64);
        Scheduler {
            step_interval: Duration::from_nanos(1_000_000_000 / ips.max(1) as u64),
            tick_interval,
            next_step: start,
            next_tick: start + tick_interval,
        }
    }

    /// Pops the earliest event due at `now`, ticks first on a tie
    pub fn next_due(&mut self, now: Instant) -> Option<Event> {
        if now.saturating_duration_since(self.next_step.min(self.next_tick)) > MAX_LAG {
            warn!("emulation fell behind by more than {:?}, skipping ahead", MAX_LAG);
            self.resync(now);
        }

        if self.next_tick <= now && self.next_tick <= self.next_step {
            self.next_tick += self.tick_interval;
            return Some(Event::Tick);
        }

        if self.next_step <= now {
            let at = self.next_step;
            self.next_step += self.step_interval;
            return Some(Event::Step(at));
        }

        None
    }

    /// Time at which the next event becomes due
    pub fn next_deadline(&self) -> Instant {
        self.next_step.min(self.next_tick)
    }

    /// Drops any backlog, e.g. after the host was paused
    pub fn resync(&mut self, now: Instant) {
        self.next_step = now;
        self.next_tick = now + self.tick_interval;
    }

    pub fn step_interval(&self) -> Duration {
        self.step_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(scheduler: &mut Scheduler, now: Instant) -> Vec<Event> {
        std::iter::from_fn(|| scheduler.next_due(now)).collect()
    }

    #[test]
    fn test_nothing_due_before_start() {
        let start = Instant::now() + Duration::from_secs(1);
        let mut scheduler = Scheduler::new(600, start);
        assert_eq!(scheduler.next_due(start - Duration::from_millis(1)), None);
        assert_eq!(scheduler.next_deadline(), start);
    }

    #[test]
    fn test_steps_and_ticks_interleaved() {
        // Arrange: one step per millisecond
        let start = Instant::now();
        let mut scheduler = Scheduler::new(1000, start);
        let period = scheduler.tick_interval;

        // Act: run one timer period
        let events = drain(&mut scheduler, start + period);

        // Assert: steps at 0..=16 ms, then the tick at 16.67 ms
        let ticks = events.iter().filter(|e| **e == Event::Tick).count();
        assert_eq!(ticks, 1);
        assert_eq!(events.len(), 18);
        assert_eq!(events.last(), Some(&Event::Tick));
        assert_eq!(events[0], Event::Step(start));
    }

    #[test]
    fn test_tick_before_step_on_tie() {
        // Arrange: one step per tick
        let start = Instant::now();
        let mut scheduler = Scheduler::new(TIMER_HZ, start);
        let period = scheduler.tick_interval;

        // Act
        let events = drain(&mut scheduler, start + period);

        // Assert
        assert_eq!(
            events,
            vec![
                Event::Step(start),
                Event::Tick,
                Event::Step(start + period),
            ]
        );
    }

    #[test]
    fn test_steps_carry_their_schedule() {
        let start = Instant::now();
        let mut scheduler = Scheduler::new(100, start);
        let events = drain(&mut scheduler, start + Duration::from_millis(15));
        assert_eq!(
            events,
            vec![
                Event::Step(start),
                Event::Step(start + Duration::from_millis(10)),
            ]
        );
    }

    #[test]
    fn test_lag_is_dropped() {
        // Arrange
        let start = Instant::now();
        let mut scheduler = Scheduler::new(1000, start);

        // Act: host stalled for ten seconds
        let events = drain(&mut scheduler, start + Duration::from_secs(10));

        // Assert: only what is due right after the resync
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::Step(_)));
    }

    #[test]
    fn test_resync() {
        let start = Instant::now();
        let mut scheduler = Scheduler::new(500, start);
        let later = start + Duration::from_millis(100);
        scheduler.resync(later);
        assert_eq!(scheduler.next_deadline(), later);
        assert_eq!(scheduler.step_interval(), Duration::from_millis(2));
    }
}
