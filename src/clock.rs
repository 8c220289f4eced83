use std::time::{Duration, Instant};

/// Rate of the delay and sound timers.
pub const TIMER_HZ: u64 = 60;

/// Most periods a single [`Pacer::due`] call reports. Anything beyond that
/// after a stall is dropped rather than replayed.
pub const MAX_BURST: u32 = 64;

/// Fixed-rate schedule driven by an external clock.
///
/// Each driving loop iteration asks how many periods elapsed and runs its
/// action that many times, which keeps several rates independent while
/// sharing one thread.
pub struct Pacer {
    period: Duration,
    next: Instant,
}

impl Pacer {
    pub fn new(hz: u64, start: Instant) -> Self {
        let period = Duration::from_nanos(1_000_000_000 / hz.max(1));
        Pacer {
            period,
            next: start + period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Instant at which the next period elapses.
    pub fn deadline(&self) -> Instant {
        self.next
    }

    /// Number of periods elapsed up to `now` since the previous call.
    pub fn due(&mut self, now: Instant) -> u32 {
        let mut count = 0;
        while self.next <= now && count < MAX_BURST {
            self.next += self.period;
            count += 1;
        }
        if self.next <= now {
            log::debug!("dropping backlog of {:?}", now - self.next);
            self.next = now + self.period;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_due_before_first_period() {
        let start = Instant::now();
        let mut pacer = Pacer::new(60, start);
        assert_eq!(pacer.due(start), 0);
        assert_eq!(pacer.due(start + Duration::from_millis(10)), 0);
    }

    #[test]
    fn test_counts_elapsed_periods() {
        let start = Instant::now();
        let mut pacer = Pacer::new(100, start);

        assert_eq!(pacer.due(start + Duration::from_millis(10)), 1);
        assert_eq!(pacer.due(start + Duration::from_millis(45)), 3);
        assert_eq!(pacer.due(start + Duration::from_millis(49)), 0);
        assert_eq!(pacer.deadline(), start + Duration::from_millis(50));
    }

    #[test]
    fn test_rates_are_independent() {
        let start = Instant::now();
        let mut instructions = Pacer::new(700, start);
        let mut timers = Pacer::new(TIMER_HZ, start);

        let one_second = start + Duration::from_secs(1);
        let mut steps = 0;
        let mut ticks = 0;
        let mut now = start;
        while now < one_second {
            now += Duration::from_millis(5);
            steps += instructions.due(now);
            ticks += timers.due(now);
        }
        assert_eq!(steps, 700);
        assert_eq!(ticks, 60);
    }

    #[test]
    fn test_long_stall_is_capped() {
        let start = Instant::now();
        let mut pacer = Pacer::new(1000, start);
        let later = start + Duration::from_secs(10);

        assert_eq!(pacer.due(later), MAX_BURST);
        assert_eq!(pacer.deadline(), later + pacer.period());
        assert_eq!(pacer.due(later), 0);
    }

    #[test]
    fn test_zero_rate_is_clamped() {
        let pacer = Pacer::new(0, Instant::now());
        assert_eq!(pacer.period(), Duration::from_secs(1));
    }
}
