use std::time::{Duration, Instant};

/// Timer accumulating the time spent inside the search.
///
/// The search is driven step by step by the caller, so only the intervals between
/// `start` and `stop` are counted.
#[derive(Clone, Debug, Default)]
pub struct Timer {
    start: Option<Instant>,
    elapsed_time: Duration,
    time_limit: Option<Duration>,
}

impl Timer {
    /// Returns a stopped timer with the given time limit in seconds.
    pub fn with_time_limit(time_limit: f64) -> Self {
        Self {
            start: None,
            elapsed_time: Duration::ZERO,
            time_limit: Some(Duration::from_secs_f64(time_limit.max(0.0))),
        }
    }

    /// Starts the timer. Does nothing if it is already running.
    pub fn start(&mut self) {
        if self.start.is_none() {
            self.start = Some(Instant::now());
        }
    }

    /// Stops the timer and accumulates the elapsed interval.
    pub fn stop(&mut self) {
        if let Some(start) = self.start.take() {
            self.elapsed_time += start.elapsed();
        }
    }

    fn elapsed(&self) -> Duration {
        self.elapsed_time + self.start.map_or(Duration::ZERO, |start| start.elapsed())
    }

    /// Returns the elapsed time in seconds.
    pub fn get_elapsed_time(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    /// Returns the remaining time in seconds.
    pub fn get_remaining_time_limit(&self) -> Option<f64> {
        let elapsed_time = self.elapsed();

        self.time_limit
            .map(|time_limit| time_limit.saturating_sub(elapsed_time).as_secs_f64())
    }

    /// Returns whether the time limit is reached.
    pub fn check_time_limit(&self) -> bool {
        self.get_remaining_time_limit()
            .is_some_and(|remaining| remaining <= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_no_limit() {
        let mut timer = Timer::default();
        timer.start();
        assert_eq!(timer.get_remaining_time_limit(), None);
        assert!(!timer.check_time_limit());
        timer.stop();
    }

    #[test]
    fn test_stopped_timer_does_not_accumulate() {
        let mut timer = Timer::default();
        timer.start();
        timer.stop();
        let elapsed = timer.get_elapsed_time();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(timer.get_elapsed_time(), elapsed);
    }

    #[test]
    fn test_zero_time_limit() {
        let timer = Timer::with_time_limit(0.0);
        assert_eq!(timer.get_remaining_time_limit(), Some(0.0));
        assert!(timer.check_time_limit());
    }

    #[test]
    fn test_time_limit_not_reached() {
        let mut timer = Timer::with_time_limit(3600.0);
        timer.start();
        assert!(!timer.check_time_limit());
        assert!(timer.get_remaining_time_limit().is_some_and(|r| r > 0.0));
    }
}
