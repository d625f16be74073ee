#![forbid(unsafe_code)]

//! Render timing and rate limiting.

use web_time::{Duration, Instant};

/// Wall-clock timer around a single render or patch.
#[derive(Debug, Clone, Copy)]
pub struct RenderTimer {
    started: Instant,
}

impl RenderTimer {
    #[must_use]
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Stop the timer, warning when `budget` was exceeded.
    ///
    /// Returns the elapsed time in microseconds.
    pub fn finish(self, component: &str, budget: Duration) -> u64 {
        let elapsed = self.elapsed();
        let elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        if elapsed > budget {
            tracing::warn!(
                message = "component.slow_render",
                component,
                elapsed_us,
                budget_us = u64::try_from(budget.as_micros()).unwrap_or(u64::MAX)
            );
        }
        elapsed_us
    }
}

/// Admits at most one call per interval.
///
/// The first call is always admitted.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Admit a call at `now` if the interval has passed since the last one.
    pub fn ready_at(&mut self, now: Instant) -> bool {
        let admit = self
            .last
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval);
        if admit {
            self.last = Some(now);
        }
        admit
    }

    pub fn ready(&mut self) -> bool {
        self.ready_at(Instant::now())
    }

    /// Forget the last admitted call.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn throttle_admits_once_per_interval() {
        let mut throttle = Throttle::new(Duration::from_millis(100));
        let t0 = Instant::now();
        assert!(throttle.ready_at(t0));
        assert!(!throttle.ready_at(t0 + Duration::from_millis(50)));
        assert!(throttle.ready_at(t0 + Duration::from_millis(100)));
        assert!(!throttle.ready_at(t0 + Duration::from_millis(150)));
        assert!(throttle.ready_at(t0 + Duration::from_millis(250)));
    }

    #[test]
    fn reset_readmits() {
        let mut throttle = Throttle::new(Duration::from_secs(60));
        assert!(throttle.ready());
        assert!(!throttle.ready());
        throttle.reset();
        assert!(throttle.ready());
    }

    #[test]
    fn zero_interval_always_admits() {
        let mut throttle = Throttle::new(Duration::ZERO);
        let t0 = Instant::now();
        assert!(throttle.ready_at(t0));
        assert!(throttle.ready_at(t0));
    }

    #[test]
    #[traced_test]
    fn over_budget_render_warns() {
        let timer = RenderTimer::start();
        std::thread::sleep(std::time::Duration::from_millis(2));
        timer.finish("tabs", Duration::from_micros(1));
        assert!(logs_contain("component.slow_render"));
        assert!(logs_contain("tabs"));
    }

    #[test]
    #[traced_test]
    fn within_budget_is_silent() {
        RenderTimer::start().finish("badge", Duration::from_secs(3600));
        assert!(!logs_contain("component.slow_render"));
    }
}
