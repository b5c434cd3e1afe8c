use std::time::{Duration, Instant};

/// Source of wall-clock time for the pacing loop
pub trait Clock {
    /// Time elapsed since the clock was created
    fn now(&self) -> Duration;

    fn sleep(&self, period: Duration);
}

#[derive(Debug, Clone, Copy)]
pub struct WallClock {
    start: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for WallClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn sleep(&self, period: Duration) {
        std::thread::sleep(period);
    }
}
