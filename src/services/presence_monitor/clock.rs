use std::time::{Duration, Instant};

/// Source of time for the monitor loop; tests swap in a manual clock
pub trait Clock: Send + Sync {
    fn sleep(&self, duration: Duration);
    /// Monotonic time since the clock was created
    fn elapsed(&self) -> Duration;
}

pub struct SystemClock {
    started: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Simulated clock: `sleep` advances virtual time, records the pause and
/// blocks only for `real_pause`
#[cfg(test)]
#[derive(Default)]
pub struct ManualClock {
    now: parking_lot::Mutex<Duration>,
    sleeps: parking_lot::Mutex<Vec<Duration>>,
    real_pause: Duration,
}

#[cfg(test)]
impl ManualClock {
    /// Для тестов с настоящим потоком: цикл не должен крутиться вхолостую
    pub fn with_real_pause(real_pause: Duration) -> Self {
        Self {
            real_pause,
            ..Self::default()
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn sleep(&self, duration: Duration) {
        *self.now.lock() += duration;
        self.sleeps.lock().push(duration);
        if !self.real_pause.is_zero() {
            std::thread::sleep(self.real_pause);
        }
    }

    fn elapsed(&self) -> Duration {
        *self.now.lock()
    }
}
