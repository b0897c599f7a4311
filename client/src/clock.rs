use std::time::Instant;

/// Milliseconds on the client-local monotonic clock.
pub type Timestamp = f64;

/// Monotonic millisecond clock shared by the network and render threads.
///
/// Copies share the same epoch, so a timestamp taken when a frame arrives on
/// the network thread is directly comparable with `now()` on the render thread.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    pub fn now(&self) -> Timestamp {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_is_monotonic() {
        let clock = SystemClock::new();
        let t1 = clock.now();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let t2 = clock.now();
        assert!(t1 >= 0.0);
        assert!(t2 > t1);
    }

    #[test]
    fn test_copies_share_epoch() {
        let clock = SystemClock::new();
        let copy = clock;
        std::thread::sleep(std::time::Duration::from_millis(1));
        let (a, b) = (clock.now(), copy.now());
        assert!((a - b).abs() < 50.0);
    }
}
