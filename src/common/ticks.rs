//! Wraparound-safe millisecond tick instants, plus a std clock for
//! host-side use.

use core::time::Duration;

use super::hal_traits::{Clock, Instant};

/// A millisecond tick count from a free-running 32-bit counter.
///
/// Embedded tick counters wrap; `duration_since` uses wrapping
/// subtraction, so the difference between two instants is correct for
/// any real interval shorter than the counter range (about 49.7 days).
/// This mirrors the tick-difference semantics of typical embedded
/// platforms and is the instant type hardware clock implementations
/// are expected to hand out.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Millis(pub u32);

impl Instant for Millis {
    fn duration_since(&self, earlier: Self) -> Duration {
        Duration::from_millis(u64::from(self.0.wrapping_sub(earlier.0)))
    }
}

#[cfg(feature = "std")]
impl Instant for std::time::Instant {
    fn duration_since(&self, earlier: Self) -> Duration {
        std::time::Instant::duration_since(self, earlier)
    }
}

/// Clock backed by `std::time` and `std::thread::sleep`, for running
/// the scheduler and drivers on a host.
#[cfg(feature = "std")]
#[derive(Debug, Default, Copy, Clone)]
pub struct StdClock;

#[cfg(feature = "std")]
impl Clock for StdClock {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_difference_simple() {
        let earlier = Millis(1_000);
        let later = Millis(6_001);
        assert_eq!(later.duration_since(earlier), Duration::from_millis(5_001));
    }

    #[test]
    fn millis_difference_zero() {
        let t = Millis(42);
        assert_eq!(t.duration_since(t), Duration::ZERO);
    }

    #[test]
    fn millis_difference_across_wraparound() {
        // 100 ms before the counter wraps, to 200 ms after it wraps.
        let earlier = Millis(u32::MAX - 99);
        let later = Millis(200);
        assert_eq!(later.duration_since(earlier), Duration::from_millis(300));
    }
}
