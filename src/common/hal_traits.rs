//! Hardware abstraction traits for the shared two-wire bus and the
//! monotonic clock that drives every timing decision in this crate.

use core::fmt::Debug;
use core::time::Duration;

/// A single addressed transaction on the shared two-wire bus.
///
/// This is deliberately thin: one write or one read, no caching, no
/// retries. A NACK, timeout or arbitration loss surfaces as
/// `Self::Error` and propagates immediately; retry policy belongs to
/// the caller, not the primitive. The bus may carry several devices at
/// different addresses; with a single thread of control no locking is
/// needed, but a multi-threaded caller must wrap implementations of
/// this trait in a mutex.
pub trait I2cBus {
    /// Associated error type for bus transaction failures.
    type Error: Debug;

    /// Writes `bytes` to the device at `address`.
    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Reads exactly `buffer.len()` bytes from the device at `address`.
    fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Self::Error>;
}

/// A point on a monotonic timeline.
///
/// Differences must be wraparound-safe: for a fixed-width tick counter,
/// `duration_since` has to yield the true elapsed time for any interval
/// shorter than the counter's full range, never a negative or oversized
/// value. See [`crate::common::ticks::Millis`] for the reference
/// implementation.
pub trait Instant: Copy + Debug {
    /// Elapsed time from `earlier` to `self`.
    ///
    /// `earlier` must not be later than `self` on the underlying
    /// monotonic timeline.
    fn duration_since(&self, earlier: Self) -> Duration;
}

/// Abstraction for the monotonic clock and blocking delays.
///
/// Everything in this crate that waits, sleeps through this trait, so a
/// simulated clock can drive the full protocol and scheduler logic in
/// tests without real time passing.
pub trait Clock {
    /// The instant type produced by this clock.
    type Instant: Instant;

    /// Returns the current instant.
    fn now(&self) -> Self::Instant;

    /// Blocks for at least the specified number of milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

/// Bundles an `embedded-hal` I2C bus with a [`Clock`] into a single
/// driver interface.
///
/// The SCD41 driver is generic over one interface value implementing
/// both [`I2cBus`] and [`Clock`]; this adapter builds such a value from
/// any `embedded_hal::i2c::I2c` peripheral plus a clock source.
#[cfg(feature = "embedded-hal")]
pub struct HalInterface<T, C> {
    /// The underlying I2C peripheral.
    pub i2c: T,
    /// The clock source.
    pub clock: C,
}

#[cfg(feature = "embedded-hal")]
impl<T, C> HalInterface<T, C> {
    pub fn new(i2c: T, clock: C) -> Self {
        HalInterface { i2c, clock }
    }
}

#[cfg(feature = "embedded-hal")]
impl<T, C> I2cBus for HalInterface<T, C>
where
    T: embedded_hal::i2c::I2c,
{
    type Error = T::Error;

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        self.i2c.write(address, bytes)
    }

    fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c.read(address, buffer)
    }
}

#[cfg(feature = "embedded-hal")]
impl<T, C> Clock for HalInterface<T, C>
where
    C: Clock,
{
    type Instant = C::Instant;

    fn now(&self) -> Self::Instant {
        self.clock.now()
    }

    fn delay_ms(&mut self, ms: u32) {
        self.clock.delay_ms(ms);
    }
}
