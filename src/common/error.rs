// src/common/error.rs

use core::time::Duration;

/// Errors surfaced by the bus primitive, the device protocol client and
/// the acquisition policy built on top of them.
///
/// There is no local recovery anywhere in this crate: every variant
/// propagates unchanged through the cache, the sensor descriptors and
/// the scheduler, so the top-level supervisor sees the original
/// failure and can restart the whole core.
#[derive(Debug, thiserror::Error)]
pub enum Error<E = ()>
where
    E: core::fmt::Debug,
{
    /// Underlying bus transaction failure from the HAL implementation
    /// (NACK, timeout, arbitration loss). Never retried here.
    #[error("bus error: {0:?}")]
    Bus(E),

    /// A response word failed its checksum.
    ///
    /// Only raised when checksum validation is enabled in the device
    /// configuration; the default leaves checksums unverified.
    #[error("checksum mismatch: expected {expected:#04x}, calculated {calculated:#04x}")]
    Checksum { expected: u8, calculated: u8 },

    /// The device never reported data ready within the configured
    /// maximum wait.
    ///
    /// Only raised when a maximum wait is configured; by default the
    /// ready-wait blocks indefinitely.
    #[error("data ready wait timed out after {waited:?}")]
    ReadyTimeout { waited: Duration },
}

// Allow mapping from the underlying HAL error so bus calls can use `?`.
impl<E: core::fmt::Debug> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Error::Bus(e)
    }
}
