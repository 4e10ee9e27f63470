//! Cooperative single-threaded polling of heterogeneous hardware sensors.
//!
//! The crate has three layers, leaf first:
//!
//! - [`common`] defines the bus and clock abstractions ([`I2cBus`],
//!   [`Clock`]) plus the shared error and timing vocabulary. A bus
//!   transaction is a single addressed write or read; failures are never
//!   retried here, they propagate to the caller.
//! - [`scd41`] is the protocol client for the SCD41 CO2/temperature/
//!   humidity device: start/stop measurement commands, the data-ready
//!   handshake, raw sample parsing, and a staleness-aware cache that
//!   serves readings younger than 5 s without touching the bus and
//!   otherwise blocks until the device has a fresh sample.
//! - [`sensor`] and [`scheduler`] pair value sources with identity
//!   metadata and change handlers, and interleave any number of such
//!   descriptors on one thread by always sleeping exactly until the
//!   nearest poll deadline.
//!
//! Everything is synchronous and runs on a single thread of control; a
//! blocking acquisition stalls the whole loop by design. The scheduler's
//! run loop returns an explicit `Result` instead of unwinding, so an
//! external supervisor can match on the error and restart the core.

#![no_std]

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod common;
pub mod scd41;
pub mod scheduler;
pub mod sensor;

// Re-export key types for convenience
pub use common::hal_traits::{Clock, I2cBus, Instant};
pub use common::ticks::Millis;
pub use common::Error;
pub use scd41::Scd41;
pub use scheduler::Scheduler;
pub use sensor::{Sensor, SensorInfo, SensorKind, Status};
