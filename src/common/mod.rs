// src/common/mod.rs

pub mod error;
pub mod hal_traits;
pub mod ticks;
pub mod timing;

// Re-export key types/traits for easier access
pub use error::Error;
pub use hal_traits::{Clock, I2cBus, Instant};
pub use ticks::Millis;

#[cfg(feature = "std")]
pub use ticks::StdClock;

#[cfg(feature = "embedded-hal")]
pub use hal_traits::HalInterface;
