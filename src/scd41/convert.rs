//! Conversions from raw 16-bit sensor words to physical units.
//!
//! Pure functions of the raw values; the linear mappings come from the
//! SCD4x datasheet and must be reproduced exactly.

/// Temperature in degrees centigrade for a raw temperature word.
#[inline]
pub fn temperature_celsius(raw: u16) -> f32 {
    175.0 * (raw as f32 / 65536.0) - 45.0
}

/// Relative humidity in percent for a raw humidity word.
#[inline]
pub fn relative_humidity_percent(raw: u16) -> f32 {
    100.0 * (raw as f32 / 65536.0)
}

/// CO2 concentration in ppm; the raw word is the concentration.
#[inline]
pub fn co2_ppm(raw: u16) -> u16 {
    raw
}
