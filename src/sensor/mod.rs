//! Sensor descriptors pairing a value source with identity metadata and
//! change handlers.
//!
//! A descriptor's value source is a named function over a caller-owned
//! context object; there is no ambient global state anywhere, so the
//! same descriptors work against real peripherals or a test context.
//! Handlers fire only on value transitions, synchronously and in
//! registration order. Handler and read errors are deliberately not
//! caught here: a failure propagates out through the scheduler so a
//! misconfigured handler surfaces immediately instead of being retried
//! forever.

use core::time::Duration;

/// Capacity of a formatted status value.
pub const STATUS_CAPACITY: usize = 16;

/// Maximum number of change handlers per sensor.
pub const MAX_CHANGE_HANDLERS: usize = 4;

/// A formatted, comparable sensor status value (for example `"ON"`,
/// `"23.41"` or `"612"`).
pub type Status = heapless::String<STATUS_CAPACITY>;

/// Produces the current status of a sensor from the context object.
/// May block (for example through the SCD41 acquisition policy).
pub type StatusFn<Cx, E> = fn(&mut Cx) -> Result<Status, E>;

/// Invoked with the new value and the sensor's metadata after a value
/// transition.
pub type ChangeHandler<Cx> = fn(&mut Cx, &Status, &SensorInfo);

/// Category of a sensor, as consumed by external publishers.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SensorKind {
    /// A two-state sensor (motion, button).
    Binary,
    /// A numeric measurement (temperature, CO2).
    Measurement,
}

impl SensorKind {
    /// The discovery component name external publishers use for this
    /// category.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Binary => "binary_sensor",
            SensorKind::Measurement => "sensor",
        }
    }
}

/// Identity metadata of a sensor, created once from static
/// configuration.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SensorInfo {
    /// Human-readable name.
    pub name: &'static str,
    /// Unique id, used for topics and discovery payloads.
    pub id: &'static str,
    /// Category tag.
    pub kind: SensorKind,
    /// Optional device class hint for publishers.
    pub device_class: Option<&'static str>,
    /// Optional unit hint for publishers.
    pub unit_of_measurement: Option<&'static str>,
}

/// Returned when registering more handlers than a sensor can hold.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TooManyHandlers;

/// A sensor descriptor: identity, a status-producing function, an
/// ordered list of change handlers, and a poll interval.
///
/// Only the last-known status mutates after construction, and only
/// through [`check_status`](Self::check_status).
pub struct Sensor<Cx, E> {
    info: SensorInfo,
    poll_interval: Duration,
    read: StatusFn<Cx, E>,
    handlers: heapless::Vec<ChangeHandler<Cx>, MAX_CHANGE_HANDLERS>,
    status: Option<Status>,
}

impl<Cx, E> Sensor<Cx, E> {
    /// Creates a descriptor.
    ///
    /// # Panics
    ///
    /// Panics if `poll_interval` is zero; every sensor must have a
    /// positive poll interval.
    pub fn new(info: SensorInfo, poll_interval: Duration, read: StatusFn<Cx, E>) -> Self {
        assert!(
            !poll_interval.is_zero(),
            "sensor poll interval must be positive"
        );
        Sensor {
            info,
            poll_interval,
            read,
            handlers: heapless::Vec::new(),
            status: None,
        }
    }

    /// Registers a change handler. Handlers run in registration order.
    pub fn on_change(&mut self, handler: ChangeHandler<Cx>) -> Result<(), TooManyHandlers> {
        self.handlers.push(handler).map_err(|_| TooManyHandlers)
    }

    pub fn info(&self) -> &SensorInfo {
        &self.info
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// The last observed status, if any poll has completed.
    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    /// Evaluates the status function and, if the value differs from the
    /// stored one, updates it and invokes every handler with the new
    /// value, in registration order, before returning.
    ///
    /// Returns whether a change occurred. The first successful poll
    /// always counts as a change.
    pub fn check_status(&mut self, cx: &mut Cx) -> Result<bool, E> {
        let status = (self.read)(cx)?;
        let changed = self.status.as_ref() != Some(&status);
        if changed {
            log::debug!("sensor {} changed to {}", self.info.id, status);
            self.status = Some(status.clone());
            for handler in &self.handlers {
                handler(cx, &status, &self.info);
            }
        }
        Ok(changed)
    }
}
