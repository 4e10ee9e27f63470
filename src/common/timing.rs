// src/common/timing.rs

use core::time::Duration;

// Nominal values from the SCD4x datasheet (power-up and command timing)
// plus the acquisition policy constants shared by every cache decision.
// These are contractual: tests assert against them, and changing one
// changes externally observable behavior.

// === Device power and command timing ===

/// Mandatory delay after power-on before the device may receive its
/// first command. Enforced exactly once, at the start of the first
/// `initiate` call on a freshly constructed session.
pub const POWER_ON_GUARD: Duration = Duration::from_millis(1000);

/// Delay between the stop command and the following start command
/// during `initiate` (the stop doubles as an idempotent soft reset and
/// needs this long to settle).
pub const STOP_TO_START_DELAY: Duration = Duration::from_millis(500);

/// Delay between issuing a read-type command and reading its response.
pub const COMMAND_RESPONSE_DELAY: Duration = Duration::from_millis(1);

// === Acquisition policy ===

/// Age under which a previously read sample is served from cache
/// without any bus traffic.
pub const STALENESS_WINDOW: Duration = Duration::from_millis(5000);

/// Polling granularity of the blocking fallback: when no fresh sample
/// exists and the cache is stale, the data-ready status is re-read at
/// this interval.
pub const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Device-internal sampling period in periodic measurement mode. Not
/// enforced anywhere; documents the steady-state freshness bound of
/// `STALENESS_WINDOW` plus one `READY_POLL_INTERVAL`.
pub const MEASUREMENT_PERIOD: Duration = Duration::from_millis(5000);
