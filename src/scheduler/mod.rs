//! Cooperative scheduler servicing a fixed set of sensors on one
//! thread.
//!
//! Each tick reads the clock once, polls every sensor whose interval
//! has elapsed (in registration order), and reports the minimum time
//! until any sensor is next due. The run loop sleeps exactly that long,
//! so no sensor is ever polled early and the loop never sleeps past the
//! most urgent deadline. A sensor whose status function blocks (the
//! SCD41 stale-cache fallback, for instance) stalls every other
//! sensor's polling for the duration; with a small fixed sensor count
//! that is an accepted trade-off, not a defect.
//!
//! There is no cancellation. The loop ends only when a status function
//! or change handler returns an error, which [`Scheduler::run`] hands
//! back to the caller; the surrounding supervisor is expected to treat
//! it as fatal and restart the whole core with fresh state.

use core::convert::Infallible;
use core::time::Duration;

use crate::common::hal_traits::{Clock, Instant};
use crate::sensor::Sensor;

struct Entry<Cx, E, I> {
    sensor: Sensor<Cx, E>,
    last_polled: I,
}

/// Schedules up to `N` sensors against the given clock.
pub struct Scheduler<Cx, CLK, E, const N: usize>
where
    CLK: Clock,
{
    clock: CLK,
    entries: heapless::Vec<Entry<Cx, E, CLK::Instant>, N>,
}

impl<Cx, CLK, E, const N: usize> Scheduler<Cx, CLK, E, N>
where
    CLK: Clock,
{
    pub fn new(clock: CLK) -> Self {
        Scheduler {
            clock,
            entries: heapless::Vec::new(),
        }
    }

    /// Registers a sensor. Sensors are serviced in registration order.
    /// The sensor counts as polled now, so its first scheduled poll is
    /// one interval away (the run loop's startup pass polls it sooner).
    ///
    /// Returns the sensor back when the scheduler is full.
    pub fn add(&mut self, sensor: Sensor<Cx, E>) -> Result<(), Sensor<Cx, E>> {
        let last_polled = self.clock.now();
        self.entries
            .push(Entry {
                sensor,
                last_polled,
            })
            .map_err(|entry| entry.sensor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One scheduler pass.
    ///
    /// Reads the clock once, polls every sensor that is due, and
    /// returns the minimum time until any sensor is next due
    /// (`Duration::MAX` when no sensors are registered). The first
    /// error from a status function or handler aborts the pass.
    pub fn tick(&mut self, cx: &mut Cx) -> Result<Duration, E> {
        let now = self.clock.now();
        let mut next_due = Duration::MAX;

        for entry in self.entries.iter_mut() {
            let interval = entry.sensor.poll_interval();
            let elapsed = now.duration_since(entry.last_polled);
            let time_to_poll = if elapsed >= interval {
                entry.sensor.check_status(cx)?;
                entry.last_polled = now;
                interval
            } else {
                interval - elapsed
            };
            next_due = next_due.min(time_to_poll);
        }

        Ok(next_due)
    }

    /// Runs the scheduler until an error propagates out of a poll.
    ///
    /// Every sensor is polled once up front (so handlers see an initial
    /// value before steady-state change detection begins), then the
    /// loop alternates [`tick`](Self::tick) with a sleep for exactly
    /// the reported time to the next deadline.
    ///
    /// Never returns on success; the error branch is the supervisor's
    /// restart signal.
    pub fn run(&mut self, cx: &mut Cx) -> Result<Infallible, E> {
        log::info!("polling {} sensors", self.entries.len());
        for entry in self.entries.iter_mut() {
            entry.sensor.check_status(cx)?;
            entry.last_polled = self.clock.now();
        }

        loop {
            let next_due = self.tick(cx)?;
            if !next_due.is_zero() {
                let ms = u32::try_from(next_due.as_millis()).unwrap_or(u32::MAX);
                self.clock.delay_ms(ms);
            }
        }
    }
}
