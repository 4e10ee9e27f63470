//! Protocol client for the SCD41 CO2, temperature and humidity sensor.
//!
//! The driver owns one interface value implementing both [`I2cBus`] and
//! [`Clock`] and speaks the device's 2-byte command protocol: stop and
//! start periodic measurement, the data-ready handshake, and the 9-byte
//! measurement read. On top of that sits the acquisition policy: any
//! value request serves a fresh sample when the device has one, falls
//! back to a cached sample younger than the staleness window, and
//! otherwise blocks on the data-ready status until the device delivers.
//!
//! The device needs 1000 ms after power-on before it accepts commands.
//! Construction is assumed to coincide with power-on; the first
//! `initiate` waits out the remainder of that guard, so the very first
//! value request can take up to roughly 6.5 s (power-on guard, the
//! 500 ms stop-to-start settle, then one device measurement period,
//! [`timing::MEASUREMENT_PERIOD`]).
//!
//! Requesting `co2`, `temperature` or `relative_humidity` starts the
//! measurement cycle implicitly; `stop` ends it. In steady state a
//! returned reading is never older than the staleness window plus one
//! ready-poll interval, because the device produces a sample every
//! [`timing::MEASUREMENT_PERIOD`] while measuring.

pub mod command;
pub mod convert;
pub mod crc;

use core::time::Duration;

use crate::common::{
    error::Error,
    hal_traits::{Clock, I2cBus, Instant},
    timing,
};

use command::{Command, DATA_READY_MASK, DEFAULT_ADDRESS, MEASUREMENT_LEN, READY_STATUS_LEN};

/// Static configuration of a device session.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Config {
    /// Bus address of the device.
    pub address: u8,
    /// Verify the checksum byte of every response group. The device
    /// protocol works without verification and the default leaves it
    /// off; turn it on to get [`Error::Checksum`] on corrupt frames.
    pub validate_crc: bool,
    /// Upper bound on the blocking data-ready wait. `None` (the
    /// default) blocks indefinitely until the hardware responds or a
    /// bus error propagates.
    pub max_ready_wait: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            address: DEFAULT_ADDRESS,
            validate_crc: false,
            max_ready_wait: None,
        }
    }
}

/// The most recent raw readings, one 16-bit word per channel.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct RawSample {
    pub co2: u16,
    pub temperature: u16,
    pub humidity: u16,
}

/// An SCD41 device session over a combined bus-and-clock interface.
///
/// Exactly one thread may use a session; all waiting is blocking and
/// all state lives in this struct.
#[derive(Debug)]
pub struct Scd41<IF>
where
    IF: I2cBus + Clock,
{
    interface: IF,
    config: Config,
    powered_on_at: <IF as Clock>::Instant,
    measuring: bool,
    readings: RawSample,
    last_read_at: Option<<IF as Clock>::Instant>,
}

impl<IF> Scd41<IF>
where
    IF: I2cBus + Clock,
{
    /// Creates a session with the default configuration.
    ///
    /// The device is assumed to have powered on at the moment of this
    /// call; the power-on guard is measured from here.
    pub fn new(interface: IF) -> Self {
        Self::with_config(interface, Config::default())
    }

    /// Creates a session with an explicit configuration.
    pub fn with_config(interface: IF, config: Config) -> Self {
        let powered_on_at = interface.now();
        Scd41 {
            interface,
            config,
            powered_on_at,
            measuring: false,
            readings: RawSample::default(),
            last_read_at: None,
        }
    }

    /// Whether a measurement cycle has been started and not stopped.
    pub fn is_measuring(&self) -> bool {
        self.measuring
    }

    /// The raw words of the last successful read. All zero until the
    /// first read completes.
    pub fn raw_sample(&self) -> RawSample {
        self.readings
    }

    // --- Measurement cycle ---

    /// Starts the device's periodic measurement cycle.
    ///
    /// On the first call since construction this blocks until the
    /// power-on guard has elapsed, then issues a stop command as an
    /// idempotent soft reset (the device may still be measuring from a
    /// previous run), waits the stop-to-start settle time, and starts
    /// periodic measurement. A no-op once the session is measuring.
    pub fn initiate(&mut self) -> Result<(), Error<IF::Error>> {
        if self.measuring {
            return Ok(());
        }

        let since_power_on = self.interface.now().duration_since(self.powered_on_at);
        if since_power_on < timing::POWER_ON_GUARD {
            let remaining = timing::POWER_ON_GUARD - since_power_on;
            self.delay(remaining + Duration::from_millis(1));
        }

        log::debug!("starting periodic measurement");
        self.command(Command::StopPeriodicMeasurement)?;
        self.delay(timing::STOP_TO_START_DELAY);
        self.command(Command::StartPeriodicMeasurement)?;
        self.measuring = true;
        Ok(())
    }

    /// Stops the periodic measurement cycle. Safe to call at any time;
    /// cached readings are unaffected.
    pub fn stop(&mut self) -> Result<(), Error<IF::Error>> {
        log::debug!("stopping periodic measurement");
        self.command(Command::StopPeriodicMeasurement)?;
        self.measuring = false;
        Ok(())
    }

    /// Asks the device whether a new sample is ready.
    ///
    /// The device reports "not ready" by zeroing the low 11 bits of the
    /// status word.
    pub fn data_ready(&mut self) -> Result<bool, Error<IF::Error>> {
        let mut response = [0u8; READY_STATUS_LEN];
        self.transceive(Command::GetDataReadyStatus, &mut response)?;
        let status = u16::from_be_bytes([response[0], response[1]]);
        Ok(status & DATA_READY_MASK != 0)
    }

    /// Reads the current sample and stores the raw words and read time
    /// in the session.
    ///
    /// Reading clears the device's internal buffer, so call this only
    /// after [`data_ready`](Self::data_ready) has returned true;
    /// otherwise the frame may be stale or garbage.
    pub fn read_sample(&mut self) -> Result<(), Error<IF::Error>> {
        let mut response = [0u8; MEASUREMENT_LEN];
        self.transceive(Command::ReadMeasurement, &mut response)?;
        self.readings = RawSample {
            co2: u16::from_be_bytes([response[0], response[1]]),
            temperature: u16::from_be_bytes([response[3], response[4]]),
            humidity: u16::from_be_bytes([response[6], response[7]]),
        };
        self.last_read_at = Some(self.interface.now());
        Ok(())
    }

    // --- Converted value requests (acquisition policy applies) ---

    /// CO2 concentration in ppm.
    pub fn co2(&mut self) -> Result<u16, Error<IF::Error>> {
        self.poll_reading()?;
        Ok(convert::co2_ppm(self.readings.co2))
    }

    /// Temperature in degrees centigrade.
    pub fn temperature(&mut self) -> Result<f32, Error<IF::Error>> {
        self.poll_reading()?;
        Ok(convert::temperature_celsius(self.readings.temperature))
    }

    /// Relative humidity in percent.
    pub fn relative_humidity(&mut self) -> Result<f32, Error<IF::Error>> {
        self.poll_reading()?;
        Ok(convert::relative_humidity_percent(self.readings.humidity))
    }

    /// Brings the cached readings up to date.
    ///
    /// Starts the measurement cycle if needed, then in order of
    /// preference: reads a fresh sample if the device has one; keeps
    /// the cached sample if it is younger than the staleness window;
    /// otherwise blocks, re-checking data-ready at the ready-poll
    /// interval, until a sample arrives or the configured maximum wait
    /// elapses.
    fn poll_reading(&mut self) -> Result<(), Error<IF::Error>> {
        if !self.measuring {
            self.initiate()?;
        }

        if self.data_ready()? {
            return self.read_sample();
        }

        if let Some(read_at) = self.last_read_at {
            let age = self.interface.now().duration_since(read_at);
            if age < timing::STALENESS_WINDOW {
                return Ok(());
            }
        }

        log::warn!("no fresh sample and cache is stale; blocking until data ready");
        let wait_started = self.interface.now();
        while !self.data_ready()? {
            if let Some(max_wait) = self.config.max_ready_wait {
                let waited = self.interface.now().duration_since(wait_started);
                if waited >= max_wait {
                    return Err(Error::ReadyTimeout { waited });
                }
            }
            self.delay(timing::READY_POLL_INTERVAL);
        }
        self.read_sample()
    }

    // --- Low-level helpers ---

    /// Writes a command opcode to the device.
    fn command(&mut self, command: Command) -> Result<(), Error<IF::Error>> {
        self.interface.write(self.config.address, &command.opcode())?;
        Ok(())
    }

    /// Writes a read-type command, observes the command-response delay,
    /// and reads the fixed-length response. Checksum groups are
    /// verified only when the session is configured to do so.
    fn transceive(
        &mut self,
        command: Command,
        response: &mut [u8],
    ) -> Result<(), Error<IF::Error>> {
        debug_assert_eq!(command.response_len(), Some(response.len()));
        self.interface.write(self.config.address, &command.opcode())?;
        self.delay(timing::COMMAND_RESPONSE_DELAY);
        self.interface.read(self.config.address, response)?;

        if self.config.validate_crc {
            for group in response.chunks_exact(3) {
                crc::verify_group(group)?;
            }
        }
        Ok(())
    }

    fn delay(&mut self, duration: Duration) {
        self.interface.delay_ms(duration.as_millis() as u32);
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ticks::Millis;
    use crate::scd41::crc::word_crc;

    type Frame = heapless::Vec<u8, 9>;

    // --- Mock bus error ---
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    enum MockBusError {
        Nack,
        NoFrameStaged,
    }

    // --- Mock Interface ---
    // Staged-frame mock: reads pop pre-loaded response frames in order;
    // writes are logged with the mock time at which they happened.
    // Delays advance the simulated clock.
    struct MockInterface {
        time_ms: u64,
        write_log: heapless::Vec<(u64, [u8; 2]), 32>,
        frames: heapless::Vec<Frame, 16>,
        frame_pos: usize,
        fail_writes: bool,
    }

    impl MockInterface {
        fn new() -> Self {
            MockInterface {
                time_ms: 0,
                write_log: heapless::Vec::new(),
                frames: heapless::Vec::new(),
                frame_pos: 0,
                fail_writes: false,
            }
        }

        fn advance(&mut self, ms: u64) {
            self.time_ms += ms;
        }

        fn stage_frame(&mut self, bytes: &[u8]) {
            let frame = Frame::from_slice(bytes).unwrap();
            self.frames.push(frame).unwrap();
        }

        fn stage_ready_status(&mut self, word: u16) {
            let [hi, lo] = word.to_be_bytes();
            self.stage_frame(&[hi, lo, word_crc([hi, lo])]);
        }

        fn stage_measurement(&mut self, co2: u16, temperature: u16, humidity: u16) {
            let mut frame = [0u8; 9];
            for (chunk, word) in frame
                .chunks_exact_mut(3)
                .zip([co2, temperature, humidity])
            {
                let [hi, lo] = word.to_be_bytes();
                chunk[0] = hi;
                chunk[1] = lo;
                chunk[2] = word_crc([hi, lo]);
            }
            self.stage_frame(&frame);
        }

        fn frames_consumed(&self) -> usize {
            self.frame_pos
        }

        fn opcodes(&self) -> impl Iterator<Item = [u8; 2]> + '_ {
            self.write_log.iter().map(|(_, op)| *op)
        }
    }

    impl I2cBus for MockInterface {
        type Error = MockBusError;

        fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
            assert_eq!(address, DEFAULT_ADDRESS);
            if self.fail_writes {
                return Err(MockBusError::Nack);
            }
            let mut opcode = [0u8; 2];
            opcode.copy_from_slice(bytes);
            self.write_log.push((self.time_ms, opcode)).unwrap();
            Ok(())
        }

        fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
            assert_eq!(address, DEFAULT_ADDRESS);
            let frame = self
                .frames
                .get(self.frame_pos)
                .ok_or(MockBusError::NoFrameStaged)?;
            assert_eq!(buffer.len(), frame.len());
            buffer.copy_from_slice(frame);
            self.frame_pos += 1;
            Ok(())
        }
    }

    impl Clock for MockInterface {
        type Instant = Millis;

        fn now(&self) -> Millis {
            Millis(self.time_ms as u32)
        }

        fn delay_ms(&mut self, ms: u32) {
            self.advance(u64::from(ms));
        }
    }

    const STOP: [u8; 2] = [0x3F, 0x86];
    const START: [u8; 2] = [0x21, 0xB1];
    const READY: [u8; 2] = [0xE4, 0xB8];
    const READ: [u8; 2] = [0xEC, 0x05];

    /// Runs a full first acquisition so the session is measuring and
    /// holds a sample read at the returned mock time.
    fn session_with_fresh_sample(co2: u16) -> (Scd41<MockInterface>, u64) {
        let mut mock = MockInterface::new();
        mock.stage_ready_status(0x0001);
        mock.stage_measurement(co2, 32768, 32768);
        let mut scd = Scd41::new(mock);
        scd.co2().unwrap();
        let read_at = scd.interface.time_ms;
        (scd, read_at)
    }

    #[test]
    fn initiate_waits_out_power_on_guard() {
        let mock = MockInterface::new();
        let mut scd = Scd41::new(mock);

        scd.initiate().unwrap();

        // No command before construction + 1000 ms; stop precedes start
        // by the settle delay.
        let log = &scd.interface.write_log;
        assert_eq!(log.len(), 2);
        let (stop_at, stop_op) = log[0];
        let (start_at, start_op) = log[1];
        assert_eq!(stop_op, STOP);
        assert_eq!(start_op, START);
        assert!(stop_at >= 1000);
        assert!(start_at >= stop_at + 500);
        assert!(scd.is_measuring());
    }

    #[test]
    fn initiate_skips_guard_when_already_elapsed() {
        let mut mock = MockInterface::new();
        mock.advance(1500);
        let mut scd = Scd41::new(mock);
        scd.interface.advance(1200);

        scd.initiate().unwrap();

        // Guard is measured from construction, already satisfied here.
        let (stop_at, _) = scd.interface.write_log[0];
        assert_eq!(stop_at, 2700);
    }

    #[test]
    fn initiate_is_idempotent_while_measuring() {
        let mock = MockInterface::new();
        let mut scd = Scd41::new(mock);
        scd.initiate().unwrap();
        let writes = scd.interface.write_log.len();

        scd.initiate().unwrap();
        assert_eq!(scd.interface.write_log.len(), writes);
    }

    #[test]
    fn first_value_request_runs_full_cycle() {
        let mut mock = MockInterface::new();
        mock.stage_ready_status(0x0001);
        mock.stage_measurement(600, 32768, 16384);
        // The temperature and humidity requests each re-check readiness
        // and are then served from the fresh cache.
        mock.stage_ready_status(0x0000);
        mock.stage_ready_status(0x0000);
        let mut scd = Scd41::new(mock);

        assert_eq!(scd.co2().unwrap(), 600);
        assert_eq!(scd.temperature().unwrap(), 42.5);
        assert_eq!(scd.relative_humidity().unwrap(), 25.0);

        let opcodes: heapless::Vec<[u8; 2], 8> = scd.interface.opcodes().collect();
        assert_eq!(&opcodes[..4], &[STOP, START, READY, READ]);
        assert_eq!(
            scd.raw_sample(),
            RawSample {
                co2: 600,
                temperature: 32768,
                humidity: 16384
            }
        );
    }

    #[test]
    fn cached_value_served_within_staleness_window() {
        let (mut scd, _) = session_with_fresh_sample(700);
        scd.interface.advance(3000);
        scd.interface.stage_ready_status(0x0000);

        let frames_before = scd.interface.frames_consumed();
        assert_eq!(scd.co2().unwrap(), 700);

        // One status round trip, no measurement read.
        assert_eq!(scd.interface.frames_consumed(), frames_before + 1);
        assert_eq!(scd.interface.opcodes().last().unwrap(), READY);
    }

    #[test]
    fn cached_value_served_just_under_window() {
        let (mut scd, _) = session_with_fresh_sample(700);
        let raw_before = scd.raw_sample();
        // The status round trip itself takes the 1 ms response delay,
        // so the cache-age decision lands at 4999 ms, one inside the
        // window.
        scd.interface.advance(4998);
        scd.interface.stage_ready_status(0x0000);

        assert_eq!(scd.co2().unwrap(), 700);
        assert_eq!(scd.raw_sample(), raw_before);
    }

    #[test]
    fn cache_at_exact_window_age_counts_as_stale() {
        let (mut scd, _) = session_with_fresh_sample(700);
        // With the 1 ms response delay of the status round trip, the
        // cache-age decision lands at exactly 5000 ms. Exactly
        // window-old is stale, so the blocking path runs instead of
        // serving the cache.
        scd.interface.advance(4999);
        scd.interface.stage_ready_status(0x0000);
        scd.interface.stage_ready_status(0x0001);
        scd.interface.stage_measurement(810, 5, 6);

        let frames_before = scd.interface.frames_consumed();
        assert_eq!(scd.co2().unwrap(), 810);

        // Two status reads (not ready, then ready) plus the measurement.
        assert_eq!(scd.interface.frames_consumed(), frames_before + 3);
        assert_eq!(scd.raw_sample().co2, 810);
    }

    #[test]
    fn fresh_sample_preferred_over_cache() {
        let (mut scd, _) = session_with_fresh_sample(700);
        scd.interface.advance(1000);
        scd.interface.stage_ready_status(0x0001);
        scd.interface.stage_measurement(850, 1, 2);

        // Cache is well within the window but the device has a newer
        // sample; the fresh read wins.
        assert_eq!(scd.co2().unwrap(), 850);
    }

    #[test]
    fn stale_cache_blocks_until_ready() {
        let (mut scd, read_at) = session_with_fresh_sample(700);
        scd.interface.advance(6000);
        scd.interface.stage_ready_status(0x0000);
        scd.interface.stage_ready_status(0x0000);
        scd.interface.stage_ready_status(0x0001);
        scd.interface.stage_measurement(900, 3, 4);

        let frames_before = scd.interface.frames_consumed();
        assert_eq!(scd.co2().unwrap(), 900);

        // Exactly three status reads, then one measurement read.
        assert_eq!(scd.interface.frames_consumed(), frames_before + 4);
        // One ready-poll sleep happened between the second and third
        // status check.
        assert!(scd.interface.time_ms >= read_at + 6000 + 100);
    }

    #[test]
    fn ready_wait_times_out_when_configured() {
        let mut mock = MockInterface::new();
        for _ in 0..8 {
            mock.stage_ready_status(0x0000);
        }
        let mut scd = Scd41::with_config(
            mock,
            Config {
                max_ready_wait: Some(Duration::from_millis(300)),
                ..Config::default()
            },
        );

        let result = scd.co2();
        assert!(matches!(result, Err(Error::ReadyTimeout { .. })));
    }

    #[test]
    fn data_ready_ignores_high_status_bits() {
        let (mut scd, _) = session_with_fresh_sample(700);
        // Low 11 bits all zero means not ready regardless of the rest.
        scd.interface.stage_ready_status(0x8000);
        assert!(!scd.data_ready().unwrap());
        scd.interface.stage_ready_status(0x0001);
        assert!(scd.data_ready().unwrap());
    }

    #[test]
    fn checksums_ignored_by_default() {
        let mut mock = MockInterface::new();
        mock.stage_frame(&[0x00, 0x01, 0xAB]); // bad crc on purpose
        let mut scd = Scd41::new(mock);
        scd.measuring = true;

        assert!(scd.data_ready().unwrap());
    }

    #[test]
    fn checksum_validation_rejects_corrupt_frames() {
        let mut mock = MockInterface::new();
        mock.stage_frame(&[0x00, 0x01, 0xAB]);
        let mut scd = Scd41::with_config(
            mock,
            Config {
                validate_crc: true,
                ..Config::default()
            },
        );
        scd.measuring = true;

        let result = scd.data_ready();
        assert!(matches!(result, Err(Error::Checksum { .. })));
    }

    #[test]
    fn stop_clears_measuring_and_keeps_cache() {
        let (mut scd, _) = session_with_fresh_sample(700);
        let raw = scd.raw_sample();

        scd.stop().unwrap();

        assert!(!scd.is_measuring());
        assert_eq!(scd.raw_sample(), raw);
        assert_eq!(scd.interface.opcodes().last().unwrap(), STOP);
    }

    #[test]
    fn bus_error_propagates_unretried() {
        let mut mock = MockInterface::new();
        mock.fail_writes = true;
        let mut scd = Scd41::new(mock);

        let result = scd.co2();
        assert!(matches!(result, Err(Error::Bus(MockBusError::Nack))));
        assert!(scd.interface.write_log.is_empty());
    }
}
