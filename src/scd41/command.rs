//! SCD41 command definitions.
//!
//! Each command is a 2-byte opcode written to the device's bus address.
//! Read-type commands are followed, after a 1 ms settle delay, by a
//! fixed-length response framed as 3-byte groups of
//! `[data hi, data lo, checksum]`.

/// Default bus address of the SCD41.
pub const DEFAULT_ADDRESS: u8 = 0x62;

/// Mask selecting the low 11 bits of the data-ready status word; the
/// device reports "not ready" by setting all of them to zero.
pub const DATA_READY_MASK: u16 = 0x07FF;

/// Length in bytes of the data-ready status response.
pub const READY_STATUS_LEN: usize = 3;

/// Length in bytes of the measurement response: three groups of two
/// data bytes plus one checksum byte, for CO2, temperature and relative
/// humidity in that order.
pub const MEASUREMENT_LEN: usize = 9;

/// An SCD41 command.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    /// Stop periodic measurement. Also serves as an idempotent soft
    /// reset when the device's measurement mode may be out of sync with
    /// the session state.
    StopPeriodicMeasurement,

    /// Start periodic measurement; the device then samples continuously
    /// until stopped.
    StartPeriodicMeasurement,

    /// Ask whether a new sample is available to read.
    GetDataReadyStatus,

    /// Read the current sample. Reading clears the device's internal
    /// buffer, so this is only valid after a positive data-ready check.
    ReadMeasurement,
}

impl Command {
    /// The 2-byte opcode for this command.
    pub const fn opcode(&self) -> [u8; 2] {
        match self {
            Command::StopPeriodicMeasurement => [0x3F, 0x86],
            Command::StartPeriodicMeasurement => [0x21, 0xB1],
            Command::GetDataReadyStatus => [0xE4, 0xB8],
            Command::ReadMeasurement => [0xEC, 0x05],
        }
    }

    /// Expected response length in bytes, or `None` for write-only
    /// commands.
    pub const fn response_len(&self) -> Option<usize> {
        match self {
            Command::StopPeriodicMeasurement | Command::StartPeriodicMeasurement => None,
            Command::GetDataReadyStatus => Some(READY_STATUS_LEN),
            Command::ReadMeasurement => Some(MEASUREMENT_LEN),
        }
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcodes_match_datasheet() {
        assert_eq!(Command::StopPeriodicMeasurement.opcode(), [0x3F, 0x86]);
        assert_eq!(Command::StartPeriodicMeasurement.opcode(), [0x21, 0xB1]);
        assert_eq!(Command::GetDataReadyStatus.opcode(), [0xE4, 0xB8]);
        assert_eq!(Command::ReadMeasurement.opcode(), [0xEC, 0x05]);
    }

    #[test]
    fn response_lengths() {
        assert_eq!(Command::StopPeriodicMeasurement.response_len(), None);
        assert_eq!(Command::StartPeriodicMeasurement.response_len(), None);
        assert_eq!(Command::GetDataReadyStatus.response_len(), Some(3));
        assert_eq!(Command::ReadMeasurement.response_len(), Some(9));
    }
}
