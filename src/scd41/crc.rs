// src/scd41/crc.rs

use crc::{Algorithm, Crc, CRC_8_NRSC_5};

use crate::common::error::Error;

/// CRC algorithm used by Sensirion SCD4x response words.
/// Polynomial: 0x31
/// Initial Value: 0xFF
/// Input Reflected: false
/// Output Reflected: false
/// Final XOR: 0x00
/// Check Value (for "123456789"): 0xF7
///
/// This is byte-for-byte CRC-8/NRSC-5, so the predefined algorithm is
/// reused rather than restated.
pub const SCD4X_CRC: Algorithm<u8> = CRC_8_NRSC_5;

const CRC_COMPUTER: Crc<u8> = Crc::<u8>::new(&SCD4X_CRC);

/// Calculates the checksum of a 2-byte response word.
#[inline]
pub fn word_crc(word: [u8; 2]) -> u8 {
    CRC_COMPUTER.checksum(&word)
}

/// Verifies one `[hi, lo, crc]` response group.
///
/// The group slice must be exactly 3 bytes. Returns
/// [`Error::Checksum`] when the trailing byte does not match the
/// checksum of the two data bytes.
pub fn verify_group<E: core::fmt::Debug>(group: &[u8]) -> Result<(), Error<E>> {
    debug_assert_eq!(group.len(), 3);
    let calculated = word_crc([group[0], group[1]]);
    if calculated == group[2] {
        Ok(())
    } else {
        Err(Error::Checksum {
            expected: group[2],
            calculated,
        })
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datasheet_example_word() {
        // SCD4x datasheet: CRC(0xBEEF) = 0x92.
        assert_eq!(word_crc([0xBE, 0xEF]), 0x92);
    }

    #[test]
    fn verify_group_accepts_valid() {
        let word = [0x66, 0x67];
        let group = [word[0], word[1], word_crc(word)];
        assert!(verify_group::<()>(&group).is_ok());
    }

    #[test]
    fn verify_group_rejects_corrupt() {
        let group = [0xBE, 0xEF, 0x00];
        let result = verify_group::<()>(&group);
        assert!(matches!(
            result,
            Err(Error::Checksum {
                expected: 0x00,
                calculated: 0x92
            })
        ));
    }
}
