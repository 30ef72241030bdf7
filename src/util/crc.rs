//! CRC command used for the radio frame check sequence
//!
//! The radio computes the 16-bit ITU-T CRC in its reflected form
//! (polynomial 0x8408, no final XOR), better known as CRC-16/KERMIT, and
//! transmits the result little-endian. A generic MSB-first CRC-CCITT routine
//! produces a byte-swapped, non-interoperable value, so frames built with
//! the wrong variant are rejected by every peer.

use ::crc::{Crc, CRC_16_KERMIT};

/// Folds one byte into a running CRC
#[inline]
pub const fn update_crc(crc: u16, byte: u8) -> u16 {
    let mut data = byte ^ (crc as u8);
    data ^= data << 4;
    ((data as u16) << 8 | (crc >> 8)) ^ (data >> 4) as u16 ^ ((data as u16) << 3)
}

/// Runs [`update_crc`] over a byte slice
pub const fn crc_bytes(seed: u16, bytes: &[u8]) -> u16 {
    let mut crc = seed;
    let mut i = 0;
    while i < bytes.len() {
        crc = update_crc(crc, bytes[i]);
        i += 1;
    }
    crc
}

/// Seed the radio starts each frame with
pub const CRC_SEED: u16 = 0;

const FCS: Crc<u16> = Crc::<u16>::new(&CRC_16_KERMIT);

/// Frame check sequence over the bytes following the length byte
pub fn frame_check_sequence(bytes: &[u8]) -> u16 {
    FCS.checksum(bytes)
}
