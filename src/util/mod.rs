//! Utility module
//!
//! Helpers shared by the frame codec and the radio driver boundary.

pub mod crc;

pub use self::crc::{crc_bytes, frame_check_sequence, update_crc, CRC_SEED};
