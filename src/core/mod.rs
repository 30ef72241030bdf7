//! Core types and configuration for the radio stack
//!
//! This module contains the build configuration shared by the layer
//! composition engine and the alarm timing derivation, and the error types
//! both of them report.

pub mod error;
pub mod types;
pub mod serde;

pub use self::error::{ConfigError, Error, Result};
pub use self::types::{
    CcaMode,
    ClockConfig,
    ClockDivisor,
    FrameFlags,
    LayerSupport,
    RadioConfig,
    RadioRegisters,
};

/// Processor clock the target hardware runs at, in MHz
pub const REQUIRED_MHZ: u32 = 8;

/// Maximum IEEE 802.15.4 PHY payload (everything after the length byte)
pub const MAX_FRAME_LENGTH: usize = 127;

/// Size of the frame check sequence
pub const FCS_SIZE: usize = 2;

/// Default application payload limit
pub const DEFAULT_MAX_PAYLOAD: usize = 28;
