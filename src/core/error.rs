use std::io;
use thiserror::Error;

use crate::layout::Layer;

/// Build configuration errors
///
/// Every variant carries only `Copy` data so the composition and timing
/// routines can return it from `const fn` and the build constants can turn
/// it into a compile-time failure.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unsupported clock: {found} MHz, hardware requires {required} MHz")]
    UnsupportedClock { required: u32, found: u32 },

    #[error("Timer prescaler /{prescaler} runs the alarm below the 32 kHz base")]
    PrescalerTooSlow { prescaler: u32 },

    #[error("Layer {layer} is enabled but not compiled into the stack")]
    LayerNotCompiled { layer: Layer },

    #[error("Frame of {length} bytes exceeds the {max} byte PHY limit")]
    FrameTooLong { length: usize, max: usize },

    #[error("Channel {channel} out of range 0..={max}")]
    ChannelOutOfRange { channel: u8, max: u8 },
}

/// Custom error types for the radio stack
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Layer mismatch: {0}")]
    LayerMismatch(String),

    #[error("Payload too long: {length} bytes, maximum is {max}")]
    PayloadTooLong { length: usize, max: usize },

    #[error("CRC mismatch: expected {expected:#06x}, got {actual:#06x}")]
    CrcMismatch { expected: u16, actual: u16 },

    #[error("Serialization error: {0}")]
    Serde(String),
}

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a new codec error
    pub fn codec(msg: impl Into<String>) -> Self {
        Error::Codec(msg.into())
    }

    /// Creates a new layer mismatch error
    pub fn layer_mismatch(msg: impl Into<String>) -> Self {
        Error::LayerMismatch(msg.into())
    }

    /// Creates a new serialization error
    pub fn serde(msg: impl Into<String>) -> Self {
        Error::Serde(msg.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::serde(err.to_string())
    }
}
