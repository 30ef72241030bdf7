//! rfstack: radio packet-layer composition and alarm timing
//!
//! A low-power 802.15.4 radio stack builds its frames from field groups
//! contributed by independent layers. This library fixes, per build
//! configuration, which groups participate and at which offsets, derives the
//! radio alarm tick constants from the processor clock, and provides the
//! frame codec and CRC command that rely on both.
//!
//! ```
//! use rfstack::layout::{Layer, BUILD_LAYOUT};
//!
//! assert_eq!(BUILD_LAYOUT.header().layers().next(), Some(Layer::Radio));
//! assert!(BUILD_LAYOUT.footer().is_empty());
//! ```

pub mod core;
pub mod layout;
pub mod protocol;
pub mod time;
pub mod util;

// Re-export commonly used items
pub use crate::core::{ConfigError, Error, RadioConfig, Result};
pub use crate::layout::{PacketLayout, BUILD_LAYOUT};
pub use crate::protocol::{FrameCodec, RadioMessage};
pub use crate::time::{TimingParameters, ALARM};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
