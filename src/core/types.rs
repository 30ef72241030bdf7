use serde::{Deserialize, Serialize};

use super::error::{ConfigError, Result};
use crate::layout::{Layer, PacketLayout};
use crate::time::TimingParameters;

/// Frame composition flags
///
/// Mirrors the radio stack's build switches. Each flag only decides whether
/// a layer's field group is present; it never changes a group's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameFlags {
    /// Omit the network header byte (`TFRAMES_ENABLED`)
    pub raw_frames: bool,
    /// Omit the active message header byte (`IEEE154FRAMES_ENABLED`)
    pub raw_link_frames: bool,
    /// Carry low-power-listening metadata (`LOW_POWER_LISTENING`)
    pub low_power_listening: bool,
    /// Carry packet-link metadata (`PACKET_LINK`)
    pub packet_link: bool,
    /// Time stamp sends at the frame tail, capping their payload
    pub footer_timestamp: bool,
}

impl FrameFlags {
    /// Flags selected by the crate's cargo features
    pub const fn from_features() -> Self {
        FrameFlags {
            raw_frames: cfg!(feature = "tframes"),
            raw_link_frames: cfg!(feature = "ieee154-frames"),
            low_power_listening: cfg!(feature = "low-power-listening"),
            packet_link: cfg!(feature = "packet-link"),
            footer_timestamp: cfg!(feature = "footer-timestamp"),
        }
    }
}

/// Optional layer implementations compiled into the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerSupport {
    pub low_power_listening: bool,
    pub packet_link: bool,
}

impl LayerSupport {
    pub const ALL: LayerSupport = LayerSupport {
        low_power_listening: true,
        packet_link: true,
    };

    pub const fn from_features() -> Self {
        LayerSupport {
            low_power_listening: cfg!(feature = "lpl-layer"),
            packet_link: cfg!(feature = "packet-link-layer"),
        }
    }

    /// Returns whether the given optional layer is compiled in.
    /// Layers that are not optional are always available.
    pub const fn supports(&self, layer: Layer) -> bool {
        match layer {
            Layer::LowPowerListening => self.low_power_listening,
            Layer::PacketLink => self.packet_link,
            _ => true,
        }
    }
}

impl Default for LayerSupport {
    fn default() -> Self {
        LayerSupport::ALL
    }
}

/// Timer prescaler selection for the radio alarm timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockDivisor {
    Divide1,
    Divide8,
    Divide64,
    Divide256,
    Divide1024,
}

impl ClockDivisor {
    /// Raw hardware clock ticks per timer tick
    pub const fn prescaler(self) -> u32 {
        match self {
            ClockDivisor::Divide1 => 1,
            ClockDivisor::Divide8 => 8,
            ClockDivisor::Divide64 => 64,
            ClockDivisor::Divide256 => 256,
            ClockDivisor::Divide1024 => 1024,
        }
    }
}

impl Default for ClockDivisor {
    fn default() -> Self {
        ClockDivisor::Divide8
    }
}

/// Processor clock configuration feeding the alarm timing derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Processor clock in MHz
    pub mhz: u32,
    /// Alarm timer prescaler
    pub divisor: ClockDivisor,
}

impl ClockConfig {
    pub const DEFAULT: ClockConfig = ClockConfig {
        mhz: super::REQUIRED_MHZ,
        divisor: ClockDivisor::Divide8,
    };
}

impl Default for ClockConfig {
    fn default() -> Self {
        ClockConfig::DEFAULT
    }
}

/// Clear channel assessment mode (`CCA_MODE` field of `PHY_CC_CCA`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CcaMode {
    /// Energy above threshold or carrier sense
    Mode0,
    /// Energy above threshold
    Mode1,
    /// Carrier sense only
    Mode2,
    /// Carrier sense with energy above threshold
    Mode3,
}

impl CcaMode {
    pub const fn bits(self) -> u8 {
        match self {
            CcaMode::Mode0 => 0,
            CcaMode::Mode1 => 1,
            CcaMode::Mode2 => 2,
            CcaMode::Mode3 => 3,
        }
    }
}

/// Register values handed unmodified to the radio driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioRegisters {
    /// `TRX_CTRL_0`: output pin currents and CLKM clock
    #[serde(serialize_with = "super::serde::serialize_hex_u8")]
    #[serde(deserialize_with = "super::serde::deserialize_hex_u8")]
    pub trx_ctrl_0: u8,
    pub cca_mode: CcaMode,
    /// `CCA_THRES`: energy level used for clear channel assessment
    #[serde(serialize_with = "super::serde::serialize_hex_u8")]
    #[serde(deserialize_with = "super::serde::deserialize_hex_u8")]
    pub cca_threshold: u8,
    /// `TX_PWR` field of `PHY_TX_PWR`
    #[serde(serialize_with = "super::serde::serialize_hex_u8")]
    #[serde(deserialize_with = "super::serde::deserialize_hex_u8")]
    pub tx_power: u8,
    pub channel: u8,
}

impl RadioRegisters {
    /// Highest sub-GHz channel number
    pub const MAX_CHANNEL: u8 = 10;

    pub const DEFAULT: RadioRegisters = RadioRegisters {
        trx_ctrl_0: 0,
        cca_mode: CcaMode::Mode3,
        cca_threshold: 0xC7,
        tx_power: 0xC0,
        channel: 6,
    };

    pub const fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.channel > Self::MAX_CHANNEL {
            return Err(ConfigError::ChannelOutOfRange {
                channel: self.channel,
                max: Self::MAX_CHANNEL,
            });
        }
        Ok(())
    }
}

impl Default for RadioRegisters {
    fn default() -> Self {
        RadioRegisters::DEFAULT
    }
}

/// Complete build configuration of the radio stack
///
/// Constructed once and passed by reference; nothing in the crate mutates
/// a configuration after it has been validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    pub frames: FrameFlags,
    pub support: LayerSupport,
    pub clock: ClockConfig,
    pub registers: RadioRegisters,
    /// Largest application payload in bytes
    pub max_payload: usize,
}

impl RadioConfig {
    pub const DEFAULT: RadioConfig = RadioConfig {
        frames: FrameFlags {
            raw_frames: false,
            raw_link_frames: false,
            low_power_listening: false,
            packet_link: false,
            footer_timestamp: false,
        },
        support: LayerSupport::ALL,
        clock: ClockConfig::DEFAULT,
        registers: RadioRegisters::DEFAULT,
        max_payload: super::DEFAULT_MAX_PAYLOAD,
    };

    /// Configuration selected by the crate's cargo features
    pub const BUILD: RadioConfig = RadioConfig {
        frames: FrameFlags::from_features(),
        support: LayerSupport::from_features(),
        ..RadioConfig::DEFAULT
    };

    pub const fn with_frames(mut self, frames: FrameFlags) -> Self {
        self.frames = frames;
        self
    }

    pub const fn with_clock(mut self, clock: ClockConfig) -> Self {
        self.clock = clock;
        self
    }

    pub const fn with_max_payload(mut self, max_payload: usize) -> Self {
        self.max_payload = max_payload;
        self
    }

    /// Checks every build-time constraint of the configuration
    pub const fn check(&self) -> std::result::Result<(), ConfigError> {
        if let Err(e) = self.registers.validate() {
            return Err(e);
        }
        if let Err(e) = TimingParameters::derive(&self.clock) {
            return Err(e);
        }
        match PacketLayout::compose(self) {
            Ok(_) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Validates the configuration, logging the rejected constraint
    pub fn validate(&self) -> Result<()> {
        self.check().map_err(|e| {
            tracing::error!(error = %e, "invalid radio configuration");
            e.into()
        })
    }

    /// Parses and validates a JSON configuration
    pub fn from_json(text: &str) -> Result<Self> {
        let config: RadioConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        RadioConfig::DEFAULT
    }
}
