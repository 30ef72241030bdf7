//! Layer composition engine
//!
//! Lays out the header, footer and metadata regions of a radio packet by
//! concatenating the field groups of the participating layers in a fixed
//! order. Composition is a `const fn`: the layout of the crate's own build
//! ([`BUILD_LAYOUT`]) is resolved by the compiler, and a configuration that
//! does not compose fails the build instead of surfacing at runtime.
//!
//! ```text
//! header   | radio | ieee154 | network? | active message? |
//! footer   | (empty, time stamped sends are capped instead) |
//! metadata | lpl? | link? | timestamp | flags | radio |
//! ```

pub mod layers;

use std::fmt;

use serde::ser::{Serialize, Serializer};

use crate::core::{ConfigError, RadioConfig, Result, FCS_SIZE, MAX_FRAME_LENGTH};
use self::layers::*;

pub use self::layers::{fields_size, FieldSpec, TIMESTAMP_SIZE};

/// Protocol layers that contribute field groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Layer {
    /// Physical radio chip framing and status
    Radio,
    /// IEEE 802.15.4 link addressing
    Ieee154,
    /// Network addressing
    Network,
    /// Active message (application) addressing
    ActiveMessage,
    LowPowerListening,
    PacketLink,
    TimeStamp,
    Flags,
}

impl Layer {
    pub const fn name(self) -> &'static str {
        match self {
            Layer::Radio => "radio",
            Layer::Ieee154 => "ieee154",
            Layer::Network => "network",
            Layer::ActiveMessage => "active-message",
            Layer::LowPowerListening => "low-power-listening",
            Layer::PacketLink => "packet-link",
            Layer::TimeStamp => "timestamp",
            Layer::Flags => "flags",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A layer's field group placed at a fixed offset within its region
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct FieldGroup {
    pub layer: Layer,
    pub offset: usize,
    pub size: usize,
    pub fields: &'static [FieldSpec],
}

impl FieldGroup {
    const EMPTY: FieldGroup = FieldGroup {
        layer: Layer::Radio,
        offset: 0,
        size: 0,
        fields: &[],
    };

    /// Offset of a named field within the region, with its declaration
    pub fn field(&self, name: &str) -> Option<(usize, &'static FieldSpec)> {
        let fields: &'static [FieldSpec] = self.fields;
        let mut offset = self.offset;
        for spec in fields {
            if spec.name == name {
                return Some((offset, spec));
            }
            offset += spec.width;
        }
        None
    }
}

/// Ordered, fixed-capacity list of field groups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutDescriptor<const N: usize> {
    groups: [FieldGroup; N],
    len: usize,
    size: usize,
}

impl<const N: usize> LayoutDescriptor<N> {
    pub(crate) const fn new() -> Self {
        LayoutDescriptor {
            groups: [FieldGroup::EMPTY; N],
            len: 0,
            size: 0,
        }
    }

    /// Appends a layer's group after the groups already placed
    pub(crate) const fn push(mut self, layer: Layer, fields: &'static [FieldSpec]) -> Self {
        assert!(self.len < N, "layout descriptor is full");
        let size = fields_size(fields);
        self.groups[self.len] = FieldGroup {
            layer,
            offset: self.size,
            size,
            fields,
        };
        self.len += 1;
        self.size += size;
        self
    }

    pub fn groups(&self) -> &[FieldGroup] {
        &self.groups[..self.len]
    }

    /// Total bytes of all present groups
    pub const fn size(&self) -> usize {
        self.size
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, layer: Layer) -> Option<&FieldGroup> {
        self.groups().iter().find(|g| g.layer == layer)
    }

    pub fn contains(&self, layer: Layer) -> bool {
        self.get(layer).is_some()
    }

    pub fn layers(&self) -> impl Iterator<Item = Layer> + '_ {
        self.groups().iter().map(|g| g.layer)
    }
}

impl<const N: usize> Default for LayoutDescriptor<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Serialize for LayoutDescriptor<N> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.groups())
    }
}

pub type HeaderLayout = LayoutDescriptor<4>;
pub type FooterLayout = LayoutDescriptor<1>;
pub type MetadataLayout = LayoutDescriptor<5>;

/// Complete packet layout of one build configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PacketLayout {
    header: HeaderLayout,
    footer: FooterLayout,
    metadata: MetadataLayout,
    max_payload: usize,
    timestamped_max_payload: usize,
}

impl PacketLayout {
    /// Composes the layout selected by `config`
    pub const fn compose(config: &RadioConfig) -> std::result::Result<Self, ConfigError> {
        let frames = &config.frames;

        if frames.low_power_listening && !config.support.supports(Layer::LowPowerListening) {
            return Err(ConfigError::LayerNotCompiled { layer: Layer::LowPowerListening });
        }
        if frames.packet_link && !config.support.supports(Layer::PacketLink) {
            return Err(ConfigError::LayerNotCompiled { layer: Layer::PacketLink });
        }

        if config.max_payload > MAX_FRAME_LENGTH {
            return Err(ConfigError::FrameTooLong {
                length: config.max_payload,
                max: MAX_FRAME_LENGTH,
            });
        }

        let mut header = HeaderLayout::new()
            .push(Layer::Radio, RADIO_HEADER)
            .push(Layer::Ieee154, IEEE154_HEADER);
        if !frames.raw_frames {
            header = header.push(Layer::Network, NETWORK_HEADER);
        }
        if !frames.raw_link_frames {
            header = header.push(Layer::ActiveMessage, ACTIVE_MESSAGE_HEADER);
        }

        // The timestamp never takes a footer slot; frames that carry one
        // give up that many payload bytes instead.
        let footer = FooterLayout::new();
        let timestamped_max_payload = if frames.footer_timestamp {
            config.max_payload.saturating_sub(TIMESTAMP_SIZE)
        } else {
            config.max_payload
        };

        let mut metadata = MetadataLayout::new();
        if frames.low_power_listening {
            metadata = metadata.push(Layer::LowPowerListening, LPL_METADATA);
        }
        if frames.packet_link {
            metadata = metadata.push(Layer::PacketLink, LINK_METADATA);
        }
        metadata = metadata
            .push(Layer::TimeStamp, TIMESTAMP_METADATA)
            .push(Layer::Flags, FLAGS_METADATA)
            .push(Layer::Radio, RADIO_METADATA);

        let layout = PacketLayout {
            header,
            footer,
            metadata,
            max_payload: config.max_payload,
            timestamped_max_payload,
        };

        let length = layout.frame_length(config.max_payload);
        if length > MAX_FRAME_LENGTH {
            return Err(ConfigError::FrameTooLong { length, max: MAX_FRAME_LENGTH });
        }

        Ok(layout)
    }

    /// Composes the layout and logs its shape
    pub fn build(config: &RadioConfig) -> Result<Self> {
        let layout = Self::compose(config)?;
        tracing::debug!(
            header = layout.header_size(),
            footer = layout.footer_size(),
            metadata = layout.metadata_size(),
            max_payload = layout.max_payload,
            "composed packet layout"
        );
        Ok(layout)
    }

    pub const fn header(&self) -> &HeaderLayout {
        &self.header
    }

    pub const fn footer(&self) -> &FooterLayout {
        &self.footer
    }

    pub const fn metadata(&self) -> &MetadataLayout {
        &self.metadata
    }

    pub const fn header_size(&self) -> usize {
        self.header.size()
    }

    pub const fn footer_size(&self) -> usize {
        self.footer.size()
    }

    pub const fn metadata_size(&self) -> usize {
        self.metadata.size()
    }

    /// Offset of the first payload byte within the frame
    pub const fn payload_offset(&self) -> usize {
        self.header.size()
    }

    /// Largest payload a send may carry
    pub const fn max_payload_length(&self, timestamped: bool) -> usize {
        if timestamped {
            self.timestamped_max_payload
        } else {
            self.max_payload
        }
    }

    /// Value of the radio length byte for a frame with `payload` bytes.
    /// Saturates instead of wrapping on absurd payload sizes.
    pub const fn frame_length(&self, payload: usize) -> usize {
        let overhead = self.header.size() - fields_size(RADIO_HEADER) + self.footer.size() + FCS_SIZE;
        overhead.saturating_add(payload)
    }

    /// Header offset of a layer's group
    pub fn offset_of(&self, layer: Layer) -> Option<usize> {
        self.header.get(layer).map(|g| g.offset)
    }
}

/// Packet layout of this build, resolved from the cargo features at compile time
pub const BUILD_LAYOUT: PacketLayout = match PacketLayout::compose(&RadioConfig::BUILD) {
    Ok(layout) => layout,
    Err(_) => panic!("radio build configuration does not compose"),
};
