use bytes::{Buf, BufMut, Bytes};
use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::layout::layers::*;
use crate::layout::{HeaderLayout, Layer, MetadataLayout, PacketLayout};

/// Per-layer field contract
///
/// Each layer encodes and decodes only its own group, always `SIZE` bytes,
/// in the field order it declares in [`FIELDS`](FieldGroupCodec::FIELDS).
pub trait FieldGroupCodec: Sized {
    const LAYER: Layer;
    const FIELDS: &'static [FieldSpec];
    const SIZE: usize = fields_size(Self::FIELDS);

    fn encode<B: BufMut>(&self, dst: &mut B);

    /// Reads the group. The caller guarantees `SIZE` bytes remain.
    fn decode<B: Buf>(src: &mut B) -> Self;
}

/// Physical radio framing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RadioHeader {
    pub length: u8,
}

impl FieldGroupCodec for RadioHeader {
    const LAYER: Layer = Layer::Radio;
    const FIELDS: &'static [FieldSpec] = RADIO_HEADER;

    fn encode<B: BufMut>(&self, dst: &mut B) {
        dst.put_u8(self.length);
    }

    fn decode<B: Buf>(src: &mut B) -> Self {
        RadioHeader { length: src.get_u8() }
    }
}

/// IEEE 802.15.4 MAC header with short addressing and PAN ID compression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ieee154Header {
    pub fcf: u16,
    pub dsn: u8,
    pub dest_pan: u16,
    pub dest: u16,
    pub src: u16,
}

impl Ieee154Header {
    /// Data frame, PAN ID compression, short source and destination
    pub const DATA_FCF: u16 = 0x8841;
    pub const ACK_REQUEST: u16 = 0x0020;
    pub const BROADCAST: u16 = 0xFFFF;

    pub fn ack_requested(&self) -> bool {
        self.fcf & Self::ACK_REQUEST != 0
    }
}

impl Default for Ieee154Header {
    fn default() -> Self {
        Ieee154Header {
            fcf: Self::DATA_FCF,
            dsn: 0,
            dest_pan: 0,
            dest: Self::BROADCAST,
            src: 0,
        }
    }
}

impl FieldGroupCodec for Ieee154Header {
    const LAYER: Layer = Layer::Ieee154;
    const FIELDS: &'static [FieldSpec] = IEEE154_HEADER;

    fn encode<B: BufMut>(&self, dst: &mut B) {
        dst.put_u16_le(self.fcf);
        dst.put_u8(self.dsn);
        dst.put_u16_le(self.dest_pan);
        dst.put_u16_le(self.dest);
        dst.put_u16_le(self.src);
    }

    fn decode<B: Buf>(src: &mut B) -> Self {
        Ieee154Header {
            fcf: src.get_u16_le(),
            dsn: src.get_u8(),
            dest_pan: src.get_u16_le(),
            dest: src.get_u16_le(),
            src: src.get_u16_le(),
        }
    }
}

/// Network dispatch byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkHeader {
    pub network: u8,
}

impl NetworkHeader {
    /// 6LoWPAN dispatch reserved for TinyOS frames
    pub const TINYOS_DISPATCH: u8 = 0x3F;
}

impl Default for NetworkHeader {
    fn default() -> Self {
        NetworkHeader { network: Self::TINYOS_DISPATCH }
    }
}

impl FieldGroupCodec for NetworkHeader {
    const LAYER: Layer = Layer::Network;
    const FIELDS: &'static [FieldSpec] = NETWORK_HEADER;

    fn encode<B: BufMut>(&self, dst: &mut B) {
        dst.put_u8(self.network);
    }

    fn decode<B: Buf>(src: &mut B) -> Self {
        NetworkHeader { network: src.get_u8() }
    }
}

/// Active message type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActiveMessageHeader {
    pub am_type: u8,
}

impl FieldGroupCodec for ActiveMessageHeader {
    const LAYER: Layer = Layer::ActiveMessage;
    const FIELDS: &'static [FieldSpec] = ACTIVE_MESSAGE_HEADER;

    fn encode<B: BufMut>(&self, dst: &mut B) {
        dst.put_u8(self.am_type);
    }

    fn decode<B: Buf>(src: &mut B) -> Self {
        ActiveMessageHeader { am_type: src.get_u8() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LplMetadata {
    /// Receiver sleep interval in milliseconds
    pub sleep_interval: u16,
}

impl FieldGroupCodec for LplMetadata {
    const LAYER: Layer = Layer::LowPowerListening;
    const FIELDS: &'static [FieldSpec] = LPL_METADATA;

    fn encode<B: BufMut>(&self, dst: &mut B) {
        dst.put_u16_le(self.sleep_interval);
    }

    fn decode<B: Buf>(src: &mut B) -> Self {
        LplMetadata { sleep_interval: src.get_u16_le() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinkMetadata {
    pub max_retries: u16,
    /// Delay between retries in milliseconds
    pub retry_delay: u16,
}

impl FieldGroupCodec for LinkMetadata {
    const LAYER: Layer = Layer::PacketLink;
    const FIELDS: &'static [FieldSpec] = LINK_METADATA;

    fn encode<B: BufMut>(&self, dst: &mut B) {
        dst.put_u16_le(self.max_retries);
        dst.put_u16_le(self.retry_delay);
    }

    fn decode<B: Buf>(src: &mut B) -> Self {
        LinkMetadata {
            max_retries: src.get_u16_le(),
            retry_delay: src.get_u16_le(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimestampMetadata {
    /// Radio alarm time of the start-of-frame delimiter
    pub timestamp: u32,
}

impl FieldGroupCodec for TimestampMetadata {
    const LAYER: Layer = Layer::TimeStamp;
    const FIELDS: &'static [FieldSpec] = TIMESTAMP_METADATA;

    fn encode<B: BufMut>(&self, dst: &mut B) {
        dst.put_u32_le(self.timestamp);
    }

    fn decode<B: Buf>(src: &mut B) -> Self {
        TimestampMetadata { timestamp: src.get_u32_le() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FlagsMetadata {
    pub flags: u8,
}

impl FlagsMetadata {
    pub const ACK_RECEIVED: u8 = 0x01;
    pub const TIMESTAMP_VALID: u8 = 0x02;
    /// The send carries a time synchronization timestamp
    pub const TIME_SYNC: u8 = 0x04;

    pub fn contains(&self, flag: u8) -> bool {
        self.flags & flag == flag
    }

    pub fn set(&mut self, flag: u8) {
        self.flags |= flag;
    }

    pub fn clear(&mut self, flag: u8) {
        self.flags &= !flag;
    }
}

impl FieldGroupCodec for FlagsMetadata {
    const LAYER: Layer = Layer::Flags;
    const FIELDS: &'static [FieldSpec] = FLAGS_METADATA;

    fn encode<B: BufMut>(&self, dst: &mut B) {
        dst.put_u8(self.flags);
    }

    fn decode<B: Buf>(src: &mut B) -> Self {
        FlagsMetadata { flags: src.get_u8() }
    }
}

/// Radio chip status. The second byte holds the transmit power on send
/// and the RSSI on receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RadioMetadata {
    pub lqi: u8,
    pub power_or_rssi: u8,
}

impl RadioMetadata {
    pub fn tx_power(&self) -> u8 {
        self.power_or_rssi
    }

    pub fn rssi(&self) -> i8 {
        self.power_or_rssi as i8
    }
}

impl FieldGroupCodec for RadioMetadata {
    const LAYER: Layer = Layer::Radio;
    const FIELDS: &'static [FieldSpec] = RADIO_METADATA;

    fn encode<B: BufMut>(&self, dst: &mut B) {
        dst.put_u8(self.lqi);
        dst.put_u8(self.power_or_rssi);
    }

    fn decode<B: Buf>(src: &mut B) -> Self {
        RadioMetadata {
            lqi: src.get_u8(),
            power_or_rssi: src.get_u8(),
        }
    }
}

fn encode_optional<G: FieldGroupCodec, B: BufMut>(group: &Option<G>, dst: &mut B) -> Result<()> {
    match group {
        Some(value) => {
            value.encode(dst);
            Ok(())
        }
        None => Err(Error::layer_mismatch(format!(
            "layout has a {} group but the packet carries none",
            G::LAYER
        ))),
    }
}

fn check_absent<G: FieldGroupCodec>(group: &Option<G>, present: bool) -> Result<()> {
    if group.is_some() && !present {
        return Err(Error::layer_mismatch(format!(
            "packet carries a {} group the layout does not have",
            G::LAYER
        )));
    }
    Ok(())
}

fn ensure_remaining<B: Buf>(src: &B, needed: usize, region: &str) -> Result<()> {
    if src.remaining() < needed {
        return Err(Error::codec(format!(
            "{} needs {} bytes, {} available",
            region,
            needed,
            src.remaining()
        )));
    }
    Ok(())
}

/// Header field values of one packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PacketHeader {
    pub radio: RadioHeader,
    pub ieee154: Ieee154Header,
    pub network: Option<NetworkHeader>,
    pub am: Option<ActiveMessageHeader>,
}

impl PacketHeader {
    /// Default values for every group present in `layout`
    pub fn for_layout(layout: &HeaderLayout) -> Self {
        PacketHeader {
            radio: RadioHeader::default(),
            ieee154: Ieee154Header::default(),
            network: layout.contains(Layer::Network).then(NetworkHeader::default),
            am: layout.contains(Layer::ActiveMessage).then(ActiveMessageHeader::default),
        }
    }

    /// Writes the groups of `layout` in layout order
    pub fn encode<B: BufMut>(&self, layout: &HeaderLayout, dst: &mut B) -> Result<()> {
        check_absent(&self.network, layout.contains(Layer::Network))?;
        check_absent(&self.am, layout.contains(Layer::ActiveMessage))?;

        for group in layout.groups() {
            match group.layer {
                Layer::Radio => self.radio.encode(dst),
                Layer::Ieee154 => self.ieee154.encode(dst),
                Layer::Network => encode_optional(&self.network, dst)?,
                Layer::ActiveMessage => encode_optional(&self.am, dst)?,
                other => {
                    return Err(Error::layer_mismatch(format!("{} has no header group", other)))
                }
            }
        }
        Ok(())
    }

    pub fn decode<B: Buf>(layout: &HeaderLayout, src: &mut B) -> Result<Self> {
        ensure_remaining(src, layout.size(), "header")?;

        let mut header = PacketHeader::default();
        for group in layout.groups() {
            match group.layer {
                Layer::Radio => header.radio = RadioHeader::decode(src),
                Layer::Ieee154 => header.ieee154 = Ieee154Header::decode(src),
                Layer::Network => header.network = Some(NetworkHeader::decode(src)),
                Layer::ActiveMessage => header.am = Some(ActiveMessageHeader::decode(src)),
                other => {
                    return Err(Error::layer_mismatch(format!("{} has no header group", other)))
                }
            }
        }
        Ok(header)
    }
}

/// Out-of-band values attached to a packet record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PacketMetadata {
    pub lpl: Option<LplMetadata>,
    pub link: Option<LinkMetadata>,
    pub timestamp: TimestampMetadata,
    pub flags: FlagsMetadata,
    pub radio: RadioMetadata,
}

impl PacketMetadata {
    pub fn for_layout(layout: &MetadataLayout) -> Self {
        PacketMetadata {
            lpl: layout.contains(Layer::LowPowerListening).then(LplMetadata::default),
            link: layout.contains(Layer::PacketLink).then(LinkMetadata::default),
            ..PacketMetadata::default()
        }
    }

    /// Snapshot of the metadata region, in layout order
    pub fn encode<B: BufMut>(&self, layout: &MetadataLayout, dst: &mut B) -> Result<()> {
        check_absent(&self.lpl, layout.contains(Layer::LowPowerListening))?;
        check_absent(&self.link, layout.contains(Layer::PacketLink))?;

        for group in layout.groups() {
            match group.layer {
                Layer::LowPowerListening => encode_optional(&self.lpl, dst)?,
                Layer::PacketLink => encode_optional(&self.link, dst)?,
                Layer::TimeStamp => self.timestamp.encode(dst),
                Layer::Flags => self.flags.encode(dst),
                Layer::Radio => self.radio.encode(dst),
                other => {
                    return Err(Error::layer_mismatch(format!("{} has no metadata group", other)))
                }
            }
        }
        Ok(())
    }

    pub fn decode<B: Buf>(layout: &MetadataLayout, src: &mut B) -> Result<Self> {
        ensure_remaining(src, layout.size(), "metadata")?;

        let mut metadata = PacketMetadata::default();
        for group in layout.groups() {
            match group.layer {
                Layer::LowPowerListening => metadata.lpl = Some(LplMetadata::decode(src)),
                Layer::PacketLink => metadata.link = Some(LinkMetadata::decode(src)),
                Layer::TimeStamp => metadata.timestamp = TimestampMetadata::decode(src),
                Layer::Flags => metadata.flags = FlagsMetadata::decode(src),
                Layer::Radio => metadata.radio = RadioMetadata::decode(src),
                other => {
                    return Err(Error::layer_mismatch(format!("{} has no metadata group", other)))
                }
            }
        }
        Ok(metadata)
    }
}

/// A packet record: on-air header and payload plus out-of-band metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioMessage {
    pub header: PacketHeader,
    pub payload: Bytes,
    pub metadata: PacketMetadata,
}

impl RadioMessage {
    /// Creates a message shaped for `layout`
    pub fn new(layout: &PacketLayout, payload: impl Into<Bytes>) -> Self {
        RadioMessage {
            header: PacketHeader::for_layout(layout.header()),
            payload: payload.into(),
            metadata: PacketMetadata::for_layout(layout.metadata()),
        }
    }

    pub fn is_timestamped(&self) -> bool {
        self.metadata.flags.contains(FlagsMetadata::TIME_SYNC)
    }
}
