//! Packet record and frame codec
//!
//! This module defines the typed field groups each layer contributes, the
//! packet record built from them, and the codec that turns records into
//! on-air frames for a given packet layout.

pub mod codec;
pub mod message;

pub use self::codec::FrameCodec;
pub use self::message::{
    ActiveMessageHeader, FieldGroupCodec, FlagsMetadata, Ieee154Header, LinkMetadata,
    LplMetadata, NetworkHeader, PacketHeader, PacketMetadata, RadioHeader, RadioMessage,
    RadioMetadata, TimestampMetadata,
};
