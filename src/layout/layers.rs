//! Field declarations contributed by each layer
//!
//! Every group is a fixed, ordered list of fields. The composition engine
//! only decides whether a group is present; the order inside a group is
//! owned by the layer that declares it.

use serde::Serialize;

/// One field inside a layer's group. Multi-byte fields are little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub width: usize,
}

impl FieldSpec {
    pub const fn new(name: &'static str, width: usize) -> Self {
        FieldSpec { name, width }
    }
}

/// Total width of a field list
pub const fn fields_size(fields: &[FieldSpec]) -> usize {
    let mut total = 0;
    let mut i = 0;
    while i < fields.len() {
        total += fields[i].width;
        i += 1;
    }
    total
}

// Header groups, on air.

/// Physical length byte, counts every byte after itself including the FCS
pub const RADIO_HEADER: &[FieldSpec] = &[FieldSpec::new("length", 1)];

pub const IEEE154_HEADER: &[FieldSpec] = &[
    FieldSpec::new("fcf", 2),
    FieldSpec::new("dsn", 1),
    FieldSpec::new("destpan", 2),
    FieldSpec::new("dest", 2),
    FieldSpec::new("src", 2),
];

/// 6LoWPAN dispatch byte
pub const NETWORK_HEADER: &[FieldSpec] = &[FieldSpec::new("network", 1)];

pub const ACTIVE_MESSAGE_HEADER: &[FieldSpec] = &[FieldSpec::new("type", 1)];

/// Timestamp a time stamped send would like to place after the payload
pub const TIMESTAMP_FOOTER: &[FieldSpec] = &[FieldSpec::new("timestamp", 4)];

// Metadata groups, never transmitted.

pub const LPL_METADATA: &[FieldSpec] = &[FieldSpec::new("sleepint", 2)];

pub const LINK_METADATA: &[FieldSpec] = &[
    FieldSpec::new("max_retries", 2),
    FieldSpec::new("retry_delay", 2),
];

pub const TIMESTAMP_METADATA: &[FieldSpec] = &[FieldSpec::new("timestamp", 4)];

pub const FLAGS_METADATA: &[FieldSpec] = &[FieldSpec::new("flags", 1)];

/// Link quality and the shared transmit power / received RSSI byte
pub const RADIO_METADATA: &[FieldSpec] = &[
    FieldSpec::new("lqi", 1),
    FieldSpec::new("power_or_rssi", 1),
];

pub const TIMESTAMP_SIZE: usize = fields_size(TIMESTAMP_FOOTER);
