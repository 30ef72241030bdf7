use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};

/// Serializes a register byte as a `0x`-prefixed hex string
pub fn serialize_hex_u8<S>(value: &u8, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format!("0x{:02X}", value))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RegisterValue {
    Number(u8),
    Text(String),
}

/// Deserializes a register byte from a hex string or a plain number
pub fn deserialize_hex_u8<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    match RegisterValue::deserialize(deserializer)? {
        RegisterValue::Number(value) => Ok(value),
        RegisterValue::Text(text) => {
            let digits = text
                .strip_prefix("0x")
                .or_else(|| text.strip_prefix("0X"))
                .unwrap_or(&text);
            u8::from_str_radix(digits, 16)
                .map_err(|e| D::Error::custom(format!("invalid register value {:?}: {}", text, e)))
        }
    }
}
