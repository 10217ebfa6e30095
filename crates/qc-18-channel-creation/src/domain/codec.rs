//! # Wire Codec
//!
//! Binary encoding for every wire structure (bincode).

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::errors::ChannelError;

/// Encode a wire structure.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ChannelError> {
    bincode::serialize(value).map_err(|e| ChannelError::Serialization(e.to_string()))
}

/// Decode a wire structure.
///
/// Trailing bytes are rejected so a truncated or concatenated buffer never
/// decodes as a valid value.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ChannelError> {
    use bincode::Options;

    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
        .deserialize(bytes)
        .map_err(|e| ChannelError::Serialization(e.to_string()))
}
