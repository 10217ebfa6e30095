//! # Domain Invariants
//!
//! Rules a creation transaction must satisfy before it is signed.

use super::entities::ChannelHeader;
use super::errors::ChannelError;
use super::value_objects::{ChannelId, HeaderType};

/// Sequence number of a channel's first block.
pub const GENESIS_BLOCK_NUMBER: u64 = 0;

/// Default genesis block wait timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Pause between delivery attempts.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 200;

/// Size of the random nonce in a signature header.
pub const NONCE_SIZE: usize = 24;

/// Version stamped on channel headers created by this crate.
pub const MSG_VERSION: i32 = 0;

/// Invariant: a creation transaction is a CONFIG_UPDATE.
pub fn invariant_config_update_type(header: &ChannelHeader) -> Result<(), ChannelError> {
    if HeaderType::from_i32(header.header_type) != Some(HeaderType::ConfigUpdate) {
        return Err(ChannelError::invalid_tx("bad type"));
    }
    Ok(())
}

/// Invariant: the embedded channel id is set and agrees with the caller.
///
/// When the caller supplied no id the embedded one is adopted. A non-empty
/// caller id must match exactly.
pub fn invariant_channel_id_resolved(
    header: &ChannelHeader,
    expected: Option<&ChannelId>,
) -> Result<ChannelId, ChannelError> {
    if header.channel_id.is_empty() {
        return Err(ChannelError::invalid_tx("empty channel id"));
    }

    match expected {
        None => ChannelId::new(header.channel_id.clone()),
        Some(expected) if expected.as_str() == header.channel_id => Ok(expected.clone()),
        Some(expected) => Err(ChannelError::InvalidCreateTx(format!(
            "mismatched channel ID {} != {}",
            header.channel_id, expected
        ))),
    }
}
