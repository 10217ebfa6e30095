//! # Domain Entities
//!
//! Wire structures exchanged with the ordering and delivery services.
//!
//! Nested structures are carried as encoded bytes (`Vec<u8>`) exactly where
//! signatures are computed over them, so the signed bytes are the bytes on
//! the wire.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use super::codec::decode;
use super::errors::{ChannelError, Hash};
use super::value_objects::ChannelId;

/// Outermost transaction wrapper: an encoded [`Payload`] and its signature.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Encoded [`Payload`].
    pub payload: Vec<u8>,
    /// Signature over `payload` by the creator in the signature header.
    pub signature: Vec<u8>,
}

/// Envelope contents.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    /// Routing and identity header.
    pub header: Option<Header>,
    /// Type-specific data, e.g. an encoded [`ConfigUpdateEnvelope`].
    pub data: Vec<u8>,
}

/// Payload header.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Encoded [`ChannelHeader`]. Empty means absent.
    pub channel_header: Vec<u8>,
    /// Encoded [`SignatureHeader`].
    pub signature_header: Vec<u8>,
}

/// Channel routing header.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelHeader {
    /// Raw [`HeaderType`](super::HeaderType) value.
    pub header_type: i32,
    /// Message protocol version.
    pub version: i32,
    /// Creation time, seconds since the UNIX epoch.
    pub timestamp: u64,
    /// Channel this message is bound for.
    pub channel_id: String,
    /// Transaction id (hex SHA-256 of nonce || creator).
    pub tx_id: String,
    /// Epoch the message was generated in.
    pub epoch: u64,
}

/// Identity and replay protection for a signature.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureHeader {
    /// Serialized signer identity.
    pub creator: Vec<u8>,
    /// Random nonce.
    pub nonce: Vec<u8>,
}

/// A config update plus the signatures endorsing it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUpdateEnvelope {
    /// Encoded [`ConfigUpdate`].
    pub config_update: Vec<u8>,
    /// Signatures over `signature_header || config_update`.
    pub signatures: Vec<ConfigSignature>,
}

/// One endorsement of a config update.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSignature {
    /// Encoded [`SignatureHeader`].
    pub signature_header: Vec<u8>,
    /// Signature over `signature_header || config_update`.
    pub signature: Vec<u8>,
}

/// Delta between the current and the desired channel configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUpdate {
    /// Channel the update applies to.
    pub channel_id: String,
    /// Elements whose versions must match the current config.
    pub read_set: ConfigGroup,
    /// Elements written by the update.
    pub write_set: ConfigGroup,
}

/// Hierarchical configuration element.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigGroup {
    /// Element version.
    pub version: u64,
    /// Child groups by name.
    pub groups: BTreeMap<String, ConfigGroup>,
    /// Encoded values by name.
    pub values: BTreeMap<String, Vec<u8>>,
    /// Policy required to modify this group.
    pub mod_policy: String,
}

impl ConfigGroup {
    /// Empty group at `version`.
    pub fn at_version(version: u64) -> Self {
        Self {
            version,
            ..Default::default()
        }
    }
}

/// A creation transaction that passed the sanity check and carries the
/// local signature. Read-only once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedEnvelope {
    envelope: Envelope,
    channel_id: ChannelId,
    tx_id: String,
}

impl SignedEnvelope {
    pub(crate) fn new(envelope: Envelope, channel_id: ChannelId, tx_id: String) -> Self {
        Self {
            envelope,
            channel_id,
            tx_id,
        }
    }

    /// Outer envelope to submit.
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Channel id the envelope is addressed to.
    pub fn channel_id(&self) -> &ChannelId {
        &self.channel_id
    }

    /// Transaction id of the outer envelope.
    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }
}

/// Block header.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Position in the channel's chain. The genesis block is 0.
    pub number: u64,
    /// Hash of the previous block header. Zero for genesis.
    pub previous_hash: Hash,
    /// SHA-256 over the concatenated data entries.
    pub data_hash: Hash,
}

/// A ledger block as served by the delivery service.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Header.
    pub header: BlockHeader,
    /// Encoded envelopes.
    pub data: Vec<Vec<u8>>,
    /// Orderer metadata entries.
    pub metadata: Vec<Vec<u8>>,
}

impl Block {
    /// Build a block over `data`, computing the data hash.
    pub fn new(number: u64, previous_hash: Hash, data: Vec<Vec<u8>>) -> Self {
        let data_hash = Self::compute_data_hash(&data);
        Self {
            header: BlockHeader {
                number,
                previous_hash,
                data_hash,
            },
            data,
            metadata: Vec::new(),
        }
    }

    /// SHA-256 over the concatenation of `data`.
    pub fn compute_data_hash(data: &[Vec<u8>]) -> Hash {
        let mut hasher = Sha256::new();
        for entry in data {
            hasher.update(entry);
        }
        hasher.finalize().into()
    }

    /// Block number.
    pub fn number(&self) -> u64 {
        self.header.number
    }

    /// Whether the data hash in the header matches the data.
    pub fn data_hash_valid(&self) -> bool {
        self.header.data_hash == Self::compute_data_hash(&self.data)
    }

    /// Channel id carried by the first envelope of the block.
    pub fn channel_id(&self) -> Result<String, ChannelError> {
        let first = self
            .data
            .first()
            .ok_or_else(|| ChannelError::Serialization("block has no data".to_string()))?;
        let envelope: Envelope = decode(first)?;
        let payload: Payload = decode(&envelope.payload)?;
        let header = payload
            .header
            .ok_or_else(|| ChannelError::Serialization("envelope has no header".to_string()))?;
        let channel_header: ChannelHeader = decode(&header.channel_header)?;
        Ok(channel_header.channel_id)
    }
}
