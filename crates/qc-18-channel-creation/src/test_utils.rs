//! Fixtures shared by unit and integration tests.

use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::algorithms::make_channel_header;
use crate::domain::{
    encode, Block, ChannelError, ConfigUpdate, ConfigUpdateEnvelope, Envelope, Header,
    HeaderType, Payload,
};
use crate::ports::SignerIdentity;

/// Deterministic signer: the signature is SHA-256 of the message.
#[derive(Clone, Debug, Default)]
pub struct StaticSigner {
    fail: bool,
    signs: Arc<Mutex<usize>>,
}

impl StaticSigner {
    /// Signer whose every operation fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    /// Signature this signer produces for `message`.
    pub fn expected_signature(message: &[u8]) -> Vec<u8> {
        Sha256::digest(message).to_vec()
    }

    /// Number of successful `sign` calls.
    pub fn sign_count(&self) -> usize {
        *self.signs.lock()
    }
}

impl SignerIdentity for StaticSigner {
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, ChannelError> {
        if self.fail {
            return Err(ChannelError::Signing("hsm offline".to_string()));
        }
        *self.signs.lock() += 1;
        Ok(Self::expected_signature(message))
    }

    fn serialize(&self) -> Result<Vec<u8>, ChannelError> {
        if self.fail {
            return Err(ChannelError::Signing("hsm offline".to_string()));
        }
        Ok(b"static-signer".to_vec())
    }
}

/// Unsigned creation-style envelope with the given header type and channel id.
pub fn make_create_tx(header_type: HeaderType, channel_id: &str) -> Envelope {
    let config_update = ConfigUpdate {
        channel_id: channel_id.to_string(),
        ..Default::default()
    };
    let config_update_env = ConfigUpdateEnvelope {
        config_update: encode(&config_update).expect("encode config update"),
        signatures: Vec::new(),
    };
    let channel_header = make_channel_header(header_type, channel_id, String::new(), 0);
    let payload = Payload {
        header: Some(Header {
            channel_header: encode(&channel_header).expect("encode channel header"),
            signature_header: Vec::new(),
        }),
        data: encode(&config_update_env).expect("encode config update envelope"),
    };
    Envelope {
        payload: encode(&payload).expect("encode payload"),
        signature: Vec::new(),
    }
}

/// Genesis block of `channel_id` holding a single CONFIG envelope.
pub fn make_genesis_block(channel_id: &str) -> Block {
    let envelope = make_create_tx(HeaderType::Config, channel_id);
    Block::new(0, [0u8; 32], vec![encode(&envelope).expect("encode envelope")])
}
