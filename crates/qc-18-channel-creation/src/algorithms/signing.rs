//! # Envelope Signing
//!
//! Signature headers, transaction ids and signed envelopes.

use rand::RngCore;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::domain::{
    encode, ChannelError, ChannelHeader, ChannelId, Envelope, Header, HeaderType, Payload,
    SignatureHeader, MSG_VERSION, NONCE_SIZE,
};
use crate::ports::SignerIdentity;

/// Current UNIX time in seconds.
pub fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Fresh signature header for `signer` with a random nonce.
pub fn new_signature_header(signer: &dyn SignerIdentity) -> Result<SignatureHeader, ChannelError> {
    let creator = signer.serialize()?;
    let mut nonce = vec![0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce);
    Ok(SignatureHeader { creator, nonce })
}

/// Transaction id: hex SHA-256 of `nonce || creator`.
pub fn compute_tx_id(nonce: &[u8], creator: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(nonce);
    hasher.update(creator);
    hex::encode(hasher.finalize())
}

/// Unsigned channel header of `header_type` for `channel_id`.
pub fn make_channel_header(
    header_type: HeaderType,
    channel_id: &str,
    tx_id: String,
    epoch: u64,
) -> ChannelHeader {
    ChannelHeader {
        header_type: header_type.as_i32(),
        version: MSG_VERSION,
        timestamp: current_timestamp(),
        channel_id: channel_id.to_string(),
        tx_id,
        epoch,
    }
}

/// Wrap `data` in a payload addressed to `channel_id` and sign it.
///
/// Returns the envelope and its transaction id.
pub fn create_signed_envelope<T: Serialize>(
    header_type: HeaderType,
    channel_id: &ChannelId,
    signer: &dyn SignerIdentity,
    data: &T,
    epoch: u64,
) -> Result<(Envelope, String), ChannelError> {
    let signature_header = new_signature_header(signer)?;
    let tx_id = compute_tx_id(&signature_header.nonce, &signature_header.creator);
    let channel_header = make_channel_header(header_type, channel_id.as_str(), tx_id.clone(), epoch);

    let payload = Payload {
        header: Some(Header {
            channel_header: encode(&channel_header)?,
            signature_header: encode(&signature_header)?,
        }),
        data: encode(data)?,
    };
    let payload = encode(&payload)?;
    let signature = signer.sign(&payload)?;

    Ok((Envelope { payload, signature }, tx_id))
}
