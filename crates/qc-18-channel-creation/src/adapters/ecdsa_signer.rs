//! ECDSA Signer Adapter
//!
//! Implements `SignerIdentity` with secp256k1 keys.
//!
//! Signatures are deterministic (RFC 6979) and encoded as 64 bytes r||s.
//! The serialized identity carries the MSP id and the SEC1 compressed
//! public key.

use k256::ecdsa::{
    signature::{Signer, Verifier},
    Signature, SigningKey, VerifyingKey,
};
use serde::{Deserialize, Serialize};

use crate::domain::{decode, encode, ChannelError};
use crate::ports::SignerIdentity;

/// Identity placed in signature headers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedIdentity {
    /// Membership service provider the identity belongs to.
    pub msp_id: String,
    /// SEC1 compressed public key.
    pub id_bytes: Vec<u8>,
}

/// secp256k1 signer bound to an MSP.
pub struct EcdsaSigner {
    msp_id: String,
    signing_key: SigningKey,
}

impl std::fmt::Debug for EcdsaSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EcdsaSigner")
            .field("msp_id", &self.msp_id)
            .finish_non_exhaustive()
    }
}

impl EcdsaSigner {
    /// Generate a random key for `msp_id`.
    pub fn generate(msp_id: impl Into<String>) -> Self {
        Self {
            msp_id: msp_id.into(),
            signing_key: SigningKey::random(&mut rand::thread_rng()),
        }
    }

    /// Load a 32-byte secret key for `msp_id`.
    pub fn from_bytes(msp_id: impl Into<String>, bytes: [u8; 32]) -> Result<Self, ChannelError> {
        let signing_key = SigningKey::from_bytes((&bytes).into())
            .map_err(|_| ChannelError::Signing("invalid private key".to_string()))?;
        Ok(Self {
            msp_id: msp_id.into(),
            signing_key,
        })
    }

    /// MSP id this signer belongs to.
    pub fn msp_id(&self) -> &str {
        &self.msp_id
    }

    /// SEC1 compressed public key (33 bytes).
    pub fn public_key(&self) -> Vec<u8> {
        self.signing_key.verifying_key().to_sec1_bytes().to_vec()
    }
}

impl SignerIdentity for EcdsaSigner {
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, ChannelError> {
        let signature: Signature = self
            .signing_key
            .try_sign(message)
            .map_err(|e| ChannelError::Signing(e.to_string()))?;
        Ok(signature.to_bytes().to_vec())
    }

    fn serialize(&self) -> Result<Vec<u8>, ChannelError> {
        encode(&SerializedIdentity {
            msp_id: self.msp_id.clone(),
            id_bytes: self.public_key(),
        })
    }
}

/// Verify `signature` over `message` against a serialized identity.
pub fn verify_signature(
    identity: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<SerializedIdentity, ChannelError> {
    let identity: SerializedIdentity = decode(identity)?;
    let verifying_key = VerifyingKey::from_sec1_bytes(&identity.id_bytes)
        .map_err(|_| ChannelError::Signing("invalid public key".to_string()))?;
    let signature = Signature::from_slice(signature)
        .map_err(|_| ChannelError::Signing("invalid signature format".to_string()))?;

    verifying_key
        .verify(message, &signature)
        .map_err(|_| ChannelError::Signing("signature verification failed".to_string()))?;
    Ok(identity)
}
