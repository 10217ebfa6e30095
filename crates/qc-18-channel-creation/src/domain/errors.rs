//! # Domain Errors
//!
//! Error types for Channel Creation.
//!
//! Every step of a creation attempt surfaces exactly one of these to the
//! caller. Only [`ChannelError::Deliver`] is ever retried, and only by the
//! genesis block waiter.

use std::time::Duration;
use thiserror::Error;

/// Hash type alias (32-byte SHA-256)
pub type Hash = [u8; 32];

/// Channel creation error types.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// No channel identifier was supplied for the creation attempt.
    #[error("must supply channel ID")]
    MissingChannelId,

    /// The pre-built channel create transaction file could not be read.
    #[error("channel create configuration tx file not found {0}")]
    ConfigTxFileNotFound(String),

    /// The channel create transaction is structurally or semantically invalid.
    #[error("Invalid channel create transaction : {0}")]
    InvalidCreateTx(String),

    /// The transaction builder failed to produce a creation envelope.
    #[error("error building channel create transaction: {0}")]
    TxBuilder(String),

    /// The signer identity failed to sign or serialize itself.
    #[error("signing failed: {0}")]
    Signing(String),

    /// No connection to the ordering service could be obtained.
    #[error("error getting broadcast client: {0}")]
    BroadcastConnect(String),

    /// The ordering service rejected or failed to receive the transaction.
    #[error("broadcast failed: {0}")]
    Broadcast(String),

    /// A single delivery request failed (transient, retried by the waiter).
    #[error("deliver failed: {0}")]
    Deliver(String),

    /// The genesis block was not observed before the deadline.
    #[error("timeout waiting for channel creation after {waited:?}")]
    Timeout {
        /// Total time spent waiting
        waited: Duration,
    },

    /// The delivery connection could not be re-established after a failure.
    #[error("failed connecting: {0}")]
    Reconnect(String),

    /// Encoding or decoding of a wire structure failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Writing an output file failed.
    #[error("failed to write {path}: {message}")]
    Persist {
        /// Target path
        path: String,
        /// Underlying I/O error
        message: String,
    },

    /// Configuration rejected by validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ChannelError {
    /// Shorthand for an [`ChannelError::InvalidCreateTx`] with a static reason.
    pub fn invalid_tx(reason: impl Into<String>) -> Self {
        Self::InvalidCreateTx(reason.into())
    }

    /// Whether the waiter may retry after this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Deliver(_))
    }
}
