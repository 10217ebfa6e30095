//! # QC-18 Channel Creation
//!
//! Client side of channel creation: submit a signed channel-creation
//! configuration transaction to the ordering service, wait for the new
//! channel's genesis block and write it to disk.
//!
//! **Subsystem ID:** 18
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Flow
//!
//! 1. Validate the channel id (empty ids never reach the network)
//! 2. Assemble the unsigned creation transaction from a template or a file
//! 3. Sanity-check it, countersign the config update and wrap it in a
//!    signed envelope
//! 4. Broadcast it once to the ordering service
//! 5. Poll the delivery service for block 0 until a deadline, reconnecting
//!    after every failed request
//! 6. Write the block to `<channel>.block` or the requested path
//!
//! ## Module Structure
//!
//! ```text
//! qc-18-channel-creation/
//! ├── domain/          # ChannelId, envelopes, blocks, codec, errors, invariants
//! ├── algorithms/      # Envelope assembly, sanity check, signing helpers
//! ├── ports/           # API trait (inbound) + capability traits (outbound)
//! ├── adapters/        # Template tx builder, ECDSA signer, filesystem writers
//! ├── application/     # Broadcaster, GenesisBlockWaiter, ChannelCreationService
//! └── config.rs        # ChannelCreationConfig
//! ```
//!
//! Logging goes through `tracing`; installing a subscriber is left to the
//! host binary.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

/// Test fixtures (StaticSigner, envelope and block builders)
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-exports
pub use adapters::{
    verify_signature, write_channel_create_tx, EcdsaSigner, FileBlockSink, SerializedIdentity,
    TemplateTransactionBuilder,
};
pub use algorithms::{assemble, create_from_config_tx, create_from_defaults, sanity_check_and_sign};
pub use application::{Broadcaster, ChannelCreationService, GenesisBlockWaiter, WaitOutcome};
pub use config::ChannelCreationConfig;
pub use domain::{
    decode, encode, Block, BlockHeader, ChannelCreated, ChannelError, ChannelHeader, ChannelId,
    ChannelProfile, ConfigUpdate, ConfigUpdateEnvelope, CreateChannelRequest, Envelope, Hash,
    HeaderType, Payload, SignedEnvelope, GENESIS_BLOCK_NUMBER,
};
pub use ports::{
    BlockSink, BroadcastClient, BroadcastClientFactory, ChannelCreationApi, DeliverClient,
    DeliverClientFactory, SignerIdentity, TransactionBuilder,
    MockBlockSink, MockBroadcastService, MockDeliverService, MockTransactionBuilder,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
