//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements outbound port traits for channel creation.

mod ecdsa_signer;
mod filesystem;
mod template_builder;

pub use ecdsa_signer::{verify_signature, EcdsaSigner, SerializedIdentity};
pub use filesystem::{
    write_channel_create_tx, write_file, FileBlockSink, BLOCK_FILE_MODE, OUTPUT_DIR_MODE,
    TX_FILE_MODE,
};
pub use template_builder::{
    TemplateTransactionBuilder, APPLICATION_GROUP, CAPABILITIES_KEY, CONSORTIUM_KEY,
};
