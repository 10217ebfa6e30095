//! # Algorithms Module
//!
//! Creation transaction assembly, validation and signing.

pub mod assembler;
pub mod signing;

pub use assembler::{assemble, create_from_config_tx, create_from_defaults, sanity_check_and_sign};
pub use signing::{
    compute_tx_id, create_signed_envelope, current_timestamp, make_channel_header,
    new_signature_header,
};
