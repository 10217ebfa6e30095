//! # Domain Module
//!
//! Core domain types for Channel Creation.

pub mod codec;
pub mod entities;
pub mod errors;
pub mod invariants;
pub mod value_objects;

pub use codec::{decode, encode};
pub use entities::*;
pub use errors::*;
pub use invariants::*;
pub use value_objects::*;
