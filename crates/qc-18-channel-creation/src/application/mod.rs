//! # Application Module
//!
//! Application services orchestrating the domain and outbound ports.

pub mod broadcaster;
pub mod service;
pub mod waiter;

pub use broadcaster::Broadcaster;
pub use service::ChannelCreationService;
pub use waiter::{GenesisBlockWaiter, WaitOutcome};
