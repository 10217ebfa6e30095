//! # Inbound Ports
//!
//! API trait defining what the Channel Creation subsystem can do.

use async_trait::async_trait;

use crate::domain::{ChannelCreated, ChannelError, CreateChannelRequest};

/// Channel Creation API - inbound port.
#[async_trait]
pub trait ChannelCreationApi: Send + Sync {
    /// Build, sign and broadcast a channel creation transaction, wait for
    /// the channel's genesis block and persist it.
    ///
    /// Returns one terminal error per attempt; nothing is retried across
    /// steps.
    async fn create_channel(
        &self,
        request: CreateChannelRequest,
    ) -> Result<ChannelCreated, ChannelError>;
}
