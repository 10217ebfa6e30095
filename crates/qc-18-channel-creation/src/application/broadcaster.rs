//! # Broadcaster
//!
//! Submits a signed creation transaction to the ordering service over a
//! connection scoped to the single send.

use tracing::{info, warn};

use crate::domain::{ChannelError, SignedEnvelope};
use crate::ports::{BroadcastClient, BroadcastClientFactory};

/// One-shot submitter. Never retries.
#[derive(Debug)]
pub struct Broadcaster<'a, F: BroadcastClientFactory> {
    factory: &'a F,
}

impl<'a, F: BroadcastClientFactory> Broadcaster<'a, F> {
    /// Broadcaster opening connections through `factory`.
    pub fn new(factory: &'a F) -> Self {
        Self { factory }
    }

    /// Submit `signed` exactly once.
    ///
    /// The connection is closed on every path once it was opened.
    pub async fn send(&self, signed: &SignedEnvelope) -> Result<(), ChannelError> {
        let mut client = self.factory.connect().await.map_err(|e| match e {
            ChannelError::BroadcastConnect(_) => e,
            other => ChannelError::BroadcastConnect(other.to_string()),
        })?;

        let result = client.send(signed.envelope()).await;

        if let Err(e) = client.close().await {
            warn!("[qc-18] Failed to close broadcast connection: {}", e);
        }

        result.map_err(|e| match e {
            ChannelError::Broadcast(_) => e,
            other => ChannelError::Broadcast(other.to_string()),
        })?;

        info!(
            channel_id = %signed.channel_id(),
            tx_id = %signed.tx_id(),
            "[qc-18] Channel create tx broadcast"
        );
        Ok(())
    }
}
