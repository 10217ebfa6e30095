//! # Outbound Ports
//!
//! Capabilities the channel creation flow depends on: transaction building,
//! signing, the ordering (broadcast) and delivery services, and block
//! persistence.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{Block, ChannelError, ChannelId, ChannelProfile, Envelope};

/// Builds unsigned channel creation envelopes - outbound port.
pub trait TransactionBuilder: Send + Sync {
    /// Build an unsigned CONFIG_UPDATE envelope creating `channel_id`.
    ///
    /// `base_profile` describes the system channel context the new channel
    /// is derived from, when known.
    fn make_channel_creation_tx(
        &self,
        channel_id: &ChannelId,
        base_profile: Option<&ChannelProfile>,
    ) -> Result<Envelope, ChannelError>;
}

/// Private signing capability plus the identity it signs as - outbound port.
pub trait SignerIdentity: Send + Sync {
    /// Sign `message`.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, ChannelError>;

    /// Serialized identity placed in signature headers.
    fn serialize(&self) -> Result<Vec<u8>, ChannelError>;
}

/// Connection to the ordering service - outbound port.
#[async_trait]
pub trait BroadcastClient: Send {
    /// Submit one envelope.
    async fn send(&mut self, envelope: &Envelope) -> Result<(), ChannelError>;

    /// Release the connection.
    async fn close(&mut self) -> Result<(), ChannelError>;
}

/// Opens ordering service connections - outbound port.
#[async_trait]
pub trait BroadcastClientFactory: Send + Sync {
    /// Connection type produced.
    type Client: BroadcastClient;

    /// Open a new connection.
    async fn connect(&self) -> Result<Self::Client, ChannelError>;
}

/// Connection to the delivery service - outbound port.
#[async_trait]
pub trait DeliverClient: Send {
    /// Fetch the block at `number` of the target channel.
    async fn get_specified_block(&mut self, number: u64) -> Result<Block, ChannelError>;

    /// Release the connection.
    async fn close(&mut self) -> Result<(), ChannelError>;
}

/// Opens delivery service connections, re-creatable on demand - outbound port.
#[async_trait]
pub trait DeliverClientFactory: Send + Sync {
    /// Connection type produced.
    type Client: DeliverClient;

    /// Open a new connection.
    async fn connect(&self) -> Result<Self::Client, ChannelError>;
}

/// Durable destination for the genesis block - outbound port.
pub trait BlockSink: Send + Sync {
    /// Persist the encoded block at `path`.
    fn write_block(&self, path: &Path, bytes: &[u8]) -> Result<(), ChannelError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Mock transaction builder returning a fixed envelope or error.
#[derive(Clone, Debug, Default)]
pub struct MockTransactionBuilder {
    /// Envelope to return.
    pub envelope: Envelope,
    /// Should return errors?
    pub should_fail: bool,
    calls: Arc<Mutex<usize>>,
}

impl MockTransactionBuilder {
    /// Builder that always returns `envelope`.
    pub fn returning(envelope: Envelope) -> Self {
        Self {
            envelope,
            ..Default::default()
        }
    }

    /// Builder that always fails.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    /// Number of build calls so far.
    pub fn call_count(&self) -> usize {
        *self.calls.lock()
    }
}

impl TransactionBuilder for MockTransactionBuilder {
    fn make_channel_creation_tx(
        &self,
        _channel_id: &ChannelId,
        _base_profile: Option<&ChannelProfile>,
    ) -> Result<Envelope, ChannelError> {
        *self.calls.lock() += 1;
        if self.should_fail {
            return Err(ChannelError::TxBuilder("Mock failure".to_string()));
        }
        Ok(self.envelope.clone())
    }
}

#[derive(Debug, Default)]
struct BroadcastLedger {
    sent: Vec<Envelope>,
    connects: usize,
    closes: usize,
    refuse_connections: bool,
    reject_sends: bool,
}

/// Mock ordering service recording every submitted envelope.
#[derive(Clone, Debug, Default)]
pub struct MockBroadcastService {
    ledger: Arc<Mutex<BroadcastLedger>>,
}

impl MockBroadcastService {
    /// Ordering service accepting everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ordering service that cannot be reached.
    pub fn unreachable() -> Self {
        let service = Self::default();
        service.ledger.lock().refuse_connections = true;
        service
    }

    /// Ordering service that rejects every submission.
    pub fn rejecting() -> Self {
        let service = Self::default();
        service.ledger.lock().reject_sends = true;
        service
    }

    /// Envelopes successfully submitted.
    pub fn sent(&self) -> Vec<Envelope> {
        self.ledger.lock().sent.clone()
    }

    /// Connections opened.
    pub fn connect_count(&self) -> usize {
        self.ledger.lock().connects
    }

    /// Connections closed.
    pub fn close_count(&self) -> usize {
        self.ledger.lock().closes
    }
}

/// Connection handed out by [`MockBroadcastService`].
#[derive(Debug)]
pub struct MockBroadcastClient {
    ledger: Arc<Mutex<BroadcastLedger>>,
}

#[async_trait]
impl BroadcastClientFactory for MockBroadcastService {
    type Client = MockBroadcastClient;

    async fn connect(&self) -> Result<Self::Client, ChannelError> {
        let mut ledger = self.ledger.lock();
        if ledger.refuse_connections {
            return Err(ChannelError::BroadcastConnect(
                "orderer unreachable".to_string(),
            ));
        }
        ledger.connects += 1;
        Ok(MockBroadcastClient {
            ledger: Arc::clone(&self.ledger),
        })
    }
}

#[async_trait]
impl BroadcastClient for MockBroadcastClient {
    async fn send(&mut self, envelope: &Envelope) -> Result<(), ChannelError> {
        let mut ledger = self.ledger.lock();
        if ledger.reject_sends {
            return Err(ChannelError::Broadcast("BAD_REQUEST".to_string()));
        }
        ledger.sent.push(envelope.clone());
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        self.ledger.lock().closes += 1;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct DeliverScript {
    block: Option<Block>,
    failures_remaining: usize,
    always_fail: bool,
    corrupt: bool,
    connections_allowed: Option<usize>,
    response_delay: Option<Duration>,
    connects: usize,
    closes: usize,
    attempts: usize,
}

/// Mock delivery service with a scripted sequence of failures.
#[derive(Clone, Debug, Default)]
pub struct MockDeliverService {
    script: Arc<Mutex<DeliverScript>>,
}

impl MockDeliverService {
    /// Delivery service that serves `block` on the first request.
    pub fn with_block(block: Block) -> Self {
        let service = Self::default();
        service.script.lock().block = Some(block);
        service
    }

    /// Delivery service whose every request fails.
    pub fn always_failing() -> Self {
        let service = Self::default();
        service.script.lock().always_fail = true;
        service
    }

    /// Delivery service whose every response fails to decode.
    pub fn serving_corrupt_blocks() -> Self {
        let service = Self::default();
        service.script.lock().corrupt = true;
        service
    }

    /// Fail the first `count` requests with block-not-found.
    pub fn failing_times(self, count: usize) -> Self {
        self.script.lock().failures_remaining = count;
        self
    }

    /// Allow only `count` successful connections in total.
    pub fn refuse_connections_after(self, count: usize) -> Self {
        self.script.lock().connections_allowed = Some(count);
        self
    }

    /// Delay every response by `delay`.
    pub fn with_response_delay(self, delay: Duration) -> Self {
        self.script.lock().response_delay = Some(delay);
        self
    }

    /// Connections opened.
    pub fn connect_count(&self) -> usize {
        self.script.lock().connects
    }

    /// Connections closed.
    pub fn close_count(&self) -> usize {
        self.script.lock().closes
    }

    /// Block requests received.
    pub fn attempt_count(&self) -> usize {
        self.script.lock().attempts
    }
}

/// Connection handed out by [`MockDeliverService`].
#[derive(Debug)]
pub struct MockDeliverClient {
    script: Arc<Mutex<DeliverScript>>,
}

#[async_trait]
impl DeliverClientFactory for MockDeliverService {
    type Client = MockDeliverClient;

    async fn connect(&self) -> Result<Self::Client, ChannelError> {
        let mut script = self.script.lock();
        if let Some(allowed) = script.connections_allowed {
            if script.connects >= allowed {
                return Err(ChannelError::Reconnect("connection refused".to_string()));
            }
        }
        script.connects += 1;
        Ok(MockDeliverClient {
            script: Arc::clone(&self.script),
        })
    }
}

#[async_trait]
impl DeliverClient for MockDeliverClient {
    async fn get_specified_block(&mut self, number: u64) -> Result<Block, ChannelError> {
        let delay = {
            let mut script = self.script.lock();
            script.attempts += 1;
            script.response_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut script = self.script.lock();
        if script.corrupt {
            return Err(ChannelError::Serialization(
                "unexpected end of block data".to_string(),
            ));
        }
        if script.always_fail {
            return Err(ChannelError::Deliver(format!("block {} not found", number)));
        }
        if script.failures_remaining > 0 {
            script.failures_remaining -= 1;
            return Err(ChannelError::Deliver(format!("block {} not found", number)));
        }
        match &script.block {
            Some(block) if block.number() == number => Ok(block.clone()),
            _ => Err(ChannelError::Deliver(format!("block {} not found", number))),
        }
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        self.script.lock().closes += 1;
        Ok(())
    }
}

/// Mock block sink keeping writes in memory.
#[derive(Clone, Debug, Default)]
pub struct MockBlockSink {
    writes: Arc<Mutex<Vec<(PathBuf, Vec<u8>)>>>,
    /// Should return errors?
    pub should_fail: bool,
}

impl MockBlockSink {
    /// Sink accepting every write.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `(path, bytes)` written so far.
    pub fn writes(&self) -> Vec<(PathBuf, Vec<u8>)> {
        self.writes.lock().clone()
    }
}

impl BlockSink for MockBlockSink {
    fn write_block(&self, path: &Path, bytes: &[u8]) -> Result<(), ChannelError> {
        if self.should_fail {
            return Err(ChannelError::Persist {
                path: path.display().to_string(),
                message: "Mock failure".to_string(),
            });
        }
        self.writes.lock().push((path.to_path_buf(), bytes.to_vec()));
        Ok(())
    }
}
