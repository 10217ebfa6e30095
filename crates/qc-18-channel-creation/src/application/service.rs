//! # Channel Creation Service
//!
//! Application service running one channel creation attempt end to end:
//!
//! ```text
//! validate id → assemble tx → sanity check + sign → broadcast
//!             → wait for block 0 → persist block
//! ```
//!
//! Every step returns one terminal error. Only the genesis block wait
//! retries, and only within its deadline.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};

use crate::adapters::{FileBlockSink, TemplateTransactionBuilder};
use crate::algorithms::{assemble, sanity_check_and_sign};
use crate::application::{Broadcaster, GenesisBlockWaiter};
use crate::config::ChannelCreationConfig;
use crate::domain::{encode, ChannelCreated, ChannelError, ChannelId, CreateChannelRequest};
use crate::ports::{
    BlockSink, BroadcastClientFactory, ChannelCreationApi, DeliverClientFactory, SignerIdentity,
    TransactionBuilder,
};

/// Channel Creation Service - orchestrates a creation attempt.
pub struct ChannelCreationService<B: BroadcastClientFactory, D: DeliverClientFactory> {
    /// Configuration.
    config: ChannelCreationConfig,
    /// Template transaction source.
    builder: Arc<dyn TransactionBuilder>,
    /// Identity signing the config update and the envelope.
    signer: Arc<dyn SignerIdentity>,
    /// Ordering service connections.
    broadcast: B,
    /// Delivery service connections.
    deliver: D,
    /// Genesis block destination.
    sink: Arc<dyn BlockSink>,
}

impl<B: BroadcastClientFactory, D: DeliverClientFactory> ChannelCreationService<B, D> {
    /// Create a new channel creation service.
    pub fn new(
        config: ChannelCreationConfig,
        builder: Arc<dyn TransactionBuilder>,
        signer: Arc<dyn SignerIdentity>,
        broadcast: B,
        deliver: D,
        sink: Arc<dyn BlockSink>,
    ) -> Self {
        Self {
            config,
            builder,
            signer,
            broadcast,
            deliver,
            sink,
        }
    }

    /// Service building template transactions from `config.profile` and
    /// writing blocks to the local filesystem.
    pub fn with_template(
        config: ChannelCreationConfig,
        signer: Arc<dyn SignerIdentity>,
        broadcast: B,
        deliver: D,
    ) -> Self {
        let builder = Arc::new(TemplateTransactionBuilder::new(config.profile.clone()));
        Self::new(
            config,
            builder,
            signer,
            broadcast,
            deliver,
            Arc::new(FileBlockSink::new()),
        )
    }

    /// Service configuration.
    pub fn config(&self) -> &ChannelCreationConfig {
        &self.config
    }

    /// Run one creation attempt.
    #[instrument(skip(self, request), fields(channel_id = %request.channel_id))]
    pub async fn create(
        &self,
        request: CreateChannelRequest,
    ) -> Result<ChannelCreated, ChannelError> {
        let channel_id = ChannelId::new(request.channel_id.as_str())?;
        self.config.validate()?;
        let timeout = self.resolve_timeout(request.timeout)?;

        let envelope = assemble(
            self.builder.as_ref(),
            &channel_id,
            request.tx_file.as_deref(),
            self.config.base_profile.as_ref(),
        )?;
        let signed = sanity_check_and_sign(&envelope, Some(&channel_id), self.signer.as_ref())?;

        Broadcaster::new(&self.broadcast).send(&signed).await?;

        let waiter = GenesisBlockWaiter::new(&self.deliver, timeout, self.config.retry_delay());
        let (block, deliver_attempts) = waiter.wait().await.map_err(|e| {
            error!("[qc-18] Genesis block wait failed: {}", e);
            e
        })?;

        let bytes = encode(&block)?;
        let block_path = self.block_path(&channel_id, request.output_block);
        self.sink.write_block(&block_path, &bytes)?;

        info!(
            tx_id = %signed.tx_id(),
            attempts = deliver_attempts,
            "[qc-18] ✓ Channel created, genesis block at {}",
            block_path.display()
        );

        Ok(ChannelCreated {
            channel_id,
            tx_id: signed.tx_id().to_string(),
            block_path,
            bytes_written: bytes.len(),
            deliver_attempts,
        })
    }

    fn resolve_timeout(&self, requested: Option<Duration>) -> Result<Duration, ChannelError> {
        match requested {
            Some(timeout) if timeout.is_zero() => Err(ChannelError::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            )),
            Some(timeout) => Ok(timeout),
            None => Ok(self.config.timeout()),
        }
    }

    fn block_path(&self, channel_id: &ChannelId, requested: Option<PathBuf>) -> PathBuf {
        requested.unwrap_or_else(|| match &self.config.output_dir {
            Some(dir) => dir.join(channel_id.default_block_file()),
            None => PathBuf::from(channel_id.default_block_file()),
        })
    }
}

#[async_trait]
impl<B: BroadcastClientFactory, D: DeliverClientFactory> ChannelCreationApi
    for ChannelCreationService<B, D>
{
    async fn create_channel(
        &self,
        request: CreateChannelRequest,
    ) -> Result<ChannelCreated, ChannelError> {
        self.create(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{decode, Block, HeaderType};
    use crate::ports::{
        MockBlockSink, MockBroadcastService, MockDeliverService, MockTransactionBuilder,
    };
    use crate::test_utils::{make_create_tx, make_genesis_block, StaticSigner};
    use std::path::Path;

    struct Harness {
        broadcast: MockBroadcastService,
        deliver: MockDeliverService,
        sink: MockBlockSink,
        builder: Arc<MockTransactionBuilder>,
        signer: Arc<StaticSigner>,
    }

    impl Harness {
        fn new(channel_id: &str, deliver: MockDeliverService) -> Self {
            Self {
                broadcast: MockBroadcastService::new(),
                deliver,
                sink: MockBlockSink::new(),
                builder: Arc::new(MockTransactionBuilder::returning(make_create_tx(
                    HeaderType::ConfigUpdate,
                    channel_id,
                ))),
                signer: Arc::new(StaticSigner::default()),
            }
        }

        fn service(
            &self,
            config: ChannelCreationConfig,
        ) -> ChannelCreationService<MockBroadcastService, MockDeliverService> {
            ChannelCreationService::new(
                config,
                self.builder.clone(),
                self.signer.clone(),
                self.broadcast.clone(),
                self.deliver.clone(),
                Arc::new(self.sink.clone()),
            )
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_channel_happy_path() {
        let harness = Harness::new(
            "mychannel",
            MockDeliverService::with_block(make_genesis_block("mychannel")).failing_times(2),
        );
        let service = harness.service(ChannelCreationConfig::default());

        let created = service
            .create_channel(
                CreateChannelRequest::new("mychannel").with_timeout(Duration::from_secs(5)),
            )
            .await
            .unwrap();

        assert_eq!(created.channel_id.as_str(), "mychannel");
        assert_eq!(created.block_path, Path::new("mychannel.block"));
        assert_eq!(created.deliver_attempts, 3);
        assert_eq!(harness.broadcast.sent().len(), 1);

        let writes = harness.sink.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].1.len(), created.bytes_written);
        let block: Block = decode(&writes[0].1).unwrap();
        assert_eq!(block.number(), 0);
    }

    #[tokio::test]
    async fn test_empty_channel_id_makes_no_calls() {
        let harness = Harness::new("c", MockDeliverService::always_failing());
        let service = harness.service(ChannelCreationConfig::default());

        let err = service
            .create_channel(CreateChannelRequest::new(""))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "must supply channel ID");
        assert_eq!(harness.builder.call_count(), 0);
        assert_eq!(harness.broadcast.connect_count(), 0);
        assert_eq!(harness.deliver.connect_count(), 0);
        assert!(harness.sink.writes().is_empty());
    }

    #[tokio::test]
    async fn test_builder_failure_stops_before_broadcast() {
        let mut harness = Harness::new("c", MockDeliverService::always_failing());
        harness.builder = Arc::new(MockTransactionBuilder::failing());
        let service = harness.service(ChannelCreationConfig::default());

        let err = service
            .create_channel(CreateChannelRequest::new("c"))
            .await
            .unwrap_err();

        assert!(matches!(err, ChannelError::TxBuilder(_)));
        assert_eq!(harness.broadcast.connect_count(), 0);
    }

    #[tokio::test]
    async fn test_mismatched_builder_output_never_signed() {
        let harness = Harness::new("other", MockDeliverService::always_failing());
        let service = harness.service(ChannelCreationConfig::default());

        let err = service
            .create_channel(CreateChannelRequest::new("mine"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("mismatched channel ID other != mine"));
        assert_eq!(harness.signer.sign_count(), 0);
        assert_eq!(harness.broadcast.connect_count(), 0);
    }

    #[tokio::test]
    async fn test_signing_failure_stops_before_broadcast() {
        let mut harness = Harness::new("c", MockDeliverService::always_failing());
        harness.signer = Arc::new(StaticSigner::failing());
        let service = harness.service(ChannelCreationConfig::default());

        let err = service
            .create_channel(CreateChannelRequest::new("c"))
            .await
            .unwrap_err();

        assert!(matches!(err, ChannelError::Signing(_)));
        assert_eq!(harness.broadcast.connect_count(), 0);
    }

    #[tokio::test]
    async fn test_broadcast_rejection_skips_wait() {
        let mut harness = Harness::new(
            "c",
            MockDeliverService::with_block(make_genesis_block("c")),
        );
        harness.broadcast = MockBroadcastService::rejecting();
        let service = harness.service(ChannelCreationConfig::default());

        let err = service
            .create_channel(CreateChannelRequest::new("c"))
            .await
            .unwrap_err();

        assert!(matches!(err, ChannelError::Broadcast(_)));
        assert_eq!(harness.deliver.connect_count(), 0);
        assert!(harness.sink.writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_writes_nothing() {
        let harness = Harness::new("c", MockDeliverService::always_failing());
        let service = harness.service(ChannelCreationConfig::for_testing());

        let err = service
            .create_channel(CreateChannelRequest::new("c").with_timeout(Duration::from_secs(1)))
            .await
            .unwrap_err();

        assert!(matches!(err, ChannelError::Timeout { .. }));
        assert!(harness.sink.writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_failure_writes_nothing() {
        let harness = Harness::new(
            "c",
            MockDeliverService::always_failing().refuse_connections_after(1),
        );
        let service = harness.service(ChannelCreationConfig::for_testing());

        let err = service
            .create_channel(CreateChannelRequest::new("c"))
            .await
            .unwrap_err();

        assert!(matches!(err, ChannelError::Reconnect(_)));
        assert!(harness.sink.writes().is_empty());
    }

    #[tokio::test]
    async fn test_persist_failure_is_reported() {
        let mut harness = Harness::new("c", MockDeliverService::with_block(make_genesis_block("c")));
        harness.sink.should_fail = true;
        let service = harness.service(ChannelCreationConfig::default());

        let err = service
            .create_channel(CreateChannelRequest::new("c"))
            .await
            .unwrap_err();

        assert!(matches!(err, ChannelError::Persist { .. }));
    }

    #[tokio::test]
    async fn test_output_path_resolution() {
        let harness = Harness::new("c", MockDeliverService::with_block(make_genesis_block("c")));
        let config = ChannelCreationConfig {
            output_dir: Some(PathBuf::from("/var/blocks")),
            ..Default::default()
        };
        let service = harness.service(config);

        let created = service
            .create_channel(CreateChannelRequest::new("c"))
            .await
            .unwrap();
        assert_eq!(created.block_path, Path::new("/var/blocks/c.block"));

        let created = service
            .create_channel(CreateChannelRequest::new("c").with_output_block("custom.block"))
            .await
            .unwrap();
        assert_eq!(created.block_path, Path::new("custom.block"));
    }

    #[tokio::test]
    async fn test_zero_timeout_rejected_before_network() {
        let harness = Harness::new("c", MockDeliverService::always_failing());
        let service = harness.service(ChannelCreationConfig::default());

        let err = service
            .create_channel(CreateChannelRequest::new("c").with_timeout(Duration::ZERO))
            .await
            .unwrap_err();

        assert!(matches!(err, ChannelError::InvalidConfig(_)));
        assert_eq!(harness.broadcast.connect_count(), 0);
    }
}
