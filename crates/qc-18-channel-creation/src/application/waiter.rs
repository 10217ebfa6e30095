//! # Genesis Block Waiter
//!
//! Polls the delivery service for block 0 of the new channel until it
//! appears or the deadline passes.
//!
//! ```text
//!              ┌──────── GetBlock failed, reconnected ───────┐
//!              ▼                                             │
//! start ──► Polling ─────────────────────────────────────────┘
//!              │ deadline passed ──────────────► TimedOut
//!              │ GetBlock failed, reconnect failed ──► Failed
//!              │ GetBlock failed permanently ──► Failed
//!              └ GetBlock ok ──────────────────► Succeeded
//! ```
//!
//! The ordering service accepts the creation transaction before the channel
//! exists; the block only becomes available once the transaction is ordered
//! and committed, so early requests are expected to fail.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::{Block, ChannelError, GENESIS_BLOCK_NUMBER};
use crate::ports::{DeliverClient, DeliverClientFactory};

/// Terminal state of a wait.
#[derive(Debug)]
pub enum WaitOutcome {
    /// The genesis block was received.
    Succeeded {
        /// Received block.
        block: Block,
        /// `GetBlock` attempts made, including the successful one.
        attempts: u32,
    },
    /// The deadline passed before the block was received.
    TimedOut {
        /// `GetBlock` attempts made.
        attempts: u32,
        /// Time spent waiting.
        waited: Duration,
    },
    /// A replacement delivery connection could not be opened.
    Failed {
        /// `GetBlock` attempts made.
        attempts: u32,
        /// Connection error.
        error: ChannelError,
    },
}

impl WaitOutcome {
    /// Number of `GetBlock` attempts made.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Succeeded { attempts, .. }
            | Self::TimedOut { attempts, .. }
            | Self::Failed { attempts, .. } => *attempts,
        }
    }

    /// Convert into the received block and attempt count, or the terminal error.
    pub fn into_result(self) -> Result<(Block, u32), ChannelError> {
        match self {
            Self::Succeeded { block, attempts } => Ok((block, attempts)),
            Self::TimedOut { waited, .. } => Err(ChannelError::Timeout { waited }),
            Self::Failed { error, .. } => Err(error),
        }
    }
}

/// Deadline and current connection of an in-progress wait.
#[derive(Debug)]
struct RetryState<C> {
    client: C,
    started: Instant,
    deadline: Instant,
    attempts: u32,
}

#[derive(Debug)]
enum WaitState<C> {
    Polling(RetryState<C>),
    Done(WaitOutcome),
}

/// Polls for block 0 with a deadline and reconnect-on-failure.
#[derive(Debug)]
pub struct GenesisBlockWaiter<'a, F: DeliverClientFactory> {
    factory: &'a F,
    timeout: Duration,
    retry_delay: Duration,
}

impl<'a, F: DeliverClientFactory> GenesisBlockWaiter<'a, F> {
    /// Waiter giving up after `timeout`, pausing `retry_delay` between attempts.
    pub fn new(factory: &'a F, timeout: Duration, retry_delay: Duration) -> Self {
        Self {
            factory,
            timeout,
            retry_delay,
        }
    }

    /// Wait for the genesis block, mapping the terminal state to a result.
    pub async fn wait(&self) -> Result<(Block, u32), ChannelError> {
        self.run().await.into_result()
    }

    /// Drive the state machine to a terminal state.
    pub async fn run(&self) -> WaitOutcome {
        let mut state = self.start().await;
        loop {
            state = match state {
                WaitState::Polling(retry) => self.step(retry).await,
                WaitState::Done(outcome) => return outcome,
            };
        }
    }

    async fn start(&self) -> WaitState<F::Client> {
        let started = Instant::now();
        match self.factory.connect().await {
            Ok(client) => WaitState::Polling(RetryState {
                client,
                started,
                deadline: started + self.timeout,
                attempts: 0,
            }),
            Err(e) => WaitState::Done(WaitOutcome::Failed {
                attempts: 0,
                error: reconnect_error(e),
            }),
        }
    }

    async fn step(&self, mut retry: RetryState<F::Client>) -> WaitState<F::Client> {
        let now = Instant::now();
        if now >= retry.deadline {
            return self.time_out(retry, now).await;
        }

        retry.attempts += 1;
        let remaining = retry.deadline - now;
        let response = tokio::time::timeout(
            remaining,
            retry.client.get_specified_block(GENESIS_BLOCK_NUMBER),
        )
        .await;
        let result = match response {
            Ok(result) => result.and_then(check_genesis),
            Err(_) => return self.time_out(retry, Instant::now()).await,
        };

        match result {
            Ok(block) => {
                close_quietly(&mut retry.client).await;
                info!(
                    attempts = retry.attempts,
                    "[qc-18] Received genesis block"
                );
                WaitState::Done(WaitOutcome::Succeeded {
                    block,
                    attempts: retry.attempts,
                })
            }
            Err(e) if !e.is_transient() => {
                close_quietly(&mut retry.client).await;
                warn!(
                    attempt = retry.attempts,
                    "[qc-18] Genesis block request failed permanently: {}", e
                );
                WaitState::Done(WaitOutcome::Failed {
                    attempts: retry.attempts,
                    error: e,
                })
            }
            Err(e) => {
                debug!(
                    attempt = retry.attempts,
                    "[qc-18] Genesis block not available yet: {}", e
                );
                let now = Instant::now();
                if now >= retry.deadline {
                    return self.time_out(retry, now).await;
                }
                close_quietly(&mut retry.client).await;

                retry.client = match self.factory.connect().await {
                    Ok(client) => client,
                    Err(e) => {
                        warn!("[qc-18] Delivery reconnect failed: {}", e);
                        return WaitState::Done(WaitOutcome::Failed {
                            attempts: retry.attempts,
                            error: reconnect_error(e),
                        });
                    }
                };

                tokio::time::sleep_until((Instant::now() + self.retry_delay).min(retry.deadline))
                    .await;
                WaitState::Polling(retry)
            }
        }
    }

    /// Tear down the connection and stop; no network calls follow.
    async fn time_out(
        &self,
        mut retry: RetryState<F::Client>,
        now: Instant,
    ) -> WaitState<F::Client> {
        close_quietly(&mut retry.client).await;
        warn!(
            attempts = retry.attempts,
            "[qc-18] Timed out waiting for genesis block"
        );
        WaitState::Done(WaitOutcome::TimedOut {
            attempts: retry.attempts,
            waited: now - retry.started,
        })
    }
}

fn check_genesis(block: Block) -> Result<Block, ChannelError> {
    if block.number() != GENESIS_BLOCK_NUMBER {
        return Err(ChannelError::Deliver(format!(
            "expected block {}, got {}",
            GENESIS_BLOCK_NUMBER,
            block.number()
        )));
    }
    Ok(block)
}

fn reconnect_error(e: ChannelError) -> ChannelError {
    match e {
        ChannelError::Reconnect(_) => e,
        other => ChannelError::Reconnect(other.to_string()),
    }
}

async fn close_quietly<C: DeliverClient>(client: &mut C) {
    if let Err(e) = client.close().await {
        warn!("[qc-18] Failed to close delivery connection: {}", e);
    }
}
