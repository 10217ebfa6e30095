//! # Channel Creation Configuration
//!
//! Configuration for the Channel Creation service.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::{ChannelError, ChannelProfile, DEFAULT_RETRY_DELAY_MS, DEFAULT_TIMEOUT_SECS};

/// Channel creation configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelCreationConfig {
    /// How long to wait for the genesis block, in seconds.
    pub timeout_secs: u64,

    /// Pause between genesis block requests, in milliseconds.
    pub retry_delay_ms: u64,

    /// Directory for `<channel>.block` files when the request names no path.
    /// `None` writes to the working directory.
    pub output_dir: Option<PathBuf>,

    /// Profile used to build template transactions.
    pub profile: ChannelProfile,

    /// Profile of the system channel new channels are created from.
    /// When set, template transactions are checked against it.
    #[serde(default)]
    pub base_profile: Option<ChannelProfile>,
}

impl Default for ChannelCreationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            output_dir: None,
            profile: ChannelProfile::sample_single_org(),
            base_profile: None,
        }
    }
}

impl ChannelCreationConfig {
    /// Create a config for testing (short timeouts).
    pub fn for_testing() -> Self {
        Self {
            timeout_secs: 2,
            retry_delay_ms: 10,
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QC_CHANNEL_TIMEOUT_SECS`: Genesis block wait timeout (default: 10)
    /// - `QC_CHANNEL_RETRY_DELAY_MS`: Delay between block requests (default: 200)
    /// - `QC_CHANNEL_OUTPUT_DIR`: Directory for genesis block files (default: unset)
    ///
    /// Unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self {
            timeout_secs: env_or("QC_CHANNEL_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
            retry_delay_ms: env_or("QC_CHANNEL_RETRY_DELAY_MS", DEFAULT_RETRY_DELAY_MS),
            output_dir: env::var("QC_CHANNEL_OUTPUT_DIR")
                .ok()
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
            ..Self::default()
        }
    }

    /// Reject zero timeouts and retry delays.
    pub fn validate(&self) -> Result<(), ChannelError> {
        if self.timeout_secs == 0 {
            return Err(ChannelError::InvalidConfig(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.retry_delay_ms == 0 {
            return Err(ChannelError::InvalidConfig(
                "retry_delay_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Genesis block wait timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Pause between genesis block requests.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
