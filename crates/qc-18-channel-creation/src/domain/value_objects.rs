//! # Domain Value Objects
//!
//! Immutable value types for Channel Creation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use super::errors::ChannelError;

/// Name of a channel. Never empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(String);

impl ChannelId {
    /// Create a channel id, rejecting the empty string.
    pub fn new(id: impl Into<String>) -> Result<Self, ChannelError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ChannelError::MissingChannelId);
        }
        Ok(Self(id))
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Default output file name for this channel's genesis block.
    pub fn default_block_file(&self) -> String {
        format!("{}.block", self.0)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ChannelId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Envelope header types understood by the ordering service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum HeaderType {
    /// Opaque message.
    Message = 0,
    /// Full channel configuration.
    Config = 1,
    /// Configuration update (channel creation or modification).
    ConfigUpdate = 2,
    /// Endorsed transaction.
    EndorserTransaction = 3,
    /// Orderer management transaction.
    OrdererTransaction = 4,
    /// Deliver seek request.
    DeliverSeekInfo = 5,
}

impl HeaderType {
    /// Wire value of this header type.
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Parse a wire value.
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Message),
            1 => Some(Self::Config),
            2 => Some(Self::ConfigUpdate),
            3 => Some(Self::EndorserTransaction),
            4 => Some(Self::OrdererTransaction),
            5 => Some(Self::DeliverSeekInfo),
            _ => None,
        }
    }
}

/// Template describing the application side of a new channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelProfile {
    /// Consortium the channel is created under.
    pub consortium: String,
    /// MSP ids of the application organizations.
    pub application_orgs: Vec<String>,
    /// Application capabilities enabled on the channel.
    pub capabilities: Vec<String>,
    /// Policy required to modify the application group.
    pub mod_policy: String,
}

impl ChannelProfile {
    /// Single organization sample profile, used when no transaction file is given.
    pub fn sample_single_org() -> Self {
        Self {
            consortium: "SampleConsortium".to_string(),
            application_orgs: vec!["SampleOrg".to_string()],
            capabilities: vec!["V2_0".to_string()],
            mod_policy: "Admins".to_string(),
        }
    }
}

impl Default for ChannelProfile {
    fn default() -> Self {
        Self::sample_single_org()
    }
}

/// One channel creation attempt.
///
/// Passed by value through the orchestrator; nothing about an attempt is
/// kept in shared state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreateChannelRequest {
    /// Requested channel id. Empty is rejected before any network call.
    pub channel_id: String,
    /// Pre-built channel create transaction to submit instead of the template.
    pub tx_file: Option<PathBuf>,
    /// Where to write the genesis block. Defaults to `<channel>.block`.
    pub output_block: Option<PathBuf>,
    /// Genesis block wait timeout. Defaults to the configured timeout.
    pub timeout: Option<Duration>,
}

impl CreateChannelRequest {
    /// Request for `channel_id` built from the default template.
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            ..Default::default()
        }
    }

    /// Use a pre-built transaction file.
    pub fn with_tx_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.tx_file = Some(path.into());
        self
    }

    /// Override the output block path.
    pub fn with_output_block(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_block = Some(path.into());
        self
    }

    /// Override the genesis block wait timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Summary of a successful creation attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelCreated {
    /// Resolved channel id.
    pub channel_id: ChannelId,
    /// Transaction id of the submitted config update.
    pub tx_id: String,
    /// File the genesis block was written to.
    pub block_path: PathBuf,
    /// Size of the written block in bytes.
    pub bytes_written: usize,
    /// Number of `GetBlock` attempts made while waiting.
    pub deliver_attempts: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_id_rejects_empty() {
        assert!(matches!(
            ChannelId::new(""),
            Err(ChannelError::MissingChannelId)
        ));
    }

    #[test]
    fn test_channel_id_default_block_file() {
        let id = ChannelId::new("mychannel").unwrap();
        assert_eq!(id.default_block_file(), "mychannel.block");
        assert_eq!(id.to_string(), "mychannel");
    }

    #[test]
    fn test_header_type_wire_values() {
        assert_eq!(HeaderType::ConfigUpdate.as_i32(), 2);
        assert_eq!(HeaderType::from_i32(2), Some(HeaderType::ConfigUpdate));
        assert_eq!(HeaderType::from_i32(42), None);
    }

    #[test]
    fn test_request_builder() {
        let req = CreateChannelRequest::new("c1")
            .with_tx_file("c1.tx")
            .with_output_block("out/c1.block")
            .with_timeout(Duration::from_secs(3));
        assert_eq!(req.channel_id, "c1");
        assert_eq!(req.tx_file, Some(PathBuf::from("c1.tx")));
        assert_eq!(req.output_block, Some(PathBuf::from("out/c1.block")));
        assert_eq!(req.timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_sample_profile() {
        let profile = ChannelProfile::default();
        assert_eq!(profile.consortium, "SampleConsortium");
        assert_eq!(profile.application_orgs, vec!["SampleOrg".to_string()]);
    }
}
