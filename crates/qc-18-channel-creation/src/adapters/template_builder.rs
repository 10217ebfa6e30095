//! Template Transaction Builder Adapter
//!
//! Implements `TransactionBuilder` from a [`ChannelProfile`].

use tracing::debug;

use crate::algorithms::make_channel_header;
use crate::domain::{
    encode, ChannelError, ChannelId, ChannelProfile, ConfigGroup, ConfigUpdate,
    ConfigUpdateEnvelope, Envelope, Header, HeaderType, Payload,
};
use crate::ports::TransactionBuilder;

/// Config group holding the application organizations.
pub const APPLICATION_GROUP: &str = "Application";
/// Root value naming the consortium.
pub const CONSORTIUM_KEY: &str = "Consortium";
/// Application value listing enabled capabilities.
pub const CAPABILITIES_KEY: &str = "Capabilities";

/// Builds unsigned channel creation transactions from a profile.
#[derive(Clone, Debug, Default)]
pub struct TemplateTransactionBuilder {
    profile: ChannelProfile,
}

impl TemplateTransactionBuilder {
    /// Builder for `profile`.
    pub fn new(profile: ChannelProfile) -> Self {
        Self { profile }
    }

    /// Profile used for new channels.
    pub fn profile(&self) -> &ChannelProfile {
        &self.profile
    }

    fn check_against_base(&self, base: &ChannelProfile) -> Result<(), ChannelError> {
        if base.consortium != self.profile.consortium {
            return Err(ChannelError::TxBuilder(format!(
                "consortium {} not defined in base profile (has {})",
                self.profile.consortium, base.consortium
            )));
        }
        if let Some(org) = self
            .profile
            .application_orgs
            .iter()
            .find(|org| !base.application_orgs.contains(org))
        {
            return Err(ChannelError::TxBuilder(format!(
                "organization {} is not a member of consortium {}",
                org, base.consortium
            )));
        }
        Ok(())
    }

    /// Read and write sets creating the application group.
    fn config_update(&self, channel_id: &ChannelId) -> Result<ConfigUpdate, ChannelError> {
        let consortium = encode(&self.profile.consortium)?;

        let mut read_app = ConfigGroup::at_version(0);
        let mut write_app = ConfigGroup::at_version(1);
        write_app.mod_policy = self.profile.mod_policy.clone();
        for org in &self.profile.application_orgs {
            read_app.groups.insert(org.clone(), ConfigGroup::at_version(0));
            write_app.groups.insert(org.clone(), ConfigGroup::at_version(0));
        }
        write_app
            .values
            .insert(CAPABILITIES_KEY.to_string(), encode(&self.profile.capabilities)?);

        let mut read_set = ConfigGroup::at_version(0);
        read_set
            .values
            .insert(CONSORTIUM_KEY.to_string(), consortium.clone());
        read_set.groups.insert(APPLICATION_GROUP.to_string(), read_app);

        let mut write_set = ConfigGroup::at_version(0);
        write_set.values.insert(CONSORTIUM_KEY.to_string(), consortium);
        write_set.groups.insert(APPLICATION_GROUP.to_string(), write_app);

        Ok(ConfigUpdate {
            channel_id: channel_id.to_string(),
            read_set,
            write_set,
        })
    }
}

impl TransactionBuilder for TemplateTransactionBuilder {
    fn make_channel_creation_tx(
        &self,
        channel_id: &ChannelId,
        base_profile: Option<&ChannelProfile>,
    ) -> Result<Envelope, ChannelError> {
        if let Some(base) = base_profile {
            self.check_against_base(base)?;
        }

        let config_update = self.config_update(channel_id)?;
        let config_update_env = ConfigUpdateEnvelope {
            config_update: encode(&config_update)?,
            signatures: Vec::new(),
        };

        let channel_header =
            make_channel_header(HeaderType::ConfigUpdate, channel_id.as_str(), String::new(), 0);
        let payload = Payload {
            header: Some(Header {
                channel_header: encode(&channel_header)?,
                signature_header: Vec::new(),
            }),
            data: encode(&config_update_env)?,
        };

        debug!(
            "[qc-18] Built channel create tx for {} ({} orgs)",
            channel_id,
            self.profile.application_orgs.len()
        );

        Ok(Envelope {
            payload: encode(&payload)?,
            signature: Vec::new(),
        })
    }
}
