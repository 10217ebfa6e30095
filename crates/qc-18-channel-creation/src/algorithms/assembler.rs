//! # Transaction Assembly
//!
//! Produces the channel creation transaction and signs it.
//!
//! # Steps
//! 1. Build from the template profile, or read a pre-built envelope file
//! 2. Sanity check header type, channel id and config update structure
//! 3. Append the local signature to the config update
//! 4. Re-wrap in a signed envelope addressed to the resolved channel id

use std::path::Path;
use tracing::{debug, info};

use crate::algorithms::signing::{create_signed_envelope, new_signature_header};
use crate::domain::{
    decode, encode, invariant_channel_id_resolved, invariant_config_update_type, ChannelError,
    ChannelHeader, ChannelId, ChannelProfile, ConfigSignature, ConfigUpdateEnvelope, Envelope,
    HeaderType, Payload, SignedEnvelope,
};
use crate::ports::{SignerIdentity, TransactionBuilder};

/// Produce the unsigned creation envelope for `channel_id`.
///
/// Reads `tx_file` when given, otherwise asks `builder` for the template
/// transaction. An empty path counts as not given.
pub fn assemble(
    builder: &dyn TransactionBuilder,
    channel_id: &ChannelId,
    tx_file: Option<&Path>,
    base_profile: Option<&ChannelProfile>,
) -> Result<Envelope, ChannelError> {
    match tx_file.filter(|path| !path.as_os_str().is_empty()) {
        Some(path) => create_from_config_tx(path),
        None => create_from_defaults(builder, channel_id, base_profile),
    }
}

/// Template transaction for `channel_id`.
pub fn create_from_defaults(
    builder: &dyn TransactionBuilder,
    channel_id: &ChannelId,
    base_profile: Option<&ChannelProfile>,
) -> Result<Envelope, ChannelError> {
    info!("[qc-18] Building default channel create tx for {}", channel_id);
    builder
        .make_channel_creation_tx(channel_id, base_profile)
        .map_err(|e| match e {
            ChannelError::TxBuilder(_) => e,
            other => ChannelError::TxBuilder(other.to_string()),
        })
}

/// Pre-built transaction read from `path`.
pub fn create_from_config_tx(path: &Path) -> Result<Envelope, ChannelError> {
    info!("[qc-18] Reading channel create tx from {}", path.display());
    let bytes = std::fs::read(path)
        .map_err(|e| ChannelError::ConfigTxFileNotFound(format!("{}: {}", path.display(), e)))?;

    decode(&bytes).map_err(|e| ChannelError::InvalidCreateTx(format!("bad envelope: {}", e)))
}

/// Validate `envelope` as a channel creation transaction and sign it.
///
/// With `expected == None` the channel id embedded in the transaction is
/// adopted. Nothing is signed unless every check passes.
pub fn sanity_check_and_sign(
    envelope: &Envelope,
    expected: Option<&ChannelId>,
    signer: &dyn SignerIdentity,
) -> Result<SignedEnvelope, ChannelError> {
    let payload: Payload =
        decode(&envelope.payload).map_err(|_| ChannelError::invalid_tx("bad payload"))?;

    let header = match &payload.header {
        Some(header) if !header.channel_header.is_empty() => header,
        _ => return Err(ChannelError::invalid_tx("bad header")),
    };

    let channel_header: ChannelHeader = decode(&header.channel_header)
        .map_err(|_| ChannelError::invalid_tx("could not unmarshall channel header"))?;

    invariant_config_update_type(&channel_header)?;
    let channel_id = invariant_channel_id_resolved(&channel_header, expected)?;

    let mut config_update_env: ConfigUpdateEnvelope = decode(&payload.data)
        .map_err(|_| ChannelError::invalid_tx("Bad config update env"))?;

    let signature_header = encode(&new_signature_header(signer)?)?;
    let mut signed_bytes =
        Vec::with_capacity(signature_header.len() + config_update_env.config_update.len());
    signed_bytes.extend_from_slice(&signature_header);
    signed_bytes.extend_from_slice(&config_update_env.config_update);

    let signature = signer.sign(&signed_bytes)?;
    config_update_env.signatures.push(ConfigSignature {
        signature_header,
        signature,
    });

    let (envelope, tx_id) = create_signed_envelope(
        HeaderType::ConfigUpdate,
        &channel_id,
        signer,
        &config_update_env,
        0,
    )?;
    debug!(
        channel_id = %channel_id,
        tx_id = %tx_id,
        signatures = config_update_env.signatures.len(),
        "[qc-18] Channel create tx signed"
    );

    Ok(SignedEnvelope::new(envelope, channel_id, tx_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::TemplateTransactionBuilder;
    use crate::domain::{Header, SignatureHeader};
    use crate::ports::MockTransactionBuilder;
    use crate::test_utils::{make_create_tx, StaticSigner};

    fn channel(id: &str) -> ChannelId {
        ChannelId::new(id).unwrap()
    }

    fn inner_config_update_env(signed: &SignedEnvelope) -> ConfigUpdateEnvelope {
        let payload: Payload = decode(&signed.envelope().payload).unwrap();
        decode(&payload.data).unwrap()
    }

    #[test]
    fn test_default_tx_round_trips_through_sanity_check() {
        let builder = TemplateTransactionBuilder::default();
        let signer = StaticSigner::default();
        let id = channel("mychannel");

        let unsigned = assemble(&builder, &id, None, None).unwrap();
        let signed = sanity_check_and_sign(&unsigned, Some(&id), &signer).unwrap();

        assert_eq!(signed.channel_id(), &id);
        assert_eq!(inner_config_update_env(&signed).signatures.len(), 1);
    }

    #[test]
    fn test_signature_covers_header_and_config_update() {
        let builder = TemplateTransactionBuilder::default();
        let signer = StaticSigner::default();
        let id = channel("covered");

        let unsigned = assemble(&builder, &id, None, None).unwrap();
        let signed = sanity_check_and_sign(&unsigned, Some(&id), &signer).unwrap();
        let env = inner_config_update_env(&signed);
        let sig = &env.signatures[0];

        let mut expected = sig.signature_header.clone();
        expected.extend_from_slice(&env.config_update);
        assert_eq!(sig.signature, StaticSigner::expected_signature(&expected));

        let header: SignatureHeader = decode(&sig.signature_header).unwrap();
        assert_eq!(header.creator, b"static-signer".to_vec());
    }

    #[test]
    fn test_missing_file_is_config_tx_not_found() {
        let builder = MockTransactionBuilder::failing();
        let result = assemble(
            &builder,
            &channel("c"),
            Some(Path::new("/nonexistent/dir/c.tx")),
            None,
        );
        assert!(matches!(result, Err(ChannelError::ConfigTxFileNotFound(_))));
        assert_eq!(builder.call_count(), 0);
    }

    #[test]
    fn test_empty_tx_file_path_builds_default() {
        let builder = MockTransactionBuilder::returning(make_create_tx(
            HeaderType::ConfigUpdate,
            "c",
        ));
        let envelope = assemble(&builder, &channel("c"), Some(Path::new("")), None).unwrap();

        assert_eq!(builder.call_count(), 1);
        assert_eq!(envelope, builder.envelope);
    }

    #[test]
    fn test_garbage_file_is_invalid_create_tx() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.tx");
        std::fs::write(&path, [0xFFu8; 5]).unwrap();

        let result = create_from_config_tx(&path);
        assert!(matches!(result, Err(ChannelError::InvalidCreateTx(_))));
    }

    #[test]
    fn test_builder_failure_propagates() {
        let builder = MockTransactionBuilder::failing();
        let result = assemble(&builder, &channel("c"), None, None);
        assert!(matches!(result, Err(ChannelError::TxBuilder(_))));
    }

    #[test]
    fn test_mismatched_channel_id_rejected() {
        let signer = StaticSigner::default();
        let tx = make_create_tx(HeaderType::ConfigUpdate, "fromfile");

        let err = sanity_check_and_sign(&tx, Some(&channel("cli")), &signer).unwrap_err();
        assert!(err.to_string().contains("mismatched channel ID"));
        assert_eq!(signer.sign_count(), 0);
    }

    #[test]
    fn test_absent_channel_id_adopts_payload() {
        let signer = StaticSigner::default();
        let tx = make_create_tx(HeaderType::ConfigUpdate, "fromfile");

        let signed = sanity_check_and_sign(&tx, None, &signer).unwrap();
        assert_eq!(signed.channel_id().as_str(), "fromfile");
    }

    #[test]
    fn test_wrong_type_never_signs() {
        let signer = StaticSigner::default();
        let tx = make_create_tx(HeaderType::EndorserTransaction, "c");

        let err = sanity_check_and_sign(&tx, None, &signer).unwrap_err();
        assert!(err.to_string().contains("bad type"));
        assert_eq!(signer.sign_count(), 0);
    }

    #[test]
    fn test_empty_channel_id_never_signs() {
        let signer = StaticSigner::default();
        let tx = make_create_tx(HeaderType::ConfigUpdate, "");

        let err = sanity_check_and_sign(&tx, Some(&channel("c")), &signer).unwrap_err();
        assert!(err.to_string().contains("empty channel id"));
        assert_eq!(signer.sign_count(), 0);
    }

    #[test]
    fn test_missing_header_never_signs() {
        let signer = StaticSigner::default();
        let payload = Payload {
            header: None,
            data: encode(&ConfigUpdateEnvelope::default()).unwrap(),
        };
        let tx = Envelope {
            payload: encode(&payload).unwrap(),
            signature: Vec::new(),
        };

        let err = sanity_check_and_sign(&tx, None, &signer).unwrap_err();
        assert!(err.to_string().contains("bad header"));
        assert_eq!(signer.sign_count(), 0);
    }

    #[test]
    fn test_empty_channel_header_is_bad_header() {
        let signer = StaticSigner::default();
        let payload = Payload {
            header: Some(Header::default()),
            data: Vec::new(),
        };
        let tx = Envelope {
            payload: encode(&payload).unwrap(),
            signature: Vec::new(),
        };

        let err = sanity_check_and_sign(&tx, None, &signer).unwrap_err();
        assert!(err.to_string().contains("bad header"));
    }

    #[test]
    fn test_empty_payload_is_bad_payload() {
        let signer = StaticSigner::default();
        let err = sanity_check_and_sign(&Envelope::default(), None, &signer).unwrap_err();
        assert!(err.to_string().contains("bad payload"));
    }

    #[test]
    fn test_bad_config_update_env_never_signs() {
        let signer = StaticSigner::default();
        let mut tx = make_create_tx(HeaderType::ConfigUpdate, "c");
        let mut payload: Payload = decode(&tx.payload).unwrap();
        payload.data = vec![0xFF; 3];
        tx.payload = encode(&payload).unwrap();

        let err = sanity_check_and_sign(&tx, None, &signer).unwrap_err();
        assert!(err.to_string().contains("Bad config update env"));
        assert_eq!(signer.sign_count(), 0);
    }

    #[test]
    fn test_signer_failure_propagates() {
        let signer = StaticSigner::failing();
        let tx = make_create_tx(HeaderType::ConfigUpdate, "c");

        let result = sanity_check_and_sign(&tx, None, &signer);
        assert!(matches!(result, Err(ChannelError::Signing(_))));
    }
}
