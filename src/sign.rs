//! Cleartext signing.

use pgp::composed::{CleartextSignedMessage, SignedSecretKey};
use pgp::crypto::hash::HashAlgorithm;
use pgp::packet::{SignatureConfig, SignatureType, Subpacket, SubpacketData};
use pgp::types::{EcdsaPublicParams, KeyDetails, KeyVersion, PublicParams, Timestamp};
use rand::thread_rng;

use crate::error::{Error, Result};
use crate::key::Key;
use crate::message::CleartextMessage;

/// Select appropriate hash algorithm based on key type.
/// ECDSA keys require hash algorithms that match or exceed their security level.
pub(crate) fn select_hash_for_key(secret_key: &SignedSecretKey) -> HashAlgorithm {
    match secret_key.primary_key.public_params() {
        PublicParams::ECDSA(EcdsaPublicParams::P384 { .. }) => HashAlgorithm::Sha384,
        PublicParams::ECDSA(EcdsaPublicParams::P521 { .. }) => HashAlgorithm::Sha512,
        _ => HashAlgorithm::Sha256,
    }
}

/// Produce a cleartext-signed message carrying one signature per signer,
/// in signer order.
pub(crate) fn sign_cleartext(text: &str, signers: &[Key]) -> Result<CleartextMessage> {
    if signers.is_empty() {
        return Err(Error::InvalidInput("No signing keys specified".to_string()));
    }

    let signing = signers
        .iter()
        .map(|signer| signer.secret_parts())
        .collect::<Result<Vec<_>>>()?;

    let mut rng = thread_rng();
    let csf = CleartextSignedMessage::new_many(text, |normalized| {
        signing
            .iter()
            .map(|(secret_key, password)| {
                let key = &secret_key.primary_key;
                let mut config = SignatureConfig::from_key(&mut rng, key, SignatureType::Text)?;
                config.hash_alg = select_hash_for_key(secret_key);
                config.hashed_subpackets = vec![
                    Subpacket::regular(SubpacketData::SignatureCreationTime(Timestamp::now()))?,
                    Subpacket::regular(SubpacketData::IssuerFingerprint(key.fingerprint()))?,
                ];
                if key.version() <= KeyVersion::V4 {
                    config.unhashed_subpackets = vec![Subpacket::regular(
                        SubpacketData::IssuerKeyId(key.legacy_key_id()),
                    )?];
                }
                config.sign(key, password, normalized.as_bytes())
            })
            .collect()
    })
    .map_err(|e| Error::Crypto(e.to_string()))?;

    let armored = csf
        .to_armored_string(None.into())
        .map_err(|e| Error::Crypto(e.to_string()))?;

    CleartextMessage::from_armored(&armored)
}
