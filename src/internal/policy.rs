//! Subkey usability checks.
//!
//! rpgp has no policy layer, so expiry and revocation of encryption subkeys
//! are checked by hand before a subkey is used as a recipient.

use std::time::SystemTime;

use pgp::composed::SignedPublicSubKey;
use pgp::packet::SignatureType;
use pgp::types::KeyDetails;

/// Check if a key has expired based on its creation time and validity period.
pub(crate) fn is_key_expired(creation_time: SystemTime, validity_seconds: Option<u64>) -> bool {
    match validity_seconds {
        Some(0) | None => false,
        Some(validity) => {
            creation_time + std::time::Duration::from_secs(validity) < SystemTime::now()
        }
    }
}

/// Check if a subkey is revoked.
pub(crate) fn is_subkey_revoked(subkey: &SignedPublicSubKey) -> bool {
    subkey
        .signatures
        .iter()
        .any(|sig| sig.typ() == Some(SignatureType::SubkeyRevocation))
}

/// Check if a subkey is usable (not revoked, not expired).
pub(crate) fn is_subkey_valid(subkey: &SignedPublicSubKey) -> bool {
    if is_subkey_revoked(subkey) {
        return false;
    }

    // Expiration comes from the most recent binding signature
    if let Some(validity) = subkey.signatures.last().and_then(|sig| sig.key_expiration_time()) {
        let creation_time: SystemTime = subkey.key.created_at().into();
        if is_key_expired(creation_time, Some(validity.as_secs() as u64)) {
            return false;
        }
    }

    true
}

/// Whether the subkey is flagged for encryption and can use an encrypting algorithm.
pub(crate) fn is_encryption_subkey(subkey: &SignedPublicSubKey) -> bool {
    subkey.key.algorithm().can_encrypt()
        && subkey.signatures.iter().any(|sig| {
            let flags = sig.key_flags();
            flags.encrypt_comms() || flags.encrypt_storage()
        })
}
