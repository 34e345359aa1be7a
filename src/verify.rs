//! Cleartext signature verification.

use crate::error::Result;
use crate::key::Key;
use crate::message::CleartextMessage;
use crate::types::SignatureCheck;

/// Check a cleartext-signed message against each key, in order.
///
/// A key that did not sign the message yields `valid: false`; only an
/// unparsable message is an error.
pub(crate) fn verify_cleartext(message: &CleartextMessage, keys: &[Key]) -> Result<Vec<SignatureCheck>> {
    let msg = message.parse()?;

    Ok(keys
        .iter()
        .map(|key| {
            let public_key = key.public_key();
            let valid = msg.verify(&public_key.primary_key).is_ok()
                || public_key
                    .public_subkeys
                    .iter()
                    .any(|subkey| msg.verify(&subkey.key).is_ok());
            SignatureCheck {
                key_id: key.key_id(),
                valid,
            }
        })
        .collect())
}
