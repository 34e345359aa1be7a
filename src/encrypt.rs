//! Encryption (optionally signed) to one or more recipients.

use pgp::composed::{MessageBuilder, SignedPublicKey, SignedPublicSubKey};
use pgp::crypto::sym::SymmetricKeyAlgorithm;
use rand::thread_rng;

use crate::error::{Error, Result};
use crate::internal::{is_encryption_subkey, is_subkey_valid};
use crate::key::Key;
use crate::message::Message;
use crate::sign::select_hash_for_key;

/// Plaintext staged for encryption, together with the keys that will sign it.
#[derive(Debug, Clone)]
pub struct Draft {
    text: String,
    signers: Vec<Key>,
}

impl Draft {
    pub(crate) fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            signers: Vec::new(),
        }
    }

    /// Add a signer. The key must be an unlocked secret key.
    pub(crate) fn add_signer(&mut self, key: &Key) -> Result<()> {
        key.secret_parts()?;
        self.signers.push(key.clone());
        Ok(())
    }
}

/// Encrypt a draft to every usable encryption subkey of the recipients and
/// return the armored message.
pub(crate) fn encrypt_draft(draft: Draft, recipients: &[Key]) -> Result<Message> {
    if recipients.is_empty() {
        return Err(Error::InvalidInput("No recipients specified".to_string()));
    }

    let mut rng = thread_rng();

    let mut encryption_keys = Vec::new();
    for recipient in recipients {
        encryption_keys.extend(find_valid_encryption_subkeys(&recipient.public_key())?);
    }

    let signing = draft
        .signers
        .iter()
        .map(|key| key.secret_parts())
        .collect::<Result<Vec<_>>>()?;

    let mut builder = MessageBuilder::from_bytes("", draft.text.clone().into_bytes())
        .seipd_v1(&mut rng, SymmetricKeyAlgorithm::AES256);

    for (secret_key, password) in signing {
        builder.sign(&secret_key.primary_key, password, select_hash_for_key(secret_key));
    }

    for key in &encryption_keys {
        builder
            .encrypt_to_key(&mut rng, key)
            .map_err(|e| Error::Crypto(e.to_string()))?;
    }

    let armored = builder
        .to_armored_string(&mut rng, None.into())
        .map_err(|e| Error::Crypto(e.to_string()))?;
    Message::from_armored(&armored)
}

/// Helper to find valid encryption subkeys from a public key.
fn find_valid_encryption_subkeys(key: &SignedPublicKey) -> Result<Vec<SignedPublicSubKey>> {
    let valid_keys: Vec<_> = key
        .public_subkeys
        .iter()
        .filter(|subkey| is_encryption_subkey(subkey) && is_subkey_valid(subkey))
        .cloned()
        .collect();

    if valid_keys.is_empty() {
        return Err(Error::NoEncryptionSubkey);
    }

    Ok(valid_keys)
}
