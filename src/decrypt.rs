//! Decryption and verification of inline-signed encrypted messages.

use std::io::Cursor;

use pgp::composed::Message as PgpMessage;
use pgp::types::Password;

use crate::error::{Error, Result};
use crate::key::Key;
use crate::message::Message;
use crate::types::SignatureCheck;

/// A decrypted (and decompressed) message, ready to be read and verified.
pub struct Decrypted {
    message: PgpMessage<'static>,
    read: bool,
}

impl std::fmt::Debug for Decrypted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decrypted").field("read", &self.read).finish()
    }
}

fn parse_message(data: &[u8]) -> Result<PgpMessage<'static>> {
    // Try armored first, then binary
    match PgpMessage::from_armor(Cursor::new(data.to_vec())) {
        Ok((msg, _headers)) => Ok(msg),
        Err(_) => PgpMessage::from_bytes(Cursor::new(data.to_vec()))
            .map_err(|e| Error::Parse(e.to_string())),
    }
}

/// Decrypt a message with an unlocked secret key.
pub(crate) fn decrypt_message(key: &Key, message: &Message) -> Result<Decrypted> {
    let (secret_key, password): (_, Password) = key.secret_parts()?;
    let data = message.as_bytes();

    // Try standard decrypt first, then legacy mode
    let decrypted = parse_message(data)?
        .decrypt(&password, secret_key)
        .or_else(|_| {
            parse_message(data)?
                .decrypt_legacy(&password, secret_key)
                .map_err(|e| Error::Crypto(e.to_string()))
        })
        .map_err(|e: Error| {
            if e.to_string().contains("password") {
                Error::InvalidPassword
            } else {
                e
            }
        })?;

    let message = if decrypted.is_compressed() {
        decrypted
            .decompress()
            .map_err(|e| Error::Crypto(e.to_string()))?
    } else {
        decrypted
    };

    Ok(Decrypted {
        message,
        read: false,
    })
}

/// Read the literal text. `None` when the decrypted payload carries no
/// literal data packet.
pub(crate) fn read_text(decrypted: &mut Decrypted) -> Result<Option<String>> {
    if decrypted.message.literal_data_header().is_none() {
        return Ok(None);
    }
    let data = decrypted
        .message
        .as_data_vec()
        .map_err(|e| Error::Crypto(e.to_string()))?;
    decrypted.read = true;
    Ok(Some(String::from_utf8_lossy(&data).into_owned()))
}

/// Check the message's signature against each key, in order.
pub(crate) fn verify_signatures(decrypted: &mut Decrypted, keys: &[Key]) -> Vec<SignatureCheck> {
    keys.iter()
        .map(|key| {
            let public_key = key.public_key();
            let valid = decrypted.read
                && (decrypted.message.verify(&public_key.primary_key).is_ok()
                    || public_key
                        .public_subkeys
                        .iter()
                        .any(|subkey| decrypted.message.verify(&subkey.key).is_ok()));
            SignatureCheck {
                key_id: key.key_id(),
                valid,
            }
        })
        .collect()
}
