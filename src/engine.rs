//! The cryptographic engine the dispatcher drives.
//!
//! [`Engine`] is the seam between the dispatcher and the OpenPGP
//! implementation. Plaintext is staged in a [`Engine::Draft`], signed, then
//! encrypted; decryption yields an [`Engine::Opened`] handle whose text is read
//! before any signature is checked. [`RpgpEngine`] implements it with rpgp.

use crate::decrypt::{self, Decrypted};
use crate::encrypt::{self, Draft};
use crate::error::Result;
use crate::key::{self, Key};
use crate::message::{CleartextMessage, Message};
use crate::sign;
use crate::types::{KeyOptions, SignatureCheck};
use crate::verify;

/// OpenPGP operations used by the dispatcher.
///
/// Implementations must be shareable with the worker thread.
pub trait Engine: Send + Sync + 'static {
    /// Plaintext staged for signing and encryption.
    type Draft;
    /// A decrypted message.
    type Opened;

    /// Stage plaintext.
    fn draft(&self, text: &str) -> Self::Draft;

    /// Add a signature by `signer` to the staged plaintext.
    fn sign(&self, draft: &mut Self::Draft, signer: &Key) -> Result<()>;

    /// Encrypt the staged plaintext to every recipient.
    fn encrypt(&self, draft: Self::Draft, recipients: &[Key]) -> Result<Message>;

    /// Decrypt a message with an unlocked secret key.
    fn decrypt(&self, key: &Key, message: &Message) -> Result<Self::Opened>;

    /// Literal text of a decrypted message; `None` if it carries no literal data.
    fn read_text(&self, opened: &mut Self::Opened) -> Result<Option<String>>;

    /// One result per key, in the order given.
    fn verify(&self, opened: &mut Self::Opened, keys: &[Key]) -> Vec<SignatureCheck>;

    /// Clear-sign text with every signer.
    fn sign_cleartext(&self, text: &str, signers: &[Key]) -> Result<CleartextMessage>;

    /// One result per key, in the order given.
    fn verify_cleartext(&self, message: &CleartextMessage, keys: &[Key]) -> Result<Vec<SignatureCheck>>;

    /// Generate a new secret key.
    fn generate_key(&self, options: &KeyOptions) -> Result<Key>;
}

/// [`Engine`] backed by rpgp.
#[derive(Debug, Clone, Copy, Default)]
pub struct RpgpEngine;

impl Engine for RpgpEngine {
    type Draft = Draft;
    type Opened = Decrypted;

    fn draft(&self, text: &str) -> Draft {
        Draft::new(text)
    }

    fn sign(&self, draft: &mut Draft, signer: &Key) -> Result<()> {
        draft.add_signer(signer)
    }

    fn encrypt(&self, draft: Draft, recipients: &[Key]) -> Result<Message> {
        encrypt::encrypt_draft(draft, recipients)
    }

    fn decrypt(&self, key: &Key, message: &Message) -> Result<Decrypted> {
        decrypt::decrypt_message(key, message)
    }

    fn read_text(&self, opened: &mut Decrypted) -> Result<Option<String>> {
        decrypt::read_text(opened)
    }

    fn verify(&self, opened: &mut Decrypted, keys: &[Key]) -> Vec<SignatureCheck> {
        decrypt::verify_signatures(opened, keys)
    }

    fn sign_cleartext(&self, text: &str, signers: &[Key]) -> Result<CleartextMessage> {
        sign::sign_cleartext(text, signers)
    }

    fn verify_cleartext(&self, message: &CleartextMessage, keys: &[Key]) -> Result<Vec<SignatureCheck>> {
        verify::verify_cleartext(message, keys)
    }

    fn generate_key(&self, options: &KeyOptions) -> Result<Key> {
        key::generate_key(options)
    }
}
