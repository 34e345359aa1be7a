//! Key references and key generation.
//!
//! A [`Key`] wraps either a public certificate or a secret key. Secret keys
//! start out locked; attaching the passphrase with [`Key::unlock`] makes them
//! usable for signing and decryption. Operations that accept several keys take
//! a [`KeyInput`], which normalizes a single key or a list into an ordered
//! `Vec<Key>`.

use std::fmt;

use pgp::composed::{
    EncryptionCaps, KeyDetails as UserDetails, SecretKeyParamsBuilder, SignedPublicKey,
    SignedSecretKey, SignedSecretSubKey, SubkeyParamsBuilder,
};
use pgp::packet::{
    Features, KeyFlags, PubKeyInner, PublicKey, PublicSubkey, SecretKey, SecretSubkey, UserId,
};
use pgp::types::{KeyDetails, KeyVersion, Password, S2kParams, Timestamp};
use rand::thread_rng;
use secrecy::{ExposeSecret, SecretString};

use crate::error::{Error, Result};
use crate::internal::{
    fingerprint_to_hex, get_algorithm_name, keyid_to_hex, parse_public_key, parse_secret_key,
    public_key_to_armored, secret_key_to_armored, system_time_to_datetime,
};
use crate::types::{KeyAlgorithm, KeyInfo, KeyOptions};

#[derive(Clone)]
enum KeyMaterial {
    Public(SignedPublicKey),
    Secret(SignedSecretKey),
}

/// Handle to OpenPGP key material (public, or secret and possibly locked).
///
/// The dispatcher never mutates a key; operations clone what they need.
#[derive(Clone)]
pub struct Key {
    material: KeyMaterial,
    passphrase: Option<SecretString>,
}

impl Key {
    /// Parse a key from armored or binary data. Secret keys are tried first.
    ///
    /// # Arguments
    /// * `data` - ASCII-armored or binary OpenPGP key data
    ///
    /// # Returns
    /// A locked [`Key`] for secret key data, a public [`Key`] otherwise.
    ///
    /// # Example
    /// ```ignore
    /// let key = Key::from_bytes(&std::fs::read("alice.asc")?)?;
    /// let key = if key.is_secret() { key.unlock("passphrase")? } else { key };
    /// ```
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if let Ok(secret) = parse_secret_key(data) {
            return Ok(Self::from_secret(secret));
        }
        parse_public_key(data).map(Self::from_public)
    }

    /// Parse an ASCII-armored key.
    pub fn from_armored(armored: &str) -> Result<Self> {
        Self::from_bytes(armored.as_bytes())
    }

    pub fn from_public(key: SignedPublicKey) -> Self {
        Self {
            material: KeyMaterial::Public(key),
            passphrase: None,
        }
    }

    /// Wrap a secret key; it stays locked until [`Key::unlock`] is called.
    pub fn from_secret(key: SignedSecretKey) -> Self {
        Self {
            material: KeyMaterial::Secret(key),
            passphrase: None,
        }
    }

    /// Attach the passphrase protecting the secret material.
    ///
    /// The passphrase is only checked when the key is first used; a wrong
    /// passphrase surfaces as an engine failure of that operation.
    ///
    /// # Arguments
    /// * `passphrase` - Passphrase of the secret key (empty for unprotected keys)
    ///
    /// # Errors
    /// [`Error::NoSecretKey`] when called on a public key.
    pub fn unlock(mut self, passphrase: &str) -> Result<Self> {
        if !self.is_secret() {
            return Err(Error::NoSecretKey);
        }
        self.passphrase = Some(SecretString::new(passphrase.to_string()));
        Ok(self)
    }

    pub fn is_secret(&self) -> bool {
        matches!(self.material, KeyMaterial::Secret(_))
    }

    /// True for secret keys with a passphrase attached.
    pub fn is_unlocked(&self) -> bool {
        self.is_secret() && self.passphrase.is_some()
    }

    /// Short key ID of the primary key (16 upper-case hex characters).
    pub fn key_id(&self) -> String {
        match &self.material {
            KeyMaterial::Public(key) => keyid_to_hex(&key.primary_key),
            KeyMaterial::Secret(key) => keyid_to_hex(&key.primary_key),
        }
    }

    /// Fingerprint of the primary key.
    pub fn fingerprint(&self) -> String {
        match &self.material {
            KeyMaterial::Public(key) => fingerprint_to_hex(&key.primary_key),
            KeyMaterial::Secret(key) => fingerprint_to_hex(&key.primary_key),
        }
    }

    /// Certificate details of this key.
    pub fn info(&self) -> KeyInfo {
        let public = self.public_key();
        KeyInfo {
            user_ids: public
                .details
                .users
                .iter()
                .map(|u| String::from_utf8_lossy(u.id.id()).to_string())
                .collect(),
            fingerprint: fingerprint_to_hex(&public.primary_key),
            key_id: keyid_to_hex(&public.primary_key),
            is_secret: self.is_secret(),
            creation_time: system_time_to_datetime(public.primary_key.created_at().into()),
            algorithm: get_algorithm_name(&public.primary_key),
        }
    }

    /// The public half of this key.
    pub fn to_public(&self) -> Key {
        Key::from_public(self.public_key())
    }

    /// ASCII-armored form: a private key block for secret keys, a public key
    /// block otherwise.
    pub fn armor(&self) -> Result<String> {
        match &self.material {
            KeyMaterial::Public(key) => public_key_to_armored(key),
            KeyMaterial::Secret(key) => secret_key_to_armored(key),
        }
    }

    pub(crate) fn public_key(&self) -> SignedPublicKey {
        match &self.material {
            KeyMaterial::Public(key) => key.clone(),
            KeyMaterial::Secret(key) => key.to_public_key(),
        }
    }

    /// Secret material plus the password to use it; fails for public or
    /// locked keys.
    pub(crate) fn secret_parts(&self) -> Result<(&SignedSecretKey, Password)> {
        let KeyMaterial::Secret(secret) = &self.material else {
            return Err(Error::NoSecretKey);
        };
        let passphrase = self
            .passphrase
            .as_ref()
            .ok_or_else(|| Error::KeyLocked(self.key_id()))?;
        Ok((secret, Password::from(passphrase.expose_secret().as_str())))
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.is_secret() == other.is_secret() && self.fingerprint() == other.fingerprint()
    }
}

impl Eq for Key {}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("key_id", &self.key_id())
            .field("secret", &self.is_secret())
            .field("unlocked", &self.is_unlocked())
            .finish()
    }
}

/// One key or an ordered collection of keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyInput {
    Single(Key),
    Many(Vec<Key>),
}

impl KeyInput {
    /// Normalize into an ordered list of keys.
    pub fn into_keys(self) -> Vec<Key> {
        match self {
            KeyInput::Single(key) => vec![key],
            KeyInput::Many(keys) => keys,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            KeyInput::Single(_) => 1,
            KeyInput::Many(keys) => keys.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Key> for KeyInput {
    fn from(key: Key) -> Self {
        KeyInput::Single(key)
    }
}

impl From<&Key> for KeyInput {
    fn from(key: &Key) -> Self {
        KeyInput::Single(key.clone())
    }
}

impl From<Vec<Key>> for KeyInput {
    fn from(keys: Vec<Key>) -> Self {
        KeyInput::Many(keys)
    }
}

impl From<&[Key]> for KeyInput {
    fn from(keys: &[Key]) -> Self {
        KeyInput::Many(keys.to_vec())
    }
}

impl<const N: usize> From<[Key; N]> for KeyInput {
    fn from(keys: [Key; N]) -> Self {
        KeyInput::Many(keys.into())
    }
}

/// Smallest RSA size the rpgp key builder accepts.
const BUILDER_MIN_RSA_BITS: u32 = 2048;

/// Generate a new key: a signing/certifying primary key plus one encryption
/// subkey, both protected by the options' passphrase.
pub(crate) fn generate_key(options: &KeyOptions) -> Result<Key> {
    options.validate()?;

    let secret_key = if options.algorithm == KeyAlgorithm::Rsa
        && options.num_bits < BUILDER_MIN_RSA_BITS
    {
        assemble_key(options).map_err(|e| Error::Crypto(e.to_string()))?
    } else {
        build_key(options)?
    };

    let key = Key::from_secret(secret_key);
    if options.unlocked {
        key.unlock(options.passphrase.expose_secret())
    } else {
        Ok(key)
    }
}

fn build_key(options: &KeyOptions) -> Result<SignedSecretKey> {
    let mut rng = thread_rng();
    let passphrase = options.passphrase.expose_secret();

    let mut enc_builder = SubkeyParamsBuilder::default();
    enc_builder
        .key_type(options.algorithm.encryption_key_type(options.num_bits))
        .can_encrypt(EncryptionCaps::All)
        .can_sign(false)
        .can_authenticate(false);
    if !passphrase.is_empty() {
        enc_builder.passphrase(Some(passphrase.clone()));
    }
    let encryption_subkey = enc_builder.build().map_err(|e| Error::Crypto(e.to_string()))?;

    let mut key_params = SecretKeyParamsBuilder::default();
    key_params
        .key_type(options.algorithm.primary_key_type(options.num_bits))
        .can_certify(true)
        .can_sign(true)
        .can_encrypt(EncryptionCaps::None)
        .primary_user_id(options.user_id.clone())
        .subkeys(vec![encryption_subkey]);
    if !passphrase.is_empty() {
        key_params.passphrase(Some(passphrase.clone()));
    }

    key_params
        .build()
        .map_err(|e| Error::Crypto(e.to_string()))?
        .generate(&mut rng)
        .map_err(|e| Error::Crypto(e.to_string()))
}

/// Compose the same key layout as [`build_key`] packet by packet and sign
/// the user ID and subkey bindings directly. Used for RSA sizes below
/// [`BUILDER_MIN_RSA_BITS`].
fn assemble_key(options: &KeyOptions) -> pgp::errors::Result<SignedSecretKey> {
    let mut rng = thread_rng();
    let passphrase = options.passphrase.expose_secret();
    let key_pw = if passphrase.is_empty() {
        Password::empty()
    } else {
        Password::from(passphrase.as_str())
    };
    let created_at = Timestamp::now();

    let primary_type = options.algorithm.primary_key_type(options.num_bits);
    let (public_params, secret_params) = primary_type.generate(&mut rng)?;
    let primary_public = PublicKey::from_inner(PubKeyInner::new(
        KeyVersion::V4,
        primary_type.to_alg(),
        created_at,
        None,
        public_params,
    )?)?;
    let mut primary = SecretKey::new(primary_public, secret_params)?;

    let subkey_type = options.algorithm.encryption_key_type(options.num_bits);
    let (public_params, secret_params) = subkey_type.generate(&mut rng)?;
    let subkey_public = PublicSubkey::from_inner(PubKeyInner::new(
        KeyVersion::V4,
        subkey_type.to_alg(),
        created_at,
        None,
        public_params,
    )?)?;
    let mut subkey = SecretSubkey::new(subkey_public, secret_params)?;

    if !passphrase.is_empty() {
        primary.set_password_with_s2k(&key_pw, S2kParams::new_default(&mut rng, KeyVersion::V4))?;
        subkey.set_password_with_s2k(&key_pw, S2kParams::new_default(&mut rng, KeyVersion::V4))?;
    }

    let mut primary_flags = KeyFlags::default();
    primary_flags.set_certify(true);
    primary_flags.set_sign(true);
    let mut features = Features::default();
    features.set_seipd_v1(true);

    let details = UserDetails::new(
        Some(UserId::from_str(Default::default(), &options.user_id)?),
        Vec::new(),
        Vec::new(),
        primary_flags,
        features,
        Default::default(),
        Default::default(),
        Default::default(),
        Default::default(),
    )
    .sign(&mut rng, &primary, primary.public_key(), &key_pw)?;

    let mut subkey_flags = KeyFlags::default();
    subkey_flags.set_encrypt_comms(true);
    subkey_flags.set_encrypt_storage(true);
    let binding = subkey.sign(
        &mut rng,
        &primary,
        primary.public_key(),
        &key_pw,
        subkey_flags,
        None,
    )?;

    Ok(SignedSecretKey::new(
        primary,
        details,
        Vec::new(),
        vec![SignedSecretSubKey::new(subkey, vec![binding])],
    ))
}
