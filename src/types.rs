//! Public type definitions shared by the dispatcher, the worker and the engine.

use chrono::{DateTime, Utc};
use secrecy::SecretString;

use crate::error::{Error, Result};
use crate::key::Key;

/// The seven operations the dispatcher exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Encrypt,
    SignAndEncrypt,
    Decrypt,
    DecryptAndVerify,
    SignClear,
    VerifyClearSigned,
    GenerateKeyPair,
}

impl Operation {
    /// Caller-facing message used when the operation fails.
    pub fn label(&self) -> &'static str {
        match self {
            Operation::Encrypt => "Error encrypting message!",
            Operation::SignAndEncrypt => "Error signing and encrypting message!",
            Operation::Decrypt => "Error decrypting message!",
            Operation::DecryptAndVerify => "Error decrypting and verifying message!",
            Operation::SignClear => "Error signing cleartext message!",
            Operation::VerifyClearSigned => "Error verifying cleartext signed message!",
            Operation::GenerateKeyPair => "Error generating keypair!",
        }
    }

    /// Short name used in log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Encrypt => "encrypt",
            Operation::SignAndEncrypt => "sign_and_encrypt",
            Operation::Decrypt => "decrypt",
            Operation::DecryptAndVerify => "decrypt_and_verify",
            Operation::SignClear => "sign_clear",
            Operation::VerifyClearSigned => "verify_clear_signed",
            Operation::GenerateKeyPair => "generate_key_pair",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Key algorithm for key generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyAlgorithm {
    /// RSA primary key for signing plus an RSA encryption subkey
    #[default]
    Rsa,
    /// Curve25519 legacy format (EdDSA for signing, ECDH for encryption)
    Curve25519,
    /// NIST P-256 curve (ECDSA for signing, ECDH for encryption)
    NistP256,
    /// NIST P-384 curve (ECDSA for signing, ECDH for encryption)
    NistP384,
}

impl std::str::FromStr for KeyAlgorithm {
    type Err = Error;

    /// Parse an algorithm from its name (case-insensitive).
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "rsa" | "rsa_encrypt_sign" => Ok(KeyAlgorithm::Rsa),
            "cv25519" | "curve25519" | "ed25519" => Ok(KeyAlgorithm::Curve25519),
            "nistp256" | "p256" | "secp256r1" => Ok(KeyAlgorithm::NistP256),
            "nistp384" | "p384" | "secp384r1" => Ok(KeyAlgorithm::NistP384),
            _ => Err(Error::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

impl KeyAlgorithm {
    /// Smallest accepted RSA modulus.
    pub const MIN_RSA_BITS: u32 = 1024;
    /// Largest accepted RSA modulus.
    pub const MAX_RSA_BITS: u32 = 4096;

    /// Map an OpenPGP public-key algorithm id to a generation algorithm.
    pub fn from_id(id: u8) -> Result<Self> {
        match id {
            1 => Ok(KeyAlgorithm::Rsa),
            19 => Ok(KeyAlgorithm::NistP256),
            22 => Ok(KeyAlgorithm::Curve25519),
            other => Err(Error::UnsupportedAlgorithm(format!("algorithm id {}", other))),
        }
    }

    /// Get a human-readable name for the algorithm.
    pub fn name(&self) -> &'static str {
        match self {
            KeyAlgorithm::Rsa => "RSA",
            KeyAlgorithm::Curve25519 => "Curve25519 (Legacy)",
            KeyAlgorithm::NistP256 => "NIST P-256",
            KeyAlgorithm::NistP384 => "NIST P-384",
        }
    }

    /// Get the rpgp KeyType for the primary key (signing/certification).
    pub(crate) fn primary_key_type(&self, num_bits: u32) -> pgp::composed::KeyType {
        use pgp::composed::KeyType;
        use pgp::crypto::ecc_curve::ECCCurve;

        match self {
            KeyAlgorithm::Rsa => KeyType::Rsa(num_bits),
            KeyAlgorithm::Curve25519 => KeyType::Ed25519Legacy,
            KeyAlgorithm::NistP256 => KeyType::ECDSA(ECCCurve::P256),
            KeyAlgorithm::NistP384 => KeyType::ECDSA(ECCCurve::P384),
        }
    }

    /// Get the rpgp KeyType for the encryption subkey.
    pub(crate) fn encryption_key_type(&self, num_bits: u32) -> pgp::composed::KeyType {
        use pgp::composed::KeyType;
        use pgp::crypto::ecc_curve::ECCCurve;

        match self {
            KeyAlgorithm::Rsa => KeyType::Rsa(num_bits),
            KeyAlgorithm::Curve25519 => KeyType::ECDH(ECCCurve::Curve25519),
            KeyAlgorithm::NistP256 => KeyType::ECDH(ECCCurve::P256),
            KeyAlgorithm::NistP384 => KeyType::ECDH(ECCCurve::P384),
        }
    }
}

/// Options for [`generate_key_pair`](crate::Dispatcher::generate_key_pair).
#[derive(Debug, Clone)]
pub struct KeyOptions {
    /// Key algorithm (defaults to RSA)
    pub algorithm: KeyAlgorithm,
    /// RSA modulus size; ignored for curve algorithms
    pub num_bits: u32,
    /// User ID, e.g. "Alice <alice@example.com>"
    pub user_id: String,
    /// Passphrase protecting the secret key material
    pub passphrase: SecretString,
    /// Return the key with its passphrase attached, ready to sign and decrypt
    pub unlocked: bool,
}

impl KeyOptions {
    /// RSA 2048 options for the given identity, returned locked.
    pub fn new(user_id: impl Into<String>, passphrase: &str) -> Self {
        Self {
            algorithm: KeyAlgorithm::default(),
            num_bits: 2048,
            user_id: user_id.into(),
            passphrase: SecretString::new(passphrase.to_string()),
            unlocked: false,
        }
    }

    pub fn algorithm(mut self, algorithm: KeyAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn num_bits(mut self, num_bits: u32) -> Self {
        self.num_bits = num_bits;
        self
    }

    pub fn unlocked(mut self, unlocked: bool) -> Self {
        self.unlocked = unlocked;
        self
    }

    /// Reject options the engine cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(Error::InvalidInput("A user ID is required".to_string()));
        }
        if self.algorithm == KeyAlgorithm::Rsa
            && !(KeyAlgorithm::MIN_RSA_BITS..=KeyAlgorithm::MAX_RSA_BITS).contains(&self.num_bits)
        {
            return Err(Error::InvalidKeySize(self.num_bits));
        }
        Ok(())
    }
}

/// Result of key pair generation.
#[derive(Debug, Clone)]
pub struct GeneratedKeyPair {
    /// The generated secret key
    pub key: Key,
    /// ASCII-armored secret key
    pub private_key_armored: String,
    /// ASCII-armored public key
    pub public_key_armored: String,
}

/// Outcome of checking a message's signature against one verifier key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureCheck {
    /// Key ID of the verifier key (16 upper-case hex characters)
    pub key_id: String,
    /// Whether the message carries a valid signature by this key
    pub valid: bool,
}

/// Verified message text together with per-key signature results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedText {
    pub text: String,
    pub signatures: Vec<SignatureCheck>,
}

impl VerifiedText {
    /// True when at least one verifier key produced a valid signature.
    pub fn is_verified(&self) -> bool {
        self.signatures.iter().any(|s| s.valid)
    }
}

/// Certificate details of a [`Key`].
#[derive(Debug, Clone)]
pub struct KeyInfo {
    /// User IDs associated with this certificate
    pub user_ids: Vec<String>,
    /// Primary key fingerprint as hex string
    pub fingerprint: String,
    /// Short key ID (last 16 hex characters)
    pub key_id: String,
    /// Whether this key contains secret key material
    pub is_secret: bool,
    /// When the certificate was created
    pub creation_time: DateTime<Utc>,
    /// Algorithm name (e.g., "RSA", "EdDSA")
    pub algorithm: String,
}
