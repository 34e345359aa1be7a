//! Error types for the dispatcher.
//!
//! Engine failures on the local path never reach the caller directly: they are
//! logged through [`normalize`] and replaced by [`Error::Operation`], whose
//! message is the fixed label of the failing operation.

use thiserror::Error;
use tracing::error;

use crate::types::Operation;

/// The main error type for dispatcher operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A local operation failed; the message is the operation's label
    #[error("{0}")]
    Operation(Operation),

    /// Invalid input provided (wrong payload type, empty key list, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Cryptographic operation failed
    #[error("Cryptographic operation failed: {0}")]
    Crypto(String),

    /// Certificate or message parsing failed
    #[error("Parsing failed: {0}")]
    Parse(String),

    /// Invalid password or unable to decrypt secret key
    #[error("Invalid password or key")]
    InvalidPassword,

    /// Secret key used without a passphrase attached
    #[error("Secret key {0} is locked")]
    KeyLocked(String),

    /// Key does not contain secret key material
    #[error("Key does not contain secret key material")]
    NoSecretKey,

    /// No suitable encryption subkey found
    #[error("No suitable encryption subkey found")]
    NoEncryptionSubkey,

    /// Algorithm not supported
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Key size outside the accepted range
    #[error("Invalid key size: {0} bits")]
    InvalidKeySize(u32),

    /// Armored data is malformed
    #[error("Malformed armored data: {0}")]
    MalformedArmor(String),

    /// Worker channel failure
    #[error("Worker error: {0}")]
    Worker(String),

    /// `init_worker` called on a dispatcher that already has a worker
    #[error("Worker already initialized")]
    WorkerAlreadyInitialized,

    /// Configuration could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// rpgp OpenPGP error
    #[error("OpenPGP error: {0}")]
    OpenPgp(#[from] pgp::errors::Error),
}

/// A specialized Result type for dispatcher operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Crypto(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Crypto(s.to_string())
    }
}

impl Error {
    /// Whether this error has already been reduced to an operation label.
    pub fn is_normalized(&self) -> bool {
        matches!(self, Error::Operation(_))
    }
}

/// Log the full diagnostic for a failed operation and return the
/// caller-facing error carrying only the operation label.
///
/// Already-normalized errors are returned untouched so a failure is never
/// wrapped twice.
pub fn normalize(operation: Operation, err: Error) -> Error {
    if err.is_normalized() {
        return err;
    }
    error!(operation = %operation.name(), error = ?err, "{}", operation.label());
    Error::Operation(operation)
}
