//! # pgp-dispatch
//!
//! Runs OpenPGP operations through one facade, either on the calling thread
//! or on a dedicated worker thread, using [rpgp](https://docs.rs/pgp).
//!
//! The [`Dispatcher`] exposes seven operations:
//!
//! - **encrypt** / **sign_and_encrypt**: armored messages for one or more recipients
//! - **decrypt** / **decrypt_and_verify**: plaintext, plus per-key signature results
//! - **sign_clear** / **verify_clear_signed**: cleartext signatures
//! - **generate_key_pair**: new keys with both halves armored
//!
//! Every operation returns a [`Deferred`] future. Local calls compute
//! immediately and return an already-settled future; delegated calls resolve
//! when the worker replies.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pgp_dispatch::{Dispatcher, KeyOptions, Message, WorkerConfig};
//!
//! # async fn demo() -> pgp_dispatch::Result<()> {
//! let dispatcher = Dispatcher::default();
//! dispatcher.init_worker(&WorkerConfig::default())?;
//!
//! let alice = dispatcher
//!     .generate_key_pair(KeyOptions::new("Alice <alice@example.com>", "pw").unlocked(true))
//!     .await?
//!     .key;
//!
//! let signed = dispatcher.sign_clear(alice.clone(), "Hello!").await?;
//! let encrypted = dispatcher.encrypt(alice.to_public(), "Secret").await?;
//! let plaintext = dispatcher
//!     .decrypt(alice, Message::from_armored(&encrypted)?)
//!     .await?;
//! assert_eq!(plaintext.as_deref(), Some("Secret"));
//! # let _ = signed;
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! Engine failures are logged with full detail through `tracing` and reported
//! to the caller as [`Error::Operation`], whose message is the operation's
//! label (for example `"Error encrypting message!"`). Input mistakes, such as
//! passing a plain string to `verify_clear_signed`, are reported as
//! [`Error::InvalidInput`].

mod error;
mod types;
mod internal;

mod message;
mod encrypt;
mod decrypt;
mod sign;
mod verify;
mod key;

pub mod config;
pub mod engine;
pub mod environment;
pub mod executor;
pub mod logging;
pub mod worker;

mod dispatcher;

// Re-export error types
pub use error::{normalize, Error, Result};

// Re-export all public types
pub use types::{
    GeneratedKeyPair,
    KeyAlgorithm,
    KeyInfo,
    KeyOptions,
    Operation,
    SignatureCheck,
    VerifiedText,
};

pub use key::{Key, KeyInput};
pub use message::{CleartextMessage, Message, Payload};

pub use encrypt::Draft;
pub use decrypt::Decrypted;

pub use config::DispatchConfig;
pub use dispatcher::Dispatcher;
pub use engine::{Engine, RpgpEngine};
pub use environment::{Environment, Route};
pub use executor::Deferred;
pub use worker::{WorkerConfig, WorkerProxy};
