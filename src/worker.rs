//! Worker thread and the proxy that talks to it.
//!
//! The worker owns a shared engine and serves [`Request`]s from a bounded
//! channel; each request carries a oneshot sender for its reply. Requests and
//! replies are owned values, so no mutable state is shared with callers.
//! Failures inside the worker are normalized there, before the reply crosses
//! back.

use std::sync::Arc;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::dispatcher::perform;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::executor::Deferred;
use crate::key::Key;
use crate::message::{CleartextMessage, Message};
use crate::types::{GeneratedKeyPair, KeyOptions, Operation, VerifiedText};

fn default_thread_name() -> String {
    "pgp-dispatch-worker".to_string()
}

fn default_queue_depth() -> usize {
    32
}

/// Settings for the worker thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// OS thread name
    #[serde(default = "default_thread_name")]
    pub thread_name: String,
    /// Requests that may wait in the channel before callers are held back
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            thread_name: default_thread_name(),
            queue_depth: default_queue_depth(),
        }
    }
}

/// An operation with its normalized inputs.
#[derive(Debug, Clone)]
pub enum Request {
    Encrypt {
        recipients: Vec<Key>,
        text: String,
    },
    SignAndEncrypt {
        recipients: Vec<Key>,
        signer: Key,
        text: String,
    },
    Decrypt {
        key: Key,
        message: Message,
    },
    DecryptAndVerify {
        key: Key,
        verifiers: Vec<Key>,
        message: Message,
    },
    SignClear {
        signers: Vec<Key>,
        text: String,
    },
    VerifyClearSigned {
        verifiers: Vec<Key>,
        message: CleartextMessage,
    },
    GenerateKeyPair {
        options: KeyOptions,
    },
}

impl Request {
    pub fn operation(&self) -> Operation {
        match self {
            Request::Encrypt { .. } => Operation::Encrypt,
            Request::SignAndEncrypt { .. } => Operation::SignAndEncrypt,
            Request::Decrypt { .. } => Operation::Decrypt,
            Request::DecryptAndVerify { .. } => Operation::DecryptAndVerify,
            Request::SignClear { .. } => Operation::SignClear,
            Request::VerifyClearSigned { .. } => Operation::VerifyClearSigned,
            Request::GenerateKeyPair { .. } => Operation::GenerateKeyPair,
        }
    }
}

/// The result of a [`Request`].
#[derive(Debug, Clone)]
pub enum Response {
    /// Armored message or cleartext-signed message
    Armored(String),
    Decrypted(Option<String>),
    DecryptedAndVerified(Option<VerifiedText>),
    Verified(VerifiedText),
    KeyPair(GeneratedKeyPair),
}

fn unexpected(response: Response) -> Error {
    Error::Worker(format!("unexpected response: {:?}", std::mem::discriminant(&response)))
}

impl Response {
    pub fn into_armored(self) -> Result<String> {
        match self {
            Response::Armored(armored) => Ok(armored),
            other => Err(unexpected(other)),
        }
    }

    pub fn into_decrypted(self) -> Result<Option<String>> {
        match self {
            Response::Decrypted(text) => Ok(text),
            other => Err(unexpected(other)),
        }
    }

    pub fn into_decrypted_and_verified(self) -> Result<Option<VerifiedText>> {
        match self {
            Response::DecryptedAndVerified(verified) => Ok(verified),
            other => Err(unexpected(other)),
        }
    }

    pub fn into_verified(self) -> Result<VerifiedText> {
        match self {
            Response::Verified(verified) => Ok(verified),
            other => Err(unexpected(other)),
        }
    }

    pub fn into_key_pair(self) -> Result<GeneratedKeyPair> {
        match self {
            Response::KeyPair(pair) => Ok(pair),
            other => Err(unexpected(other)),
        }
    }
}

struct Job {
    request: Request,
    reply: oneshot::Sender<Result<Response>>,
}

/// Handle to a running worker thread.
///
/// Cloning the handle shares the same worker. The thread stops once every
/// handle has been dropped and the queue is drained.
#[derive(Debug, Clone)]
pub struct WorkerProxy {
    sender: mpsc::Sender<Job>,
    thread_name: String,
}

impl WorkerProxy {
    /// Start a worker thread serving requests with `engine`.
    pub fn spawn<E: Engine>(engine: Arc<E>, config: &WorkerConfig) -> Result<Self> {
        let (sender, mut receiver) = mpsc::channel::<Job>(config.queue_depth.max(1));
        let thread_name = config.thread_name.clone();

        std::thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                debug!("worker started");
                while let Some(job) = receiver.blocking_recv() {
                    let operation = job.request.operation();
                    debug!(operation = %operation.name(), "worker running request");
                    let result = perform(engine.as_ref(), job.request);
                    if job.reply.send(result).is_err() {
                        debug!(operation = %operation.name(), "caller dropped the result");
                    }
                }
                debug!("worker stopped");
            })?;

        info!(thread = %thread_name, queue_depth = config.queue_depth, "worker initialized");
        Ok(Self {
            sender,
            thread_name,
        })
    }

    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    /// Send a request to the worker; the returned future resolves with its reply.
    pub fn call(&self, request: Request) -> Deferred<Response> {
        let sender = self.sender.clone();
        async move {
            let (reply, response) = oneshot::channel();
            sender
                .send(Job { request, reply })
                .await
                .map_err(|_| Error::Worker("worker is not running".to_string()))?;
            response
                .await
                .map_err(|_| Error::Worker("worker dropped the request".to_string()))?
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RpgpEngine;
    use crate::types::KeyAlgorithm;

    #[test]
    fn test_worker_config_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.thread_name, "pgp-dispatch-worker");
        assert_eq!(config.queue_depth, 32);
    }

    #[test]
    fn test_request_operation() {
        let request = Request::GenerateKeyPair {
            options: KeyOptions::new("A <a@b.com>", "p"),
        };
        assert_eq!(request.operation(), Operation::GenerateKeyPair);
    }

    #[test]
    fn test_response_mismatch_is_worker_error() {
        let response = Response::Decrypted(None);
        assert!(matches!(response.into_armored(), Err(Error::Worker(_))));
    }

    #[tokio::test]
    async fn test_worker_generates_key() {
        let proxy = WorkerProxy::spawn(Arc::new(RpgpEngine), &WorkerConfig::default()).unwrap();
        let options = KeyOptions::new("W <w@example.com>", "pw").algorithm(KeyAlgorithm::Curve25519);

        let pair = proxy
            .call(Request::GenerateKeyPair { options })
            .await
            .unwrap()
            .into_key_pair()
            .unwrap();
        assert!(pair.public_key_armored.contains("PUBLIC KEY BLOCK"));
    }

    #[tokio::test]
    async fn test_worker_failures_arrive_normalized() {
        let proxy = WorkerProxy::spawn(Arc::new(RpgpEngine), &WorkerConfig::default()).unwrap();
        let options = KeyOptions::new("W <w@example.com>", "pw").num_bits(100);

        let err = proxy
            .call(Request::GenerateKeyPair { options })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Error generating keypair!");
    }
}
