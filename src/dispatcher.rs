//! The operation facade.
//!
//! Each operation shapes its inputs into a [`Request`], asks the
//! [`Environment`] for a route, then either runs the request on the calling
//! thread or hands it to the worker. Local failures are normalized to the
//! operation's label; worker replies arrive already normalized.

use std::sync::{Arc, OnceLock};

use futures::FutureExt;
use tracing::debug;

use crate::config::DispatchConfig;
use crate::engine::{Engine, RpgpEngine};
use crate::environment::{Environment, Route};
use crate::error::{normalize, Error, Result};
use crate::executor::{execute, settled, Deferred};
use crate::key::{Key, KeyInput};
use crate::message::{Message, Payload};
use crate::types::{GeneratedKeyPair, KeyOptions, VerifiedText};
use crate::worker::{Request, Response, WorkerConfig, WorkerProxy};

/// Runs OpenPGP operations locally or on a worker thread.
///
/// ```no_run
/// use pgp_dispatch::{Dispatcher, KeyOptions};
///
/// # async fn demo() -> pgp_dispatch::Result<()> {
/// let dispatcher = Dispatcher::default();
/// let pair = dispatcher
///     .generate_key_pair(KeyOptions::new("Alice <alice@example.com>", "pw").unlocked(true))
///     .await?;
///
/// let ciphertext = dispatcher.encrypt(pair.key.to_public(), "Hello!").await?;
/// let message = pgp_dispatch::Message::from_armored(&ciphertext)?;
/// let plaintext = dispatcher.decrypt(pair.key.clone(), message).await?;
/// assert_eq!(plaintext.as_deref(), Some("Hello!"));
/// # Ok(())
/// # }
/// ```
pub struct Dispatcher<E: Engine = RpgpEngine> {
    engine: Arc<E>,
    environment: Environment,
    worker: OnceLock<WorkerProxy>,
}

impl Default for Dispatcher<RpgpEngine> {
    fn default() -> Self {
        Self::new(RpgpEngine)
    }
}

impl<E: Engine> std::fmt::Debug for Dispatcher<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("environment", &self.environment)
            .field("worker", &self.worker.get())
            .finish()
    }
}

impl<E: Engine> Dispatcher<E> {
    /// Dispatcher for the detected environment, without a worker.
    pub fn new(engine: E) -> Self {
        Self::with_environment(engine, Environment::detect())
    }

    pub fn with_environment(engine: E, environment: Environment) -> Self {
        Self {
            engine: Arc::new(engine),
            environment,
            worker: OnceLock::new(),
        }
    }

    /// Build from configuration, starting the worker if one is configured.
    pub fn from_config(engine: E, config: &DispatchConfig) -> Result<Self> {
        let dispatcher = Self::with_environment(engine, config.environment());
        if let Some(worker) = &config.worker {
            dispatcher.init_worker(worker)?;
        }
        Ok(dispatcher)
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn has_worker(&self) -> bool {
        self.worker.get().is_some()
    }

    /// Start the worker thread. Allowed once per dispatcher.
    ///
    /// # Arguments
    /// * `config` - Worker thread name and request queue capacity
    ///
    /// # Errors
    /// [`Error::WorkerAlreadyInitialized`] on a second call, or
    /// [`Error::Io`] when the thread cannot be spawned.
    ///
    /// # Example
    /// ```ignore
    /// let dispatcher = Dispatcher::with_environment(RpgpEngine, Environment::new(true, false));
    /// dispatcher.init_worker(&WorkerConfig::default())?;
    /// assert!(dispatcher.has_worker());
    /// ```
    pub fn init_worker(&self, config: &WorkerConfig) -> Result<()> {
        if self.has_worker() {
            return Err(Error::WorkerAlreadyInitialized);
        }
        let proxy = WorkerProxy::spawn(Arc::clone(&self.engine), config)?;
        self.worker
            .set(proxy)
            .map_err(|_| Error::WorkerAlreadyInitialized)
    }

    /// Encrypt `text` to every recipient; resolves with the armored message.
    pub fn encrypt(&self, recipients: impl Into<KeyInput>, text: &str) -> Deferred<String> {
        let recipients = recipients.into();
        if recipients.is_empty() {
            return settled(Err(Error::InvalidInput("No recipients specified".to_string())));
        }
        self.dispatch(
            Request::Encrypt {
                recipients: recipients.into_keys(),
                text: text.to_string(),
            },
            Response::into_armored,
        )
    }

    /// Sign `text` with `signer`, then encrypt it to every recipient.
    pub fn sign_and_encrypt(
        &self,
        recipients: impl Into<KeyInput>,
        signer: Key,
        text: &str,
    ) -> Deferred<String> {
        let recipients = recipients.into();
        if recipients.is_empty() {
            return settled(Err(Error::InvalidInput("No recipients specified".to_string())));
        }
        self.dispatch(
            Request::SignAndEncrypt {
                recipients: recipients.into_keys(),
                signer,
                text: text.to_string(),
            },
            Response::into_armored,
        )
    }

    /// Decrypt `message`; resolves with `None` when it holds no literal data.
    pub fn decrypt(&self, key: Key, message: Message) -> Deferred<Option<String>> {
        self.dispatch(Request::Decrypt { key, message }, Response::into_decrypted)
    }

    /// Decrypt `message` and check its signature against each verifier.
    ///
    /// Resolves with `None` when the message holds no literal data; no
    /// verification is attempted in that case.
    pub fn decrypt_and_verify(
        &self,
        key: Key,
        verifiers: impl Into<KeyInput>,
        message: Message,
    ) -> Deferred<Option<VerifiedText>> {
        self.dispatch(
            Request::DecryptAndVerify {
                key,
                verifiers: verifiers.into().into_keys(),
                message,
            },
            Response::into_decrypted_and_verified,
        )
    }

    /// Clear-sign `text` with every signer; resolves with the armored
    /// cleartext-signed message.
    pub fn sign_clear(&self, signers: impl Into<KeyInput>, text: &str) -> Deferred<String> {
        let signers = signers.into();
        if signers.is_empty() {
            return settled(Err(Error::InvalidInput("No signing keys specified".to_string())));
        }
        self.dispatch(
            Request::SignClear {
                signers: signers.into_keys(),
                text: text.to_string(),
            },
            Response::into_armored,
        )
    }

    /// Verify a cleartext-signed message against each verifier.
    ///
    /// Anything other than a [`CleartextMessage`](crate::CleartextMessage) is
    /// rejected immediately with [`Error::InvalidInput`]. Keys that did not
    /// sign the message are reported with `valid: false`.
    pub fn verify_clear_signed(
        &self,
        verifiers: impl Into<KeyInput>,
        message: impl Into<Payload>,
    ) -> Deferred<VerifiedText> {
        let message = match message.into() {
            Payload::Cleartext(message) => message,
            other => {
                return settled(Err(Error::InvalidInput(format!(
                    "message needs to be a cleartext-signed message, got a {}",
                    other.kind()
                ))))
            }
        };
        self.dispatch(
            Request::VerifyClearSigned {
                verifiers: verifiers.into().into_keys(),
                message,
            },
            Response::into_verified,
        )
    }

    /// Generate a key pair and armor both halves.
    ///
    /// # Arguments
    /// * `options` - Identity, passphrase, algorithm and RSA size
    ///
    /// # Errors
    /// An empty user ID is rejected with [`Error::InvalidInput`] before the
    /// request is routed. Engine failures, an unsupported RSA size included,
    /// resolve to the key generation label.
    ///
    /// # Example
    /// ```ignore
    /// let pair = dispatcher
    ///     .generate_key_pair(KeyOptions::new("A <a@b.com>", "p").num_bits(1024))
    ///     .await?;
    /// println!("{}", pair.public_key_armored);
    /// ```
    pub fn generate_key_pair(&self, options: KeyOptions) -> Deferred<GeneratedKeyPair> {
        if options.user_id.trim().is_empty() {
            return settled(Err(Error::InvalidInput("A user ID is required".to_string())));
        }
        self.dispatch(Request::GenerateKeyPair { options }, Response::into_key_pair)
    }

    fn dispatch<T: Send + 'static>(
        &self,
        request: Request,
        extract: fn(Response) -> Result<T>,
    ) -> Deferred<T> {
        let operation = request.operation();
        let worker = self.worker.get();

        match (self.environment.route(operation, worker.is_some()), worker) {
            (Route::Worker, Some(worker)) => {
                debug!(operation = %operation.name(), route = "worker", "dispatching");
                worker.call(request).map(move |reply| reply.and_then(extract)).boxed()
            }
            _ => {
                debug!(operation = %operation.name(), route = "local", "dispatching");
                execute(|| perform(self.engine.as_ref(), request).and_then(extract))
            }
        }
    }
}

/// Run a request against the engine, normalizing any failure.
pub(crate) fn perform<E: Engine>(engine: &E, request: Request) -> Result<Response> {
    let operation = request.operation();
    run(engine, request).map_err(|err| normalize(operation, err))
}

fn run<E: Engine>(engine: &E, request: Request) -> Result<Response> {
    match request {
        Request::Encrypt { recipients, text } => {
            let draft = engine.draft(&text);
            let message = engine.encrypt(draft, &recipients)?;
            message.to_armored().map(Response::Armored)
        }
        Request::SignAndEncrypt {
            recipients,
            signer,
            text,
        } => {
            let mut draft = engine.draft(&text);
            engine.sign(&mut draft, &signer)?;
            let message = engine.encrypt(draft, &recipients)?;
            message.to_armored().map(Response::Armored)
        }
        Request::Decrypt { key, message } => {
            let mut opened = engine.decrypt(&key, &message)?;
            engine.read_text(&mut opened).map(Response::Decrypted)
        }
        Request::DecryptAndVerify {
            key,
            verifiers,
            message,
        } => {
            let mut opened = engine.decrypt(&key, &message)?;
            let verified = match engine.read_text(&mut opened)? {
                Some(text) => {
                    let signatures = engine.verify(&mut opened, &verifiers);
                    Some(VerifiedText { text, signatures })
                }
                None => None,
            };
            Ok(Response::DecryptedAndVerified(verified))
        }
        Request::SignClear { signers, text } => engine
            .sign_cleartext(&text, &signers)
            .map(|signed| Response::Armored(signed.armored().to_string())),
        Request::VerifyClearSigned { verifiers, message } => {
            let signatures = engine.verify_cleartext(&message, &verifiers)?;
            Ok(Response::Verified(VerifiedText {
                text: message.text().to_string(),
                signatures,
            }))
        }
        Request::GenerateKeyPair { options } => {
            let key = engine.generate_key(&options)?;
            let private_key_armored = key.armor()?;
            let public_key_armored = key.to_public().armor()?;
            Ok(Response::KeyPair(GeneratedKeyPair {
                key,
                private_key_armored,
                public_key_armored,
            }))
        }
    }
}
