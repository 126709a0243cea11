use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::decode;
use jsonwebtoken::decode_header;
use jsonwebtoken::Algorithm;
use jsonwebtoken::Validation;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::claims::Audience;
use crate::claims::GoogleClaims;
use crate::claims::StandardClaims;
use crate::config::RefreshErrorHandler;
use crate::config::VerifierConfig;
use crate::error::malformed_header_error;
use crate::error::Error;
use crate::error::Result;
use crate::key_store::KeyStore;
use crate::scheduler::RefreshScheduler;
use crate::signing_key::SigningKey;

/// Trait for ID token verification
#[async_trait]
pub trait VerifyIdToken: Send + Sync {
    /// Verify a token and return its claims
    ///
    /// The token's audience must equal at least one of `audiences`; an empty
    /// list rejects every token.
    async fn decode<S>(&self, token: &str, audiences: &[S]) -> Result<GoogleClaims>
    where
        S: AsRef<str> + Sync;

    /// Verify a token, discarding its claims
    async fn verify<S>(&self, token: &str, audiences: &[S]) -> Result<()>
    where
        S: AsRef<str> + Sync,
    {
        self.decode(token, audiences).await.map(|_| ())
    }
}

/// Google ID token verifier with a cached, refreshable key set
///
/// Cloning is cheap and yields a handle to the same key cache and settings,
/// which is how a single default instance is shared across a process.
///
/// Keys are kept fresh in one of two ways. In lazy mode (the default) the
/// expiry is checked on every verification and an expired key set is fetched
/// on the spot. With periodic refresh a background task fetches the keys on a
/// fixed interval and verification only reads the cache.
#[derive(Clone)]
pub struct IdTokenVerifier {
    inner: Arc<Inner>,
}

struct Inner {
    key_store: Arc<KeyStore>,
    issuers: Vec<String>,
    lazy_load: AtomicBool,
    scheduler: Mutex<Option<RefreshScheduler>>,
    on_refresh_error: Option<RefreshErrorHandler>,
}

impl IdTokenVerifier {
    /// Create a new verifier with the given configuration
    ///
    /// If the configuration carries a refresh interval the background refresh
    /// task is started right away.
    ///
    /// # Errors
    /// Returns `Error::InvalidRefreshInterval` if the refresh interval is zero
    pub async fn new(config: VerifierConfig) -> Result<Self> {
        let client = match config.http_client {
            Some(client) => client,
            None => Client::builder().timeout(config.http_timeout).build()?,
        };

        let key_store = KeyStore::new(
            config.certs_url,
            config.default_cache_ttl,
            config.http_timeout,
            client,
        );

        let verifier = Self {
            inner: Arc::new(Inner {
                key_store: Arc::new(key_store),
                issuers: config.issuers,
                lazy_load: AtomicBool::new(config.lazy_load),
                scheduler: Mutex::new(None),
                on_refresh_error: config.on_refresh_error,
            }),
        };

        if let Some(period) = config.refresh_interval {
            verifier.start_periodic_refresh(period)?;
        }

        Ok(verifier)
    }

    /// Create a lazily loading verifier for Google Sign-In tokens
    pub async fn google() -> Result<Self> {
        Self::new(VerifierConfig::default()).await
    }

    /// Verify a token and deserialize its claims into a custom type
    pub async fn decode_as<C, S>(&self, token: &str, audiences: &[S]) -> Result<C>
    where
        C: StandardClaims + DeserializeOwned,
        S: AsRef<str>,
    {
        let header = decode_header(token).map_err(malformed_header_error)?;
        let kid = header
            .kid
            .ok_or_else(|| Error::MalformedToken("missing 'kid' in token header".to_string()))?;
        ensure_supported_algorithm(header.alg)?;

        let key = self.resolve_key(&kid).await?;

        let token_data = decode::<C>(token, key.decoding_key(), &validation_for(header.alg))?;
        let claims = token_data.claims;

        self.check_issuer(claims.iss())?;
        check_audience(claims.aud(), audiences)?;

        Ok(claims)
    }

    /// Get the signing key for `kid`, refreshing expired keys in lazy mode
    async fn resolve_key(&self, kid: &str) -> Result<Arc<SigningKey>> {
        if self.is_lazy_loading() {
            self.inner.key_store.ensure_fresh().await?;
        }

        self.inner.key_store.lookup(kid).await.ok_or_else(|| {
            debug!(kid = %kid, "No cached signing key for token");
            Error::PublicKeyNotFound(kid.to_string())
        })
    }

    fn check_issuer(&self, issuer: &str) -> Result<()> {
        if self.inner.issuers.iter().any(|accepted| accepted == issuer) {
            return Ok(());
        }
        Err(Error::InvalidIssuer(issuer.to_string()))
    }

    /// Set the loading behavior and stop any running periodic refresh
    ///
    /// - `true`: keys are fetched when needed during verification and cached,
    ///   which can make some verifications slower
    /// - `false`: keys are not fetched automatically; use
    ///   [`start_periodic_refresh`](Self::start_periodic_refresh) or refresh
    ///   them manually
    pub fn set_lazy_loading(&self, lazy: bool) {
        let mut scheduler = self.lock_scheduler();
        self.inner.lazy_load.store(lazy, Ordering::Release);
        if let Some(running) = scheduler.take() {
            running.stop();
        }
    }

    /// Refresh the keys from a background task every `period`
    ///
    /// Disables lazy loading and replaces a previously started refresh task.
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// Returns `Error::InvalidRefreshInterval` if `period` is zero, leaving
    /// the loading mode and any running task untouched
    pub fn start_periodic_refresh(&self, period: Duration) -> Result<()> {
        let mut scheduler = self.lock_scheduler();

        let started = RefreshScheduler::start(
            Arc::clone(&self.inner.key_store),
            period,
            self.inner.on_refresh_error.clone(),
        )?;
        self.inner.lazy_load.store(false, Ordering::Release);
        if let Some(previous) = scheduler.replace(started) {
            previous.stop();
        }
        Ok(())
    }

    /// Stop the background refresh task, if any, keeping the loading mode
    pub fn stop_periodic_refresh(&self) {
        if let Some(running) = self.lock_scheduler().take() {
            running.stop();
        }
    }

    pub fn is_lazy_loading(&self) -> bool {
        self.inner.lazy_load.load(Ordering::Acquire)
    }

    pub fn is_periodic_refresh_running(&self) -> bool {
        self.lock_scheduler()
            .as_ref()
            .is_some_and(RefreshScheduler::is_running)
    }

    /// Refresh the keys if they are expired
    /// Returns whether the cached keys were used
    pub async fn refresh_certs(&self) -> Result<bool> {
        self.inner.key_store.ensure_fresh().await
    }

    /// Refresh the keys regardless of their expiry
    pub async fn force_refresh_certs(&self) -> Result<()> {
        self.inner.key_store.force_refresh().await
    }

    pub fn key_store(&self) -> &KeyStore {
        &self.inner.key_store
    }

    pub fn issuers(&self) -> &[String] {
        &self.inner.issuers
    }

    fn lock_scheduler(&self) -> MutexGuard<'_, Option<RefreshScheduler>> {
        self.inner
            .scheduler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl VerifyIdToken for IdTokenVerifier {
    async fn decode<S>(&self, token: &str, audiences: &[S]) -> Result<GoogleClaims>
    where
        S: AsRef<str> + Sync,
    {
        self.decode_as::<GoogleClaims, S>(token, audiences).await
    }
}

fn ensure_supported_algorithm(alg: Algorithm) -> Result<()> {
    match alg {
        Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512 => Ok(()),
        other => Err(Error::AlgorithmNotSupported(format!("{other:?}"))),
    }
}

/// Signature, `exp` and `nbf` are checked by jsonwebtoken with its default leeway
fn validation_for(alg: Algorithm) -> Validation {
    let mut validation = Validation::new(alg);
    validation.validate_nbf = true;
    // audience is matched against the caller's candidates in check_audience
    validation.validate_aud = false;
    validation
}

fn check_audience<S: AsRef<str>>(audience: &Audience, candidates: &[S]) -> Result<()> {
    if audience.matches_any(candidates) {
        return Ok(());
    }
    Err(Error::InvalidAudience)
}
