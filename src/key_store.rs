use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use reqwest::header::HeaderMap;
use reqwest::header::CACHE_CONTROL;
use reqwest::Client;
use tokio::sync::Mutex;
use tokio::sync::RwLock;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::error::key_set_decode_error;
use crate::error::Error;
use crate::error::Result;
use crate::signing_key::KeySetDocument;
use crate::signing_key::SigningKey;

/// Keys of one successful fetch together with their expiry
struct KeySnapshot {
    keys: HashMap<String, Arc<SigningKey>>,
    fetched_at: Instant,
    expires_at: Instant,
}

impl KeySnapshot {
    /// Never fetched, already expired
    fn empty() -> Self {
        let now = Instant::now();
        Self {
            keys: HashMap::new(),
            fetched_at: now,
            expires_at: now,
        }
    }

    fn is_fresh(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Cache of the provider's signing keys with expiry taken from `cache-control`
///
/// The snapshot is swapped as a whole on every successful refresh, so readers
/// see either the previous or the new key set, never a mix. A failed refresh
/// keeps the previous snapshot.
pub struct KeyStore {
    snapshot: RwLock<Arc<KeySnapshot>>,
    refresh_lock: Mutex<()>,
    /// Completed refresh attempts, successful or not
    attempts: AtomicU64,
    certs_url: String,
    default_ttl: Duration,
    http_timeout: Duration,
    client: Client,
}

impl KeyStore {
    pub(crate) fn new(
        certs_url: String,
        default_ttl: Duration,
        http_timeout: Duration,
        client: Client,
    ) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(KeySnapshot::empty())),
            refresh_lock: Mutex::new(()),
            attempts: AtomicU64::new(0),
            certs_url,
            default_ttl,
            http_timeout,
            client,
        }
    }

    /// Get the key with the given key id from the current snapshot
    pub async fn lookup(&self, kid: &str) -> Option<Arc<SigningKey>> {
        self.snapshot.read().await.keys.get(kid).cloned()
    }

    /// Refresh the keys if they are expired
    ///
    /// Returns `true` when this call made no request and the cached keys are
    /// used as they are. That is the case when the keys are still fresh, and
    /// also when another refresh completed while this call was waiting for
    /// it: a failed attempt is not repeated for every queued caller, they
    /// keep the previous keys instead.
    pub async fn ensure_fresh(&self) -> Result<bool> {
        if self.is_fresh().await {
            return Ok(true);
        }

        let seen_attempts = self.attempts.load(Ordering::Acquire);
        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited
        if self.is_fresh().await {
            debug!(url = %self.certs_url, "Signing keys refreshed concurrently");
            return Ok(true);
        }
        if self.attempts.load(Ordering::Acquire) != seen_attempts {
            debug!(url = %self.certs_url, "Concurrent refresh failed, using cached signing keys");
            return Ok(true);
        }

        self.refresh_locked().await?;
        Ok(false)
    }

    /// Refresh the keys regardless of their expiry
    pub async fn force_refresh(&self) -> Result<()> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    /// Whether the cached keys are still within their expiry
    pub async fn is_fresh(&self) -> bool {
        self.snapshot.read().await.is_fresh()
    }

    /// Instant after which the cached keys are considered stale
    pub async fn expires_at(&self) -> Instant {
        self.snapshot.read().await.expires_at
    }

    /// Instant of the last successful fetch, or of construction if none happened
    pub async fn fetched_at(&self) -> Instant {
        self.snapshot.read().await.fetched_at
    }

    /// Key ids of the current snapshot, in no particular order
    pub async fn key_ids(&self) -> Vec<String> {
        self.snapshot.read().await.keys.keys().cloned().collect()
    }

    /// Number of cached keys
    pub async fn len(&self) -> usize {
        self.snapshot.read().await.keys.len()
    }

    /// Whether no key is cached, either never fetched or none usable yet
    pub async fn is_empty(&self) -> bool {
        self.snapshot.read().await.keys.is_empty()
    }

    /// Fetch and install a new snapshot, callers must hold `refresh_lock`
    async fn refresh_locked(&self) -> Result<()> {
        let fetched = self.fetch_snapshot().await;
        self.attempts.fetch_add(1, Ordering::AcqRel);

        let snapshot = fetched.inspect_err(|e| {
            warn!(url = %self.certs_url, error = %e, "Failed to refresh signing keys");
        })?;

        info!(
            url = %self.certs_url,
            key_count = snapshot.keys.len(),
            ttl_secs = snapshot.expires_at.duration_since(snapshot.fetched_at).as_secs(),
            "Signing keys refreshed"
        );

        *self.snapshot.write().await = Arc::new(snapshot);
        Ok(())
    }

    async fn fetch_snapshot(&self) -> Result<KeySnapshot> {
        debug!(url = %self.certs_url, "Fetching signing keys");

        let response = self
            .client
            .get(&self.certs_url)
            .timeout(self.http_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::UnexpectedStatus(response.status()));
        }

        let fetched_at = Instant::now();
        let ttl = cache_ttl(response.headers()).unwrap_or(self.default_ttl);

        let body = response.bytes().await?;
        let document: KeySetDocument =
            serde_json::from_slice(&body).map_err(key_set_decode_error)?;

        let mut keys = HashMap::new();
        for record in &document.keys {
            if !record.is_rsa_signing_key() {
                debug!(kid = %record.kid, kty = %record.kty, key_use = %record.key_use, "Skipping key");
                continue;
            }

            let key = SigningKey::from_record(record)?;
            keys.insert(record.kid.clone(), Arc::new(key));
        }

        if keys.is_empty() {
            return Err(Error::NoKeysFound(self.certs_url.clone()));
        }

        Ok(KeySnapshot {
            keys,
            fetched_at,
            expires_at: fetched_at + ttl,
        })
    }
}

/// Read the `max-age` directive of the `cache-control` header
///
/// Returns `None` when the header is absent, not valid text, has no
/// `max-age` directive or its value is not a non-negative integer.
fn cache_ttl(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(CACHE_CONTROL)?.to_str().ok()?;
    parse_max_age(value)
}

fn parse_max_age(cache_control: &str) -> Option<Duration> {
    cache_control
        .split(',')
        .find_map(|directive| {
            let (name, value) = directive.trim().split_once('=')?;
            name.trim()
                .eq_ignore_ascii_case("max-age")
                .then(|| value.trim().trim_matches('"'))
        })
        .and_then(|seconds| seconds.parse::<u64>().ok())
        .map(Duration::from_secs)
}
