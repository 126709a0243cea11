use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::error::Error;
use crate::error::Result;

/// URL exposed by Google with its current RSA signing keys
pub const GOOGLE_CERTS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";

/// Issuers Google sets on its ID tokens, with and without scheme
pub const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

const DEFAULT_CACHE_TTL_SECS: u64 = 2 * 60 * 60;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Callback invoked with every failed background refresh
pub type RefreshErrorHandler = Arc<dyn Fn(&Error) + Send + Sync>;

/// Configuration for the ID token verifier
#[derive(Clone)]
pub struct VerifierConfig {
    /// Endpoint serving the provider's key set
    pub(crate) certs_url: String,
    /// Accepted issuers - the token's issuer must equal one of these
    pub(crate) issuers: Vec<String>,
    /// Check key freshness on the verification path
    pub(crate) lazy_load: bool,
    /// Keep keys warm from a background task at this interval
    pub(crate) refresh_interval: Option<Duration>,
    /// Upper bound for a single key set fetch
    pub(crate) http_timeout: Duration,
    /// Time-to-live used when the response carries no usable `max-age`
    pub(crate) default_cache_ttl: Duration,
    /// Optional custom HTTP client for fetching keys
    /// If not provided, a default client will be created
    pub(crate) http_client: Option<Client>,
    pub(crate) on_refresh_error: Option<RefreshErrorHandler>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            certs_url: GOOGLE_CERTS_URL.to_string(),
            issuers: GOOGLE_ISSUERS.iter().map(|issuer| issuer.to_string()).collect(),
            lazy_load: true,
            refresh_interval: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            default_cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            http_client: None,
            on_refresh_error: None,
        }
    }
}

impl fmt::Debug for VerifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifierConfig")
            .field("certs_url", &self.certs_url)
            .field("issuers", &self.issuers)
            .field("lazy_load", &self.lazy_load)
            .field("refresh_interval", &self.refresh_interval)
            .field("http_timeout", &self.http_timeout)
            .field("default_cache_ttl", &self.default_cache_ttl)
            .field("http_client", &self.http_client)
            .field("on_refresh_error", &self.on_refresh_error.is_some())
            .finish()
    }
}

impl VerifierConfig {
    /// Create a configuration for Google Sign-In tokens with lazy key loading
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the URL the key set is fetched from
    pub fn with_certs_url(mut self, url: impl Into<String>) -> Self {
        self.certs_url = url.into();
        self
    }

    /// Replace the accepted issuers
    /// Issuers are compared case-sensitively, in the given order
    ///
    /// # Errors
    /// Returns `Error::NoIssuersConfigured` if the issuers vector is empty
    pub fn with_issuers(mut self, issuers: Vec<String>) -> Result<Self> {
        if issuers.is_empty() {
            return Err(Error::NoIssuersConfigured);
        }
        self.issuers = issuers;
        Ok(self)
    }

    /// Add a single accepted issuer
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuers.push(issuer.into());
        self
    }

    /// Enable or disable the freshness check on the verification path
    pub fn with_lazy_loading(mut self, lazy: bool) -> Self {
        self.lazy_load = lazy;
        self
    }

    /// Refresh keys in the background every `interval`
    /// This disables lazy loading once the verifier is constructed, which
    /// fails if `interval` is zero
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = Some(interval);
        self
    }

    /// Set the timeout applied to every key set request
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Set the TTL used when the `cache-control` header has no valid `max-age`
    pub fn with_default_cache_ttl(mut self, ttl: Duration) -> Self {
        self.default_cache_ttl = ttl;
        self
    }

    /// Set a custom HTTP client
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Observe failures of the background refresh task
    pub fn with_refresh_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.on_refresh_error = Some(Arc::new(handler));
        self
    }
}
