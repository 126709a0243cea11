//! Background refresh of the signing keys.
//!
//! A [`RefreshScheduler`] owns a tokio task that forces a key refresh on a
//! fixed period until it is stopped or dropped. Failures are logged and
//! handed to the optional [`RefreshErrorHandler`]; they never end the loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;

use crate::config::RefreshErrorHandler;
use crate::error::Error;
use crate::error::Result;
use crate::key_store::KeyStore;

/// Handle to a running periodic refresh task
pub struct RefreshScheduler {
    shutdown_token: CancellationToken,
    handle: JoinHandle<()>,
}

impl RefreshScheduler {
    /// Spawn the refresh loop on the current tokio runtime
    ///
    /// The first refresh runs immediately, then one every `period`.
    ///
    /// # Errors
    /// Returns `Error::InvalidRefreshInterval` if `period` is zero
    ///
    /// # Panics
    /// Panics if called outside of a tokio runtime.
    pub fn start(
        store: Arc<KeyStore>,
        period: Duration,
        on_error: Option<RefreshErrorHandler>,
    ) -> Result<Self> {
        if period.is_zero() {
            return Err(Error::InvalidRefreshInterval(period));
        }

        let shutdown_token = CancellationToken::new();
        let token = shutdown_token.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!("Signing key refresh task shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Err(e) = store.force_refresh().await {
                            warn!(error = %e, "Periodic signing key refresh failed");
                            if let Some(on_error) = &on_error {
                                on_error(&e);
                            }
                        }
                    }
                }
            }
        });

        debug!(?period, "Signing key refresh task started");

        Ok(Self {
            shutdown_token,
            handle,
        })
    }

    /// Stop the refresh loop, calling it again has no effect
    pub fn stop(&self) {
        self.shutdown_token.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.shutdown_token.is_cancelled() && !self.handle.is_finished()
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
