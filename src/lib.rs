//! # google-id-token-verifier
//!
//! Verification of Google Sign-In ID tokens against Google's published
//! signing keys.
//!
//! ## Features
//!
//! - RS256/RS384/RS512 signature verification with keys fetched from
//!   `https://www.googleapis.com/oauth2/v3/certs`
//! - Key caching with the expiry announced by the `cache-control` header
//!   (two hours when absent)
//! - Lazy refresh on the verification path, or periodic refresh from a
//!   background task
//! - Expiration, not-before, issuer and audience validation
//!
//! ## Example
//!
//! ```rust,no_run
//! use google_id_token_verifier::{IdTokenVerifier, VerifyIdToken};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let verifier = IdTokenVerifier::google().await?;
//!
//!     let token = "eyJhbGciOiJSUzI1NiIsImtpZCI6Ij...";
//!     let claims = verifier
//!         .decode(token, &["1234.apps.googleusercontent.com"])
//!         .await?;
//!
//!     println!("Subject: {}", claims.sub);
//!     println!("Email: {:?}", claims.email);
//!
//!     Ok(())
//! }
//! ```

mod claims;
mod config;
mod error;
mod key_store;
mod scheduler;
mod signing_key;
mod verifier;

// Re-exports for public API
pub use claims::Audience;
pub use claims::GoogleClaims;
pub use claims::StandardClaims;
pub use config::RefreshErrorHandler;
pub use config::VerifierConfig;
pub use config::GOOGLE_CERTS_URL;
pub use config::GOOGLE_ISSUERS;
pub use error::Error;
pub use error::Result;
pub use key_store::KeyStore;
pub use scheduler::RefreshScheduler;
pub use signing_key::SigningKey;
pub use verifier::IdTokenVerifier;
pub use verifier::VerifyIdToken;
