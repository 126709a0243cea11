use std::fmt::Debug;

use jsonwebtoken::errors::ErrorKind;
use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to fetch signing keys: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Signing keys endpoint returned status {0}")]
    UnexpectedStatus(StatusCode),
    #[error("Failed to decode signing keys: {0}")]
    KeySetDecode(String),
    #[error("No usable signing keys were found when fetching {0}")]
    NoKeysFound(String),
    #[error("Malformed token: {0}")]
    MalformedToken(String),
    #[error("Only RSA PKCS#1 v1.5 algorithms are supported, got: {0}")]
    AlgorithmNotSupported(String),
    #[error("Public key for key id {0:?} not found")]
    PublicKeyNotFound(String),
    #[error("Token signature is invalid")]
    InvalidSignature,
    #[error("The provided token has expired")]
    TokenExpired,
    #[error("The provided token is not valid yet")]
    TokenNotYetValid,
    #[error("Issuer not provided or invalid. Provided issuer: {0}")]
    InvalidIssuer(String),
    #[error("Audience not provided or invalid")]
    InvalidAudience,
    #[error("JWT error: {0}")]
    Jwt(jsonwebtoken::errors::Error),
    #[error("No issuers configured - at least one accepted issuer must be configured")]
    NoIssuersConfigured,
    #[error("Refresh interval must be greater than zero, got {0:?}")]
    InvalidRefreshInterval(std::time::Duration),
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        match error.kind() {
            ErrorKind::InvalidSignature => return Error::InvalidSignature,
            ErrorKind::ExpiredSignature => return Error::TokenExpired,
            ErrorKind::ImmatureSignature => return Error::TokenNotYetValid,
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_)
            | ErrorKind::MissingRequiredClaim(_) => {
                return Error::MalformedToken(error.to_string())
            }
            _ => {}
        }
        Error::Jwt(error)
    }
}

pub(crate) fn malformed_header_error(error: jsonwebtoken::errors::Error) -> Error {
    Error::MalformedToken(format!("Failed to decode token header: {error}"))
}

pub(crate) fn key_set_decode_error(error: impl std::fmt::Display) -> Error {
    Error::KeySetDecode(error.to_string())
}
