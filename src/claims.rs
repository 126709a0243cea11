use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Trait for accessing the standard claims the verifier checks
///
/// Claims types decoded through [`IdTokenVerifier::decode_as`](crate::IdTokenVerifier::decode_as)
/// must implement this trait so that issuer and audience can be validated
/// generically. Signature, expiry and not-before are checked before the claims
/// ever reach these accessors.
pub trait StandardClaims {
    /// Get the issuer (iss) claim
    fn iss(&self) -> &str;

    /// Get the subject (sub) claim
    fn sub(&self) -> &str;

    /// Get the audience (aud) claim
    fn aud(&self) -> &Audience;

    /// Get the expiration time (exp) claim as a Unix timestamp
    fn exp(&self) -> i64;

    /// Get the issued at (iat) claim as a Unix timestamp, if present
    fn iat(&self) -> Option<i64> {
        None
    }
}

/// The `aud` claim, which may be a single string or a list of strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

impl Default for Audience {
    /// No audience at all, as for a token without `aud`
    fn default() -> Self {
        Audience::Multiple(Vec::new())
    }
}

impl Audience {
    /// Iterate over every audience value
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let values: &[String] = match self {
            Audience::Single(value) => std::slice::from_ref(value),
            Audience::Multiple(values) => values,
        };
        values.iter().map(String::as_str)
    }

    /// Whether at least one value equals one of the candidates
    /// An empty candidate list never matches
    pub fn matches_any<S: AsRef<str>>(&self, candidates: &[S]) -> bool {
        self.iter()
            .any(|value| candidates.iter().any(|candidate| candidate.as_ref() == value))
    }
}

/// Claims of a validated Google ID token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleClaims {
    /// Issuer - `accounts.google.com` or `https://accounts.google.com`
    /// Empty when the token carries none, which no accepted issuer matches
    #[serde(default)]
    pub iss: String,
    /// Subject - the stable Google account identifier
    pub sub: String,
    /// Audience - the OAuth client id(s) the token was issued for
    /// Empty when the token carries none, which no candidate matches
    #[serde(default)]
    pub aud: Audience,
    /// Issued at as Unix timestamp
    pub iat: i64,
    /// Expiration time as Unix timestamp
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    /// Authorized party - the client id of the presenter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// Hosted domain of a Google Workspace account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_hash: Option<String>,
}

impl GoogleClaims {
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

impl StandardClaims for GoogleClaims {
    fn iss(&self) -> &str {
        &self.iss
    }

    fn sub(&self) -> &str {
        &self.sub
    }

    fn aud(&self) -> &Audience {
        &self.aud
    }

    fn exp(&self) -> i64 {
        self.exp
    }

    fn iat(&self) -> Option<i64> {
        Some(self.iat)
    }
}
