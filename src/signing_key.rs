use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::DecodingKey;
use rsa::traits::PublicKeyParts;
use rsa::BigUint;
use rsa::RsaPublicKey;
use serde::Deserialize;

use crate::error::key_set_decode_error;
use crate::error::Result;

/// Key set document returned by the certificate endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct KeySetDocument {
    #[serde(default)]
    pub(crate) keys: Vec<KeyRecord>,
}

/// A single record of the key set, fields default to empty when absent
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct KeyRecord {
    pub(crate) kty: String,
    pub(crate) alg: String,
    #[serde(rename = "use")]
    pub(crate) key_use: String,
    pub(crate) kid: String,
    pub(crate) n: String,
    pub(crate) e: String,
}

impl KeyRecord {
    /// RSA signature keys with a key id are the only ones tokens can select
    pub(crate) fn is_rsa_signing_key(&self) -> bool {
        self.kty == "RSA" && self.key_use == "sig" && !self.kid.is_empty()
    }
}

/// A provider public key, selected by its key id
pub struct SigningKey {
    kid: String,
    algorithm: Option<String>,
    public_key: RsaPublicKey,
    decoding_key: DecodingKey,
}

impl SigningKey {
    /// Build a key from the unpadded base64url modulus and exponent
    pub(crate) fn from_record(record: &KeyRecord) -> Result<Self> {
        let n = URL_SAFE_NO_PAD
            .decode(&record.n)
            .map_err(|err| key_set_decode_error(format!("key {}: modulus: {err}", record.kid)))?;
        let e = URL_SAFE_NO_PAD
            .decode(&record.e)
            .map_err(|err| key_set_decode_error(format!("key {}: exponent: {err}", record.kid)))?;

        let public_key = RsaPublicKey::new(BigUint::from_bytes_be(&n), BigUint::from_bytes_be(&e))
            .map_err(|err| key_set_decode_error(format!("key {}: {err}", record.kid)))?;

        // minimal big-endian encoding, ring rejects moduli with leading zeros
        let decoding_key = DecodingKey::from_rsa_raw_components(
            &public_key.n().to_bytes_be(),
            &public_key.e().to_bytes_be(),
        );

        Ok(Self {
            kid: record.kid.clone(),
            algorithm: (!record.alg.is_empty()).then(|| record.alg.clone()),
            public_key,
            decoding_key,
        })
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Algorithm tag advertised by the provider, e.g. `RS256`
    pub fn algorithm(&self) -> Option<&str> {
        self.algorithm.as_deref()
    }

    pub fn modulus(&self) -> &BigUint {
        self.public_key.n()
    }

    pub fn exponent(&self) -> &BigUint {
        self.public_key.e()
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .field("bits", &(self.public_key.size() * 8))
            .finish()
    }
}
