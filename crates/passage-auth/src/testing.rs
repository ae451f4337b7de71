//! Test helpers for signing tokens against a mocked JWKS endpoint.
//!
//! Enabled for this crate's tests and, for downstream crates, by the
//! `test-utils` feature.

#![allow(clippy::missing_panics_doc)]

use base64::prelude::*;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use ring::rand::SystemRandom;
use ring::signature::{Ed25519KeyPair, KeyPair};
use serde::Serialize;

/// An Ed25519 keypair that signs test tokens and publishes itself as a JWK.
pub struct TestKeypair {
    kid: String,
    public_key: Vec<u8>,
    pkcs8: Vec<u8>,
}

impl TestKeypair {
    /// Generate a fresh keypair published under `kid`.
    #[must_use]
    pub fn generate(kid: &str) -> Self {
        let rng = SystemRandom::new();
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng).expect("failed to generate test key");
        let pair = Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).expect("failed to parse test key");

        Self {
            kid: kid.to_string(),
            public_key: pair.public_key().as_ref().to_vec(),
            pkcs8: pkcs8.as_ref().to_vec(),
        }
    }

    /// The key ID.
    #[must_use]
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Sign `claims` with an `EdDSA` header carrying this key's `kid`.
    #[must_use]
    pub fn sign<T: Serialize>(&self, claims: &T) -> String {
        let mut header = Header::new(Algorithm::EdDSA);
        header.kid = Some(self.kid.clone());
        self.sign_with_header(header, claims)
    }

    /// Sign `claims` with a caller-supplied header.
    #[must_use]
    pub fn sign_with_header<T: Serialize>(&self, header: Header, claims: &T) -> String {
        let key = EncodingKey::from_ed_der(&self.pkcs8);
        encode(&header, claims, &key).expect("failed to sign test token")
    }

    /// This key as a JWK object.
    #[must_use]
    pub fn jwk(&self) -> serde_json::Value {
        serde_json::json!({
            "kty": "OKP",
            "kid": self.kid,
            "crv": "Ed25519",
            "x": BASE64_URL_SAFE_NO_PAD.encode(&self.public_key),
            "alg": "EdDSA",
            "use": "sig"
        })
    }

    /// A JWKS document publishing `keys`.
    #[must_use]
    pub fn jwks(keys: &[&Self]) -> serde_json::Value {
        serde_json::json!({ "keys": keys.iter().map(|k| k.jwk()).collect::<Vec<_>>() })
    }
}

/// Claims for `sub` issued to `aud`, expiring `expires_in` seconds from now.
#[must_use]
pub fn claims(sub: &str, aud: &str, expires_in: i64) -> serde_json::Value {
    let now = Utc::now().timestamp();
    serde_json::json!({
        "sub": sub,
        "aud": aud,
        "iat": now,
        "exp": now + expires_in,
    })
}
