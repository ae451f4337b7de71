//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! [`JwksCache`] tracks one or more JWKS sources by URL. Each source holds an
//! immutable [`SigningKeySet`] behind an `Arc`; a refresh builds a complete new
//! set and installs it with a single pointer swap, so readers observe either
//! the previous set or the next one and never a partial update.
//!
//! Lookups never touch the network. [`JwksCache::resolve_key`] adds the
//! rotation path: on a `kid` miss it refreshes the source once and retries,
//! and a second miss is final.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::prelude::*;
use jsonwebtoken::{Algorithm, DecodingKey};
use parking_lot::RwLock;
use reqwest::Url;
use serde::Deserialize;
use tokio::task::JoinHandle;

use crate::error::{AuthError, Result};

/// Default timeout for a JWKS fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

const RSA_ALGORITHMS: [Algorithm; 6] = [
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
];

/// JWKS document as served by the authentication server.
#[derive(Debug, Deserialize)]
pub struct JwksResponse {
    /// The list of keys.
    pub keys: Vec<JwkKey>,
}

/// A single JWK (JSON Web Key).
#[derive(Debug, Default, Deserialize)]
pub struct JwkKey {
    /// Key type (`RSA`, `EC` or `OKP`).
    pub kty: String,
    /// Key ID.
    #[serde(default)]
    pub kid: Option<String>,
    /// Key use (e.g., "sig").
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,
    /// Algorithm (e.g., `RS256`).
    #[serde(default)]
    pub alg: Option<String>,
    /// Curve for `EC` and `OKP` keys.
    #[serde(default)]
    pub crv: Option<String>,
    /// X coordinate (`EC`) or public key (`OKP`), base64url encoded.
    #[serde(default)]
    pub x: Option<String>,
    /// Y coordinate (`EC`), base64url encoded.
    #[serde(default)]
    pub y: Option<String>,
    /// RSA modulus, base64url encoded.
    #[serde(default)]
    pub n: Option<String>,
    /// RSA public exponent, base64url encoded.
    #[serde(default)]
    pub e: Option<String>,
}

/// A public key usable to verify token signatures.
#[derive(Clone)]
pub struct SigningKey {
    kid: String,
    algorithms: Vec<Algorithm>,
    key: DecodingKey,
}

impl SigningKey {
    /// The key ID.
    #[must_use]
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// The primary algorithm for this key.
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithms[0]
    }

    /// Whether a token declaring `alg` may be verified with this key.
    ///
    /// A key whose JWK declares `alg` accepts only that algorithm. An RSA key
    /// without `alg` accepts any RSA signature scheme.
    #[must_use]
    pub fn accepts(&self, alg: Algorithm) -> bool {
        self.algorithms.contains(&alg)
    }

    /// The decoding key material.
    #[must_use]
    pub const fn decoding_key(&self) -> &DecodingKey {
        &self.key
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("algorithms", &self.algorithms)
            .finish_non_exhaustive()
    }
}

/// An immutable set of signing keys indexed by key ID.
#[derive(Debug)]
pub struct SigningKeySet {
    keys: HashMap<String, SigningKey>,
    fetched_at: Instant,
}

impl SigningKeySet {
    /// Build a key set from a JWKS document.
    ///
    /// Keys without a `kid`, keys not meant for signatures, and keys of an
    /// unsupported type or curve are skipped.
    ///
    /// # Errors
    ///
    /// Returns `FetchFailed` if a key of a supported type is malformed.
    pub fn from_jwks(jwks: JwksResponse) -> Result<Self> {
        let mut keys = HashMap::new();

        for jwk in jwks.keys {
            let Some(kid) = jwk.kid.clone() else {
                tracing::debug!(kty = %jwk.kty, "Skipping JWK without kid");
                continue;
            };
            if jwk.key_use.as_deref().is_some_and(|u| u != "sig") {
                tracing::debug!(kid = %kid, "Skipping non-signature JWK");
                continue;
            }
            if let Some((algorithms, key)) = parse_key(&kid, &jwk)? {
                keys.insert(
                    kid.clone(),
                    SigningKey {
                        kid,
                        algorithms,
                        key,
                    },
                );
            }
        }

        Ok(Self {
            keys,
            fetched_at: Instant::now(),
        })
    }

    /// Look up a key by ID.
    #[must_use]
    pub fn get(&self, kid: &str) -> Option<&SigningKey> {
        self.keys.get(kid)
    }

    /// The key IDs in this set.
    pub fn kids(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    /// Number of keys in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the set holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// When this set was fetched.
    #[must_use]
    pub const fn fetched_at(&self) -> Instant {
        self.fetched_at
    }
}

/// Parse a JWK into its accepted algorithms and a `DecodingKey`.
///
/// Returns `Ok(None)` for keys this crate does not verify with.
fn parse_key(kid: &str, jwk: &JwkKey) -> Result<Option<(Vec<Algorithm>, DecodingKey)>> {
    let malformed = |reason: &str| AuthError::FetchFailed(format!("malformed JWK {kid}: {reason}"));

    let declared = match jwk.alg.as_deref() {
        Some(alg) => match Algorithm::from_str(alg) {
            Ok(alg) => Some(alg),
            Err(_) => {
                tracing::warn!(kid = %kid, alg = alg, "Skipping JWK with unknown algorithm");
                return Ok(None);
            }
        },
        None => None,
    };

    match jwk.kty.as_str() {
        "RSA" => {
            let n = jwk.n.as_deref().ok_or_else(|| malformed("missing n"))?;
            let e = jwk.e.as_deref().ok_or_else(|| malformed("missing e"))?;
            let algorithms = match declared {
                Some(alg) if RSA_ALGORITHMS.contains(&alg) => vec![alg],
                Some(_) => return Err(malformed("alg does not match kty RSA")),
                None => RSA_ALGORITHMS.to_vec(),
            };
            let key = DecodingKey::from_rsa_components(n, e)
                .map_err(|err| malformed(&err.to_string()))?;
            Ok(Some((algorithms, key)))
        }
        "EC" => {
            let expected = match jwk.crv.as_deref() {
                Some("P-256") => Algorithm::ES256,
                Some("P-384") => Algorithm::ES384,
                crv => {
                    tracing::warn!(kid = %kid, crv = ?crv, "Unsupported EC curve");
                    return Ok(None);
                }
            };
            if declared.is_some_and(|alg| alg != expected) {
                return Err(malformed("alg does not match curve"));
            }
            let x = jwk.x.as_deref().ok_or_else(|| malformed("missing x"))?;
            let y = jwk.y.as_deref().ok_or_else(|| malformed("missing y"))?;
            let key = DecodingKey::from_ec_components(x, y)
                .map_err(|err| malformed(&err.to_string()))?;
            Ok(Some((vec![expected], key)))
        }
        "OKP" => {
            let crv = jwk.crv.as_deref().unwrap_or("");
            if crv != "Ed25519" {
                tracing::warn!(kid = %kid, crv = crv, "Unsupported OKP curve");
                return Ok(None);
            }
            if declared.is_some_and(|alg| alg != Algorithm::EdDSA) {
                return Err(malformed("alg does not match curve"));
            }
            let x = jwk.x.as_deref().ok_or_else(|| malformed("missing x"))?;
            let public_key = BASE64_URL_SAFE_NO_PAD
                .decode(x)
                .map_err(|err| malformed(&format!("invalid base64: {err}")))?;
            Ok(Some((
                vec![Algorithm::EdDSA],
                DecodingKey::from_ed_der(&public_key),
            )))
        }
        other => {
            tracing::warn!(kid = %kid, kty = other, "Unknown key type");
            Ok(None)
        }
    }
}

/// A registered JWKS source.
struct CacheEntry {
    url: Url,
    keys: RwLock<Option<Arc<SigningKeySet>>>,
    refresh_lock: tokio::sync::Mutex<()>,
}

impl CacheEntry {
    fn new(url: Url) -> Self {
        Self {
            url,
            keys: RwLock::new(None),
            refresh_lock: tokio::sync::Mutex::new(()),
        }
    }

    fn snapshot(&self) -> Option<Arc<SigningKeySet>> {
        self.keys.read().clone()
    }

    fn install(&self, set: Arc<SigningKeySet>) {
        *self.keys.write() = Some(set);
    }
}

/// In-memory cache of signing keys, per JWKS source URL.
pub struct JwksCache {
    client: reqwest::Client,
    entries: RwLock<HashMap<String, Arc<CacheEntry>>>,
}

impl JwksCache {
    /// Create a cache whose fetches time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Internal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self::with_client(client))
    }

    /// Create a cache using an existing HTTP client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Begin tracking a JWKS source.
    ///
    /// Registration is local bookkeeping; no request is made. Registering a
    /// URL twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `SourceUnreachable` if the URL cannot be parsed.
    pub fn register(&self, url: &str) -> Result<()> {
        self.entry_or_register(url).map(|_| ())
    }

    /// Whether `url` has been registered.
    #[must_use]
    pub fn is_registered(&self, url: &str) -> bool {
        self.entries.read().contains_key(url)
    }

    fn entry_or_register(&self, url: &str) -> Result<Arc<CacheEntry>> {
        if let Some(entry) = self.entries.read().get(url) {
            return Ok(Arc::clone(entry));
        }

        let parsed = Url::parse(url)
            .map_err(|e| AuthError::SourceUnreachable(format!("invalid JWKS URL {url}: {e}")))?;

        let mut entries = self.entries.write();
        let entry = entries
            .entry(url.to_string())
            .or_insert_with(|| {
                tracing::debug!(url = %url, "Registered JWKS source");
                Arc::new(CacheEntry::new(parsed))
            });
        Ok(Arc::clone(entry))
    }

    /// Fetch the JWKS document for `url` and replace its cached key set.
    ///
    /// An unregistered URL is registered first. Refreshes of the same URL are
    /// serialized.
    ///
    /// # Errors
    ///
    /// Returns `FetchFailed` on a transport error, a non-2xx status, or a
    /// malformed document. The previous key set stays installed on failure.
    pub async fn refresh(&self, url: &str) -> Result<Arc<SigningKeySet>> {
        let entry = self.entry_or_register(url)?;
        let _guard = entry.refresh_lock.lock().await;
        self.fetch_and_install(&entry).await
    }

    /// The current key set for `url`, if it has been fetched.
    #[must_use]
    pub fn key_set(&self, url: &str) -> Option<Arc<SigningKeySet>> {
        self.entries.read().get(url)?.snapshot()
    }

    /// Look up a cached key without touching the network.
    #[must_use]
    pub fn lookup_key_id(&self, url: &str, kid: &str) -> Option<SigningKey> {
        self.key_set(url)?.get(kid).cloned()
    }

    /// Resolve a key, refreshing the source once if the key is not cached.
    ///
    /// # Errors
    ///
    /// Returns `UnknownKeyId` if the key is still missing after the refresh,
    /// or the refresh error if the fetch fails.
    pub async fn resolve_key(&self, url: &str, kid: &str) -> Result<SigningKey> {
        let entry = self.entry_or_register(url)?;
        let seen = entry.snapshot();

        if let Some(key) = seen.as_ref().and_then(|set| set.get(kid)) {
            return Ok(key.clone());
        }

        tracing::debug!(url = %url, kid = %kid, "Key not cached, refreshing JWKS");
        let refreshed = self.refresh_after_miss(&entry, seen).await?;

        refreshed.get(kid).cloned().ok_or_else(|| {
            tracing::debug!(url = %url, kid = %kid, "Key not found in JWKS after refresh");
            AuthError::UnknownKeyId(kid.to_string())
        })
    }

    /// Refresh unless another caller already installed a newer set while we
    /// waited for the lock.
    async fn refresh_after_miss(
        &self,
        entry: &CacheEntry,
        seen: Option<Arc<SigningKeySet>>,
    ) -> Result<Arc<SigningKeySet>> {
        let _guard = entry.refresh_lock.lock().await;

        match (seen, entry.snapshot()) {
            (Some(seen), Some(current)) if !Arc::ptr_eq(&seen, &current) => Ok(current),
            (None, Some(current)) => Ok(current),
            _ => self.fetch_and_install(entry).await,
        }
    }

    async fn fetch_and_install(&self, entry: &CacheEntry) -> Result<Arc<SigningKeySet>> {
        let set = Arc::new(self.fetch(&entry.url).await?);
        entry.install(Arc::clone(&set));
        tracing::info!(url = %entry.url, count = set.len(), "Installed JWKS key set");
        Ok(set)
    }

    async fn fetch(&self, url: &Url) -> Result<SigningKeySet> {
        tracing::debug!(url = %url, "Fetching JWKS");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| AuthError::FetchFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::FetchFailed(format!("{url} returned {status}")));
        }

        let jwks: JwksResponse = response
            .json()
            .await
            .map_err(|e| AuthError::FetchFailed(format!("invalid JWKS document: {e}")))?;

        SigningKeySet::from_jwks(jwks)
    }

    /// Refresh `url` every `interval` on a background task.
    ///
    /// Failures are logged and the previous key set stays in place. Abort the
    /// returned handle to stop refreshing.
    ///
    /// # Errors
    ///
    /// Returns `SourceUnreachable` if the URL cannot be parsed, or `Internal`
    /// if `interval` is zero.
    pub fn spawn_periodic_refresh(
        self: &Arc<Self>,
        url: &str,
        interval: Duration,
    ) -> Result<JoinHandle<()>> {
        if interval.is_zero() {
            return Err(AuthError::Internal(
                "JWKS refresh interval must be non-zero".to_string(),
            ));
        }
        self.register(url)?;

        let cache = Arc::clone(self);
        let url = url.to_string();
        Ok(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = cache.refresh(&url).await {
                    tracing::warn!(url = %url, error = %e, "Periodic JWKS refresh failed");
                }
            }
        }))
    }
}

impl fmt::Debug for JwksCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwksCache")
            .field("sources", &self.entries.read().keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestKeypair;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const JWKS_PATH: &str = "/v1/apps/app123/.well-known/jwks.json";

    // RFC 7517 appendix A.1 example RSA key.
    const RSA_N: &str = "0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM78LhWx4cbbfAAtVT86zwu1RK7aPFFxuhDR1L6tSoc_BJECPebWKRXjBZCiFV4n3oknjhMstn64tZ_2W-5JsGY4Hc5n9yBXArwl93lqt7_RN5w6Cf0h4QyQ5v-65YGjQR0_FDW2QvzqY368QQMicAtaSqzs8KJZgnYb9c7d0zgdAZHzu6qMQvRL5hajrn1n91CbOpbISD08qNLyrdkt-bFTWhAI4vMQFh6WeZu0fM4lFd2NcRwr3XPksINHaQ-G_xBniIqbw0Ls1jF44-csFCur-kEgU8awapJzKnqDKgw";
    const RSA_E: &str = "AQAB";

    fn rsa_jwk(kid: &str) -> JwkKey {
        JwkKey {
            kty: "RSA".to_string(),
            kid: Some(kid.to_string()),
            key_use: Some("sig".to_string()),
            alg: Some("RS256".to_string()),
            n: Some(RSA_N.to_string()),
            e: Some(RSA_E.to_string()),
            ..JwkKey::default()
        }
    }

    fn cache() -> JwksCache {
        JwksCache::new(DEFAULT_FETCH_TIMEOUT).unwrap()
    }

    fn jwks_url(server: &MockServer) -> String {
        format!("{}{JWKS_PATH}", server.uri())
    }

    #[test]
    fn parse_ed25519_key() {
        let key = JwkKey {
            kty: "OKP".to_string(),
            crv: Some("Ed25519".to_string()),
            x: Some("11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo".to_string()),
            kid: Some("test-key".to_string()),
            key_use: Some("sig".to_string()),
            alg: Some("EdDSA".to_string()),
            ..JwkKey::default()
        };

        let (algorithms, _) = parse_key("test-key", &key).unwrap().unwrap();
        assert_eq!(algorithms, vec![Algorithm::EdDSA]);
    }

    #[test]
    fn parse_rsa_key() {
        let (algorithms, _) = parse_key("rsa-1", &rsa_jwk("rsa-1")).unwrap().unwrap();
        assert_eq!(algorithms, vec![Algorithm::RS256]);
    }

    #[test]
    fn rsa_key_without_alg_accepts_rsa_family() {
        let mut jwk = rsa_jwk("rsa-1");
        jwk.alg = None;
        let set = SigningKeySet::from_jwks(JwksResponse { keys: vec![jwk] }).unwrap();
        let key = set.get("rsa-1").unwrap();

        assert_eq!(key.algorithm(), Algorithm::RS256);
        assert!(key.accepts(Algorithm::PS384));
        assert!(!key.accepts(Algorithm::ES256));
        assert!(!key.accepts(Algorithm::HS256));
    }

    #[test]
    fn reject_rsa_key_missing_modulus() {
        let mut jwk = rsa_jwk("rsa-1");
        jwk.n = None;
        assert!(matches!(
            parse_key("rsa-1", &jwk),
            Err(AuthError::FetchFailed(_))
        ));
    }

    #[test]
    fn reject_alg_not_matching_key_type() {
        let mut jwk = rsa_jwk("rsa-1");
        jwk.alg = Some("ES256".to_string());
        assert!(matches!(
            parse_key("rsa-1", &jwk),
            Err(AuthError::FetchFailed(_))
        ));
    }

    #[test]
    fn skip_unsupported_curve() {
        let key = JwkKey {
            kty: "OKP".to_string(),
            crv: Some("X25519".to_string()),
            x: Some("somekey".to_string()),
            kid: Some("test-key".to_string()),
            ..JwkKey::default()
        };

        assert!(parse_key("test-key", &key).unwrap().is_none());
    }

    #[test]
    fn skip_keys_without_kid_or_not_for_signing() {
        let mut no_kid = rsa_jwk("ignored");
        no_kid.kid = None;
        let mut enc = rsa_jwk("enc-1");
        enc.key_use = Some("enc".to_string());

        let set = SigningKeySet::from_jwks(JwksResponse {
            keys: vec![no_kid, enc, rsa_jwk("sig-1")],
        })
        .unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(set.kids().collect::<Vec<_>>(), vec!["sig-1"]);
    }

    #[test]
    fn register_rejects_invalid_url() {
        let err = cache().register("not a url").unwrap_err();
        assert!(matches!(err, AuthError::SourceUnreachable(_)));
    }

    #[test]
    fn register_is_local_and_idempotent() {
        let cache = cache();
        let url = "https://auth.example.test/v1/apps/a/.well-known/jwks.json";
        cache.register(url).unwrap();
        cache.register(url).unwrap();

        assert!(cache.is_registered(url));
        assert!(cache.key_set(url).is_none());
        assert!(cache.lookup_key_id(url, "any").is_none());
    }

    #[tokio::test]
    async fn refreshed_key_resolves_without_another_fetch() {
        let server = MockServer::start().await;
        let keypair = TestKeypair::generate("key-1");

        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(TestKeypair::jwks(&[&keypair])))
            .expect(1)
            .mount(&server)
            .await;

        let cache = cache();
        let url = jwks_url(&server);
        let set = cache.refresh(&url).await.unwrap();
        assert_eq!(set.len(), 1);

        assert!(cache.lookup_key_id(&url, "key-1").is_some());
        let key = cache.resolve_key(&url, "key-1").await.unwrap();
        assert_eq!(key.kid(), "key-1");
        assert_eq!(key.algorithm(), Algorithm::EdDSA);
    }

    #[tokio::test]
    async fn refresh_fails_on_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let cache = cache();
        let err = cache.refresh(&jwks_url(&server)).await.unwrap_err();
        assert!(matches!(err, AuthError::FetchFailed(_)));
        assert!(cache.key_set(&jwks_url(&server)).is_none());
    }

    #[tokio::test]
    async fn refresh_fails_on_malformed_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"keys\": 42}"))
            .mount(&server)
            .await;

        let err = cache().refresh(&jwks_url(&server)).await.unwrap_err();
        assert!(matches!(err, AuthError::FetchFailed(_)));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_set() {
        let server = MockServer::start().await;
        let keypair = TestKeypair::generate("key-1");

        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(TestKeypair::jwks(&[&keypair])))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let cache = cache();
        let url = jwks_url(&server);
        cache.refresh(&url).await.unwrap();
        assert!(cache.refresh(&url).await.is_err());
        assert!(cache.lookup_key_id(&url, "key-1").is_some());
    }

    #[tokio::test]
    async fn miss_refreshes_once_and_picks_up_rotated_key() {
        let server = MockServer::start().await;
        let old = TestKeypair::generate("old");
        let new = TestKeypair::generate("new");

        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(TestKeypair::jwks(&[&old])))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(TestKeypair::jwks(&[&old, &new])),
            )
            .mount(&server)
            .await;

        let cache = cache();
        let url = jwks_url(&server);
        cache.refresh(&url).await.unwrap();
        assert!(cache.lookup_key_id(&url, "new").is_none());

        let key = cache.resolve_key(&url, "new").await.unwrap();
        assert_eq!(key.kid(), "new");
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn second_miss_is_unknown_key_id() {
        let server = MockServer::start().await;
        let keypair = TestKeypair::generate("key-1");

        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(TestKeypair::jwks(&[&keypair])))
            .mount(&server)
            .await;

        let cache = cache();
        let url = jwks_url(&server);
        cache.refresh(&url).await.unwrap();

        let err = cache.resolve_key(&url, "missing").await.unwrap_err();
        assert!(matches!(err, AuthError::UnknownKeyId(kid) if kid == "missing"));
        // Initial fetch plus exactly one refresh.
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn concurrent_misses_all_resolve() {
        let server = MockServer::start().await;
        let keypair = TestKeypair::generate("key-1");

        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(TestKeypair::jwks(&[&keypair])))
            .mount(&server)
            .await;

        let cache = Arc::new(cache());
        let url = jwks_url(&server);

        let tasks = (0..8).map(|_| {
            let cache = Arc::clone(&cache);
            let url = url.clone();
            tokio::spawn(async move { cache.resolve_key(&url, "key-1").await })
        });

        for result in futures::future::join_all(tasks).await {
            assert_eq!(result.unwrap().unwrap().kid(), "key-1");
        }
        // Waiters reuse the set installed by the first refresh.
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn periodic_refresh_refetches() {
        let server = MockServer::start().await;
        let keypair = TestKeypair::generate("key-1");

        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(TestKeypair::jwks(&[&keypair])))
            .mount(&server)
            .await;

        let cache = Arc::new(cache());
        let url = jwks_url(&server);
        let handle = cache
            .spawn_periodic_refresh(&url, Duration::from_millis(50))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(400)).await;
        handle.abort();

        assert!(server.received_requests().await.unwrap().len() >= 2);
        assert!(cache.lookup_key_id(&url, "key-1").is_some());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let cache = Arc::new(cache());
        assert!(cache
            .spawn_periodic_refresh("https://auth.example.test/jwks.json", Duration::ZERO)
            .is_err());
    }
}
