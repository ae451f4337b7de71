//! HTTP plumbing shared by the management API resources.

use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ApiError, Result};
use crate::ApiConfig;

/// Header identifying the SDK and its version to the API.
pub const PASSAGE_VERSION_HEADER: &str = "Passage-Version";

/// Value sent in [`PASSAGE_VERSION_HEADER`].
pub const PASSAGE_VERSION: &str = concat!("passage-rust ", env!("CARGO_PKG_VERSION"));

/// Client for the Passage management API.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client from `config`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the base URL does not parse, or `Transport`
    /// if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()?;
        Self::with_client(client, config)
    }

    /// Create a client that sends requests through `client`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the base URL does not parse.
    pub fn with_client(client: reqwest::Client, config: &ApiConfig) -> Result<Self> {
        Url::parse(&config.base_url)
            .map_err(|e| ApiError::InvalidConfig(format!("api base URL: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|key| !key.is_empty()),
        })
    }

    /// Get the base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns `true` if an API key is configured.
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let api_key = self.api_key.as_deref().ok_or(ApiError::MissingApiKey)?;
        let url = format!("{}/{}", self.base_url, path);

        tracing::debug!(method = %method, path, "Passage API request");

        Ok(self
            .client
            .request(method, url)
            .bearer_auth(api_key)
            .header(PASSAGE_VERSION_HEADER, PASSAGE_VERSION))
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await?;
        let error = ApiError::from_body(status.as_u16(), &body);
        tracing::warn!(status = status.as_u16(), error = %error, "Passage API request failed");
        Err(error)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Send a `GET` and decode the response body.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let builder = self.request(Method::GET, path)?.query(query);
        Self::decode(self.execute(builder).await?).await
    }

    /// Send a request with a JSON body and decode the response body.
    pub(crate) async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(method, path)?.json(body);
        Self::decode(self.execute(builder).await?).await
    }

    /// Send a request without a body and decode the response body.
    pub(crate) async fn send_empty<T: DeserializeOwned>(&self, method: Method, path: &str) -> Result<T> {
        let builder = self.request(method, path)?;
        Self::decode(self.execute(builder).await?).await
    }

    /// Send a `DELETE`, ignoring any response body.
    pub(crate) async fn delete(&self, path: &str) -> Result<()> {
        let builder = self.request(Method::DELETE, path)?;
        self.execute(builder).await?;
        Ok(())
    }
}
