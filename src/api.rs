//! Shared HTTP plumbing for backend requests
//!
//! Both the conversation and transcription clients talk to the same
//! backend. This module owns the `reqwest` client, endpoint URL building
//! and the normalisation of failures into [`ApiError`].

use crate::config::ApiConfig;
use crate::error::ApiError;
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

/// Connection to the backend service
#[derive(Debug, Clone)]
pub(crate) struct Backend {
    client: reqwest::Client,
    base_url: Url,
}

/// Error body sent by the backend on failure
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: serde_json::Value,
}

impl Backend {
    /// Create a backend connection from configuration
    pub(crate) fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid backend URL: {}", config.base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Backend URL cannot be used as a base: {}", config.base_url);
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .context("Failed to create HTTP client for backend")?;

        Ok(Self { client, base_url })
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.client
    }

    /// Build an endpoint URL from path segments
    ///
    /// Segments are percent-encoded, so opaque ids can be passed as-is.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ApiError::InvalidResponse(format!("Backend URL cannot be a base: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Decode a JSON success body, or turn the response into an [`ApiError`]
pub(crate) async fn decode_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let response = ensure_success(response).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response body: {}", e)))
}

/// Pass a 2xx response through, or read the backend's failure detail
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Server {
        status: status.as_u16(),
        detail: extract_detail(&body),
    })
}

/// Pull a string `detail` out of an error body
fn extract_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .detail
        .as_str()
        .map(str::trim)
        .filter(|detail| !detail.is_empty())
        .map(str::to_string)
}
