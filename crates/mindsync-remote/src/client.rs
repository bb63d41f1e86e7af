//! MindSync record API client
//!
//! Thin typed wrapper over `reqwest` that adds the bearer token, builds
//! endpoint URLs and turns failed responses into [`RemoteStoreError`]s.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mindsync_remote::client::RemoteClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = RemoteClient::new("access-token-here");
//! let response = client
//!     .execute(client.request(reqwest::Method::GET, "/account"), "GET /account")
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

use mindsync_core::config::RemoteConfig;
use mindsync_core::ports::RemoteStoreError;

/// Default base URL of the record API
const DEFAULT_BASE_URL: &str = "https://sync.mindsync.app/v1";

/// HTTP client for the record API
pub struct RemoteClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl RemoteClient {
    /// Creates a client for the default endpoint
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_url(access_token, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (useful for testing)
    pub fn with_base_url(access_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    /// Creates a client from the `remote` configuration section
    pub fn from_config(config: &RemoteConfig, access_token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        })
    }

    /// Updates the access token (e.g., after a token refresh)
    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = token.into();
        debug!("Updated RemoteClient access token");
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Creates an authenticated request builder for `path` relative to the base URL
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .request(method, &url)
            .bearer_auth(&self.access_token)
    }

    /// Sends a request, mapping transport failures to `Unavailable`
    ///
    /// The response is returned whatever its status; see [`Self::ensure_success`].
    pub async fn execute(&self, builder: RequestBuilder, what: &str) -> Result<Response> {
        builder.send().await.map_err(|e| {
            warn!(request = what, error = %e, "Request failed before a response");
            anyhow::Error::new(RemoteStoreError::Unavailable(e.to_string()))
                .context(format!("Failed to send {what}"))
        })
    }

    /// Passes successful responses through and classifies the rest
    pub async fn ensure_success(response: Response, what: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = classify_status(status, &body);
        debug!(request = what, %status, error = %error, "Request returned error status");
        Err(anyhow::Error::new(error).context(format!("{what} returned {status}")))
    }
}

/// Maps an HTTP error status to the port's failure taxonomy
pub fn classify_status(status: StatusCode, body: &str) -> RemoteStoreError {
    match status {
        StatusCode::UNAUTHORIZED => RemoteStoreError::NotAuthenticated,
        StatusCode::FORBIDDEN => RemoteStoreError::Forbidden(body_or_status(status, body)),
        StatusCode::PAYLOAD_TOO_LARGE | StatusCode::INSUFFICIENT_STORAGE => {
            RemoteStoreError::QuotaExceeded
        }
        StatusCode::TOO_MANY_REQUESTS => RemoteStoreError::RateLimited,
        s if s.is_server_error() => RemoteStoreError::Unavailable(body_or_status(status, body)),
        _ => RemoteStoreError::Other(body_or_status(status, body)),
    }
}

fn body_or_status(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("HTTP {}: {}", status.as_u16(), body)
    }
}
