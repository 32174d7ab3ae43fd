//! REST backend HTTP client
//!
//! Wraps `reqwest::Client` with base URL construction, the bearer token
//! obtained from the auth collaborator, the optional `apikey` header and the
//! classification of HTTP failures into [`RemoteError`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use paysync_core::config::RemoteConfig;
//! use paysync_remote::{KeyringSessionStorage, RestClient, SessionAuthProvider};
//!
//! # fn example() -> anyhow::Result<()> {
//! let auth = Arc::new(SessionAuthProvider::new(Arc::new(KeyringSessionStorage::new())));
//! let client = RestClient::new(&RemoteConfig::default(), auth)?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

use paysync_core::config::RemoteConfig;
use paysync_core::ports::{AuthError, IAuthProvider, RemoteError};

/// Path prefix of the table API
const REST_PREFIX: &str = "/rest/v1";

/// Longest response body excerpt kept in an error message
const MAX_ERROR_BODY: usize = 512;

/// HTTP client for the REST backend
#[derive(Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    auth: Arc<dyn IAuthProvider>,
}

impl RestClient {
    /// Creates a client from the `remote` configuration section
    ///
    /// # Errors
    /// Returns `RemoteError::Network` if the HTTP client cannot be built
    /// (e.g. the TLS backend fails to initialise).
    pub fn new(config: &RemoteConfig, auth: Arc<dyn IAuthProvider>) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RemoteError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            auth,
        })
    }

    /// Creates a client with default settings against a custom base URL
    /// (useful for testing)
    pub fn with_base_url(base_url: impl Into<String>, auth: Arc<dyn IAuthProvider>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
            auth,
        }
    }

    /// Sets the `apikey` header sent with every request
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Returns the base URL for API requests
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Creates an authenticated request builder for a table path
    ///
    /// `path` is relative to `/rest/v1`, e.g. `/payments`.
    ///
    /// # Errors
    /// Returns `RemoteError::Auth` if no access token is available.
    pub async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, RemoteError> {
        let token = self.auth.access_token().await.map_err(auth_to_remote)?;
        let url = format!("{}{}{}", self.base_url, REST_PREFIX, path);

        let mut builder = self.client.request(method, &url).bearer_auth(token);
        if let Some(ref key) = self.api_key {
            builder = builder.header("apikey", key);
        }
        Ok(builder)
    }

    /// Sends a request and classifies any non-success response
    ///
    /// Statuses listed in `accept` are treated as success in addition to 2xx.
    pub async fn send(
        &self,
        builder: RequestBuilder,
        accept: &[StatusCode],
    ) -> Result<Response, RemoteError> {
        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();

        if status.is_success() || accept.contains(&status) {
            debug!(status = status.as_u16(), url = %response.url(), "Request succeeded");
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = classify_status(status, &body);
        warn!(status = status.as_u16(), error = %error, "Request failed");
        Err(error)
    }
}

/// Maps a transport-level `reqwest` failure
pub(crate) fn transport_error(e: reqwest::Error) -> RemoteError {
    if e.is_decode() {
        RemoteError::InvalidResponse(e.to_string())
    } else {
        RemoteError::Network(e.to_string())
    }
}

/// Maps a non-success HTTP status to a [`RemoteError`]
pub fn classify_status(status: StatusCode, body: &str) -> RemoteError {
    let message = truncate(body.trim());
    match status {
        StatusCode::UNAUTHORIZED => RemoteError::Unauthorized(message),
        StatusCode::FORBIDDEN => RemoteError::Forbidden(message),
        StatusCode::CONFLICT => RemoteError::Conflict(message),
        s if s.is_server_error() => RemoteError::Server {
            status: s.as_u16(),
            message,
        },
        s => RemoteError::Status {
            status: s.as_u16(),
            message,
        },
    }
}

fn auth_to_remote(e: AuthError) -> RemoteError {
    match e {
        AuthError::Network(msg) => RemoteError::Network(msg),
        other => RemoteError::Auth(other.to_string()),
    }
}

fn truncate(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}
