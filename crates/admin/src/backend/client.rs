//! HTTP plumbing shared by every backend endpoint.

use std::sync::Arc;

use aaa_core::api::error_message;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use url::Url;

use super::BackendError;
use crate::config::BackendConfig;

/// Unauthenticated backend client.
///
/// Cheap to clone; the connection pool is shared.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .user_agent(concat!("aaa-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// Bind an admin's access token to this client.
    #[must_use]
    pub fn authorized(&self, token: SecretString) -> AuthorizedBackend {
        AuthorizedBackend {
            client: self.clone(),
            token,
        }
    }

    /// Resolve a backend path (no leading slash) against the base URL.
    pub(crate) fn url(&self, path: &str) -> Result<Url, BackendError> {
        self.inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| BackendError::InvalidUrl(format!("{path}: {e}")))
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, BackendError> {
        self.request_with_query(method, path, &[])
    }

    pub(crate) fn request_with_query(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<RequestBuilder, BackendError> {
        let mut url = self.url(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(self.inner.client.request(method, url))
    }
}

/// Backend client acting on behalf of a logged-in admin.
#[derive(Clone)]
pub struct AuthorizedBackend {
    client: BackendClient,
    token: SecretString,
}

impl std::fmt::Debug for AuthorizedBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedBackend")
            .field("base_url", &self.client.inner.base_url.as_str())
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl AuthorizedBackend {
    pub(crate) fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, BackendError> {
        self.request_with_query(method, path, &[])
    }

    pub(crate) fn request_with_query(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<RequestBuilder, BackendError> {
        Ok(self
            .client
            .request_with_query(method, path, query)?
            .bearer_auth(self.token.expose_secret()))
    }
}

/// Map a response to a typed body, turning error statuses into [`BackendError`].
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let response = check_status(response).await?;
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| BackendError::Parse(e.to_string()))
}

/// Like [`read_json`] for endpoints whose success body we ignore (e.g. 204).
pub(crate) async fn read_empty(response: Response) -> Result<(), BackendError> {
    check_status(response).await.map(drop)
}

async fn check_status(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(status.as_u16(), &body);
    Err(match status {
        StatusCode::UNAUTHORIZED => BackendError::Unauthorized(message),
        StatusCode::FORBIDDEN => BackendError::Forbidden(message),
        StatusCode::NOT_FOUND => BackendError::NotFound(message),
        _ => BackendError::Api {
            status: status.as_u16(),
            message,
        },
    })
}
