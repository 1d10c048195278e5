// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! REST client for the Fibaro hub API.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;
use tokio::sync::Notify;

use crate::config::ClientConfig;
use crate::error::ProtocolError;

/// User agent sent with every request.
const USER_AGENT: &str = concat!("fibaro_lib/", env!("CARGO_PKG_VERSION"));

/// HTTP basic authentication credentials.
#[derive(Clone)]
struct Credentials {
    username: String,
    password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// HTTP client for the hub's REST API.
///
/// Endpoints are relative to the configured API root, e.g. `settings/info`
/// resolves to `http://<HOST>/api/settings/info`. Response bodies are
/// decoded as JSON; bodies which are empty or not JSON yield `None`.
///
/// Clones share the underlying connection pool, credentials and close
/// signal.
///
/// # Examples
///
/// ```no_run
/// use fibaro_lib::ClientConfig;
///
/// # async fn example() -> fibaro_lib::Result<()> {
/// let client = ClientConfig::new("http://192.168.1.166/api/")
///     .with_credentials("admin", "admin")
///     .into_rest_client()?;
///
/// let info = client.get("settings/info", None).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RestClient {
    base_url: String,
    client: Client,
    credentials: Arc<RwLock<Option<Credentials>>>,
    timeout: Duration,
    closed: Arc<Notify>,
}

impl RestClient {
    /// Creates a client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the URL is not an http(s) URL or the HTTP client
    /// cannot be created.
    pub fn new(config: &ClientConfig) -> Result<Self, ProtocolError> {
        let base_url = config.base_url().to_string();
        let is_https = base_url.starts_with("https://");
        if !is_https && !base_url.starts_with("http://") {
            return Err(ProtocolError::InvalidAddress(base_url));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );

        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers);
        if is_https && !config.ssl_verify() {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let client = builder.build().map_err(ProtocolError::Http)?;

        let credentials = config
            .credentials()
            .map(|(username, password)| Credentials {
                username: username.to_string(),
                password: password.to_string(),
            });

        Ok(Self {
            base_url,
            client,
            credentials: Arc::new(RwLock::new(credentials)),
            timeout: config.timeout(),
            closed: Arc::new(Notify::new()),
        })
    }

    /// Sets the credentials used for all following requests.
    pub fn set_auth(&self, username: impl Into<String>, password: impl Into<String>) {
        *self.credentials.write() = Some(Credentials {
            username: username.into(),
            password: password.into(),
        });
    }

    /// Returns a client sharing connections and credentials with this one
    /// but with its own [`close`](Self::close) scope.
    #[must_use]
    pub fn detached(&self) -> Self {
        Self {
            closed: Arc::new(Notify::new()),
            ..self.clone()
        }
    }

    /// Returns the API root URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the default request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Executes a GET request.
    ///
    /// # Errors
    ///
    /// Returns error on transport failures, non-success status codes and
    /// when the client is closed during the request.
    pub async fn get(
        &self,
        endpoint: &str,
        timeout: Option<Duration>,
    ) -> Result<Option<Value>, ProtocolError> {
        let request = self.request(Method::GET, endpoint, timeout);
        self.execute(request).await
    }

    /// Executes a POST request with an optional JSON body.
    ///
    /// # Errors
    ///
    /// Returns error on transport failures, non-success status codes and
    /// when the client is closed during the request.
    pub async fn post(
        &self,
        endpoint: &str,
        body: Option<&Value>,
        timeout: Option<Duration>,
    ) -> Result<Option<Value>, ProtocolError> {
        let mut request = self.request(Method::POST, endpoint, timeout);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.execute(request).await
    }

    /// Aborts all requests currently in flight on this client and its clones.
    ///
    /// Aborted requests fail with [`ProtocolError::Closed`]. The client stays
    /// usable for requests issued afterwards.
    pub fn close(&self) {
        tracing::debug!(base_url = %self.base_url, "Closing REST client");
        self.closed.notify_waiters();
    }

    fn request(&self, method: Method, endpoint: &str, timeout: Option<Duration>) -> RequestBuilder {
        let url = format!("{}{endpoint}", self.base_url);
        let mut request = self
            .client
            .request(method, url)
            .timeout(timeout.unwrap_or(self.timeout));

        if let Some(creds) = self.credentials.read().as_ref() {
            request = request.basic_auth(&creds.username, Some(&creds.password));
        }
        request
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Option<Value>, ProtocolError> {
        let closed = self.closed.notified();
        tokio::pin!(closed);
        closed.as_mut().enable();

        tokio::select! {
            result = Self::send(request) => result,
            () = closed => Err(ProtocolError::Closed),
        }
    }

    async fn send(request: RequestBuilder) -> Result<Option<Value>, ProtocolError> {
        let response = request.send().await.map_err(ProtocolError::Http)?;
        Self::process_json_result(response).await
    }

    /// Checks the status code and decodes the body as JSON.
    async fn process_json_result(response: Response) -> Result<Option<Value>, ProtocolError> {
        let status = response.status();
        tracing::debug!(url = %response.url(), status = status.as_u16(), "HTTP response");

        if !status.is_success() {
            return Err(ProtocolError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.bytes().await.map_err(ProtocolError::Http)?;
        match serde_json::from_slice::<Value>(&body) {
            Ok(json) => {
                tracing::debug!(body = %json, "Received HTTP response");
                Ok(Some(json))
            }
            Err(_) => {
                tracing::debug!("No response");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_non_http_url() {
        let config = ClientConfig::new("ftp://192.168.1.166/api/");
        let result = RestClient::new(&config);
        assert!(matches!(result, Err(ProtocolError::InvalidAddress(_))));
    }

    #[test]
    fn new_accepts_https_without_verification() {
        let config = ClientConfig::new("https://192.168.1.40/api/")
            .with_ssl_verify(false);
        let client = RestClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "https://192.168.1.40/api/");
    }

    #[test]
    fn credentials_are_redacted_in_debug() {
        let client = ClientConfig::new("http://192.168.1.166/api/")
            .with_credentials("admin", "secret")
            .into_rest_client()
            .unwrap();

        let debug = format!("{client:?}");
        assert!(debug.contains("admin"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn set_auth_replaces_credentials() {
        let client = ClientConfig::new("http://192.168.1.166/api/")
            .into_rest_client()
            .unwrap();
        assert!(client.credentials.read().is_none());

        client.set_auth("admin", "admin");
        assert_eq!(
            client.credentials.read().as_ref().map(|c| c.username.as_str()),
            Some("admin")
        );
    }

    #[test]
    fn default_timeout_from_config() {
        let client = ClientConfig::new("http://hc/api/")
            .with_timeout(Duration::from_secs(4))
            .into_rest_client()
            .unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(4));
    }
}
