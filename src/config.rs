// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Client configuration types.

use std::time::Duration;

use crate::error::ProtocolError;
use crate::protocol::RestClient;

/// Configuration for a connection to a Fibaro hub.
///
/// The URL must point to the API root of the hub, in the form
/// `http://<HOST>/api/`. A missing trailing slash is added.
///
/// # Examples
///
/// ```
/// use fibaro_lib::ClientConfig;
/// use std::time::Duration;
///
/// // Simple configuration
/// let config = ClientConfig::new("http://192.168.1.166/api/");
///
/// // With all options
/// let config = ClientConfig::new("https://hc3.local/api")
///     .with_credentials("admin", "password")
///     .with_ssl_verify(false)
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.base_url(), "https://hc3.local/api/");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: String,
    credentials: Option<(String, String)>,
    ssl_verify: bool,
    timeout: Duration,
    refresh_timeout: Duration,
    retry_policy: RetryPolicy,
}

impl ClientConfig {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
    /// Timeout for the `refreshStates` long-poll request.
    ///
    /// The hub holds the request open for up to 30 seconds before answering.
    pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(35);

    /// Creates a new configuration for the given API root URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        let mut base_url = url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Self {
            base_url,
            credentials: None,
            ssl_verify: true,
            timeout: Self::DEFAULT_TIMEOUT,
            refresh_timeout: Self::DEFAULT_REFRESH_TIMEOUT,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Sets basic authentication credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Enables or disables TLS certificate verification.
    ///
    /// Only relevant for `https` URLs. Hubs ship with self-signed
    /// certificates, so this is commonly disabled.
    #[must_use]
    pub fn with_ssl_verify(mut self, verify: bool) -> Self {
        self.ssl_verify = verify;
        self
    }

    /// Sets the default request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the timeout used for the `refreshStates` long-poll request.
    #[must_use]
    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    /// Sets the retry policy of the state polling loop.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Returns the API root URL, always ending with `/`.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the credentials if set.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.credentials
            .as_ref()
            .map(|(u, p)| (u.as_str(), p.as_str()))
    }

    /// Returns whether TLS certificates are verified.
    #[must_use]
    pub fn ssl_verify(&self) -> bool {
        self.ssl_verify
    }

    /// Returns the default request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the long-poll timeout.
    #[must_use]
    pub fn refresh_timeout(&self) -> Duration {
        self.refresh_timeout
    }

    /// Returns the retry policy of the state polling loop.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Creates a [`RestClient`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the URL is not an http(s) URL or the HTTP client
    /// cannot be created.
    pub fn into_rest_client(self) -> Result<RestClient, ProtocolError> {
        RestClient::new(&self)
    }
}

/// Retry timing of the state polling loop.
///
/// After a failed poll the loop waits [`short_delay`](Self::short_delay)
/// before retrying. Once [`long_delay_after`](Self::long_delay_after)
/// consecutive failures have accumulated it switches to
/// [`long_delay`](Self::long_delay) until a poll succeeds again.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use fibaro_lib::RetryPolicy;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.delay_for_failure(1), Duration::from_secs(1));
/// assert_eq!(policy.delay_for_failure(2), Duration::from_secs(1));
/// assert_eq!(policy.delay_for_failure(3), Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay used for the first failures.
    pub short_delay: Duration,
    /// Delay used once the failures pile up.
    pub long_delay: Duration,
    /// Number of consecutive failures from which `long_delay` applies.
    pub long_delay_after: u32,
}

impl RetryPolicy {
    /// Creates a retry policy with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the short delay.
    #[must_use]
    pub fn with_short_delay(mut self, delay: Duration) -> Self {
        self.short_delay = delay;
        self
    }

    /// Sets the long delay.
    #[must_use]
    pub fn with_long_delay(mut self, delay: Duration) -> Self {
        self.long_delay = delay;
        self
    }

    /// Sets the failure count from which the long delay applies.
    #[must_use]
    pub fn with_long_delay_after(mut self, failures: u32) -> Self {
        self.long_delay_after = failures;
        self
    }

    /// Returns the wait before the next attempt after `failures`
    /// consecutive failed polls (counting from 1).
    #[must_use]
    pub fn delay_for_failure(&self, failures: u32) -> Duration {
        if failures >= self.long_delay_after {
            self.long_delay
        } else {
            self.short_delay
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            short_delay: Duration::from_secs(1),
            long_delay: Duration::from_secs(30),
            long_delay_after: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let config = ClientConfig::new("http://192.168.1.166/api/");
        assert_eq!(config.base_url(), "http://192.168.1.166/api/");
        assert!(config.credentials().is_none());
        assert!(config.ssl_verify());
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.refresh_timeout(), Duration::from_secs(35));
        assert_eq!(config.retry_policy(), &RetryPolicy::default());
    }

    #[test]
    fn config_appends_trailing_slash() {
        let config = ClientConfig::new("http://192.168.1.166/api");
        assert_eq!(config.base_url(), "http://192.168.1.166/api/");
    }

    #[test]
    fn config_builder_chain() {
        let config = ClientConfig::new("https://hc3/api/")
            .with_credentials("admin", "secret")
            .with_ssl_verify(false)
            .with_timeout(Duration::from_secs(3))
            .with_refresh_timeout(Duration::from_secs(40));

        assert_eq!(config.credentials(), Some(("admin", "secret")));
        assert!(!config.ssl_verify());
        assert_eq!(config.timeout(), Duration::from_secs(3));
        assert_eq!(config.refresh_timeout(), Duration::from_secs(40));
    }

    #[test]
    fn refresh_timeout_exceeds_hub_hold_time() {
        assert!(ClientConfig::DEFAULT_REFRESH_TIMEOUT > Duration::from_secs(30));
    }

    #[test]
    fn retry_policy_escalates_on_third_failure() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay_for_failure(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for_failure(2), Duration::from_secs(1));
        assert_eq!(policy.delay_for_failure(3), Duration::from_secs(30));
        assert_eq!(policy.delay_for_failure(50), Duration::from_secs(30));
    }

    #[test]
    fn retry_policy_custom() {
        let policy = RetryPolicy::new()
            .with_short_delay(Duration::from_millis(10))
            .with_long_delay(Duration::from_millis(200))
            .with_long_delay_after(2);

        assert_eq!(policy.delay_for_failure(1), Duration::from_millis(10));
        assert_eq!(policy.delay_for_failure(2), Duration::from_millis(200));
    }
}
