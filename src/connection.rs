// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connection setup with distinguishable authentication failures.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::client::FibaroClient;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::model::InfoModel;

/// HTTP status the hub answers with for invalid credentials.
const STATUS_FORBIDDEN: u16 = 403;

/// Connects a [`FibaroClient`] and tells authentication failures apart
/// from connection failures.
///
/// # Examples
///
/// ```no_run
/// use fibaro_lib::{ClientConfig, Error, FibaroConnection};
///
/// # async fn example() -> fibaro_lib::Result<()> {
/// let connection = FibaroConnection::new(ClientConfig::new("http://192.168.1.166/api/"))?;
///
/// match connection.connect("admin", "admin").await {
///     Ok(info) => println!("Connected to {}", info.model_name()),
///     Err(Error::AuthenticationFailed) => println!("Wrong credentials"),
///     Err(e) => println!("Hub not reachable: {e}"),
/// }
///
/// let client = connection.fibaro_client()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FibaroConnection {
    client: Arc<FibaroClient>,
    connected: AtomicBool,
}

impl FibaroConnection {
    /// Creates an unconnected connection.
    ///
    /// # Errors
    ///
    /// Returns error if the configured URL is not an http(s) URL.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            client: Arc::new(FibaroClient::new(config)?),
            connected: AtomicBool::new(false),
        })
    }

    /// Authenticates and returns the hub information.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthenticationFailed`] if the hub rejects the
    /// credentials and [`Error::ConnectFailed`] for any other failure.
    pub async fn connect(&self, username: &str, password: &str) -> Result<InfoModel> {
        self.client.set_authentication(username, password);

        let logged_in = self.client.connect().await.map_err(translate_error)?;
        if !logged_in {
            return Err(Error::AuthenticationFailed);
        }
        let info = self.client.read_info().await.map_err(translate_error)?;

        self.connected.store(true, Ordering::Release);
        tracing::info!(
            hub = %info.hc_name().unwrap_or_default(),
            model = %info.model_name(),
            "Connected"
        );
        Ok(info)
    }

    /// Returns the connected client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] before a successful
    /// [`connect`](Self::connect).
    pub fn fibaro_client(&self) -> Result<Arc<FibaroClient>> {
        if self.connected.load(Ordering::Acquire) {
            Ok(Arc::clone(&self.client))
        } else {
            Err(Error::NotConnected)
        }
    }
}

fn translate_error(error: Error) -> Error {
    match &error {
        Error::Protocol(protocol) if protocol.status() == Some(STATUS_FORBIDDEN) => {
            tracing::warn!(error = %error, "Authentication failed");
            Error::AuthenticationFailed
        }
        _ => {
            tracing::warn!(error = %error, "Connect failed");
            Error::ConnectFailed(error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;

    #[test]
    fn forbidden_is_authentication_failure() {
        let error = translate_error(Error::Protocol(ProtocolError::Status {
            status: 403,
            reason: "Forbidden".to_string(),
        }));
        assert!(matches!(error, Error::AuthenticationFailed));
    }

    #[test]
    fn other_errors_are_connect_failures() {
        let error = translate_error(Error::Protocol(ProtocolError::Status {
            status: 500,
            reason: "Internal Server Error".to_string(),
        }));
        assert!(matches!(error, Error::ConnectFailed(message) if message.contains("500")));
    }

    #[test]
    fn client_unavailable_before_connect() {
        let connection =
            FibaroConnection::new(ClientConfig::new("http://127.0.0.1:9/api/")).unwrap();
        assert!(matches!(connection.fibaro_client(), Err(Error::NotConnected)));
    }
}
