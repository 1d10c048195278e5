// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Main entry point for accessing the hub API.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::model::{ApiVersion, DeviceModel, InfoModel, LoginModel, RoomModel, SceneModel};
use crate::protocol::RestClient;
use crate::state::StateHandler;

/// Client for one Fibaro hub.
///
/// Call [`connect`](Self::connect) once to check the credentials and detect
/// the API version, then use the `read_*` methods. At most one update
/// handler (polling loop) can be registered at a time.
///
/// # Examples
///
/// ```no_run
/// use fibaro_lib::{ClientConfig, FibaroClient};
///
/// # async fn example() -> fibaro_lib::Result<()> {
/// let client = FibaroClient::new(ClientConfig::new("http://192.168.1.166/api/"))?;
/// client.set_authentication("admin", "admin");
///
/// if client.connect().await? {
///     for room in client.read_rooms().await? {
///         println!("{} {}", room.fibaro_id(), room.name());
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct FibaroClient {
    config: ClientConfig,
    rest_client: RestClient,
    api_version: RwLock<ApiVersion>,
    state_handler: Mutex<Option<StateHandler>>,
}

impl FibaroClient {
    /// Creates a client. No request is sent.
    ///
    /// # Errors
    ///
    /// Returns error if the configured URL is not an http(s) URL.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let rest_client = RestClient::new(&config)?;
        Ok(Self {
            config,
            rest_client,
            api_version: RwLock::new(ApiVersion::default()),
            state_handler: Mutex::new(None),
        })
    }

    /// Sets the credentials for all following requests.
    pub fn set_authentication(&self, username: &str, password: &str) {
        self.rest_client.set_auth(username, password);
    }

    /// Checks the login status and reads the API version of the hub.
    ///
    /// Returns `true` if the hub accepted the credentials.
    ///
    /// # Errors
    ///
    /// Returns error on connection problems. Invalid credentials usually
    /// fail with HTTP status 403.
    pub async fn connect(&self) -> Result<bool> {
        let login = LoginModel::read(&self.rest_client).await?;

        let info = self.read_info().await?;
        let api_version = info.api_version();
        *self.api_version.write() = api_version;
        tracing::debug!(
            serial_number = %info.serial_number(),
            api_version = api_version.number(),
            "Connected to hub"
        );

        Ok(login.is_logged_in())
    }

    /// Returns the API version detected by [`connect`](Self::connect).
    ///
    /// Version 5 until connected.
    #[must_use]
    pub fn api_version(&self) -> ApiVersion {
        *self.api_version.read()
    }

    /// Returns the underlying REST client.
    #[must_use]
    pub fn rest_client(&self) -> &RestClient {
        &self.rest_client
    }

    /// Reads the hub information.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn read_info(&self) -> Result<InfoModel> {
        InfoModel::read(&self.rest_client).await
    }

    /// Reads all rooms.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn read_rooms(&self) -> Result<Vec<RoomModel>> {
        RoomModel::read_rooms(&self.rest_client).await
    }

    /// Reads all scenes.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn read_scenes(&self) -> Result<Vec<SceneModel>> {
        SceneModel::read_scenes(&self.rest_client, self.api_version()).await
    }

    /// Reads all devices.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn read_devices(&self) -> Result<Vec<DeviceModel>> {
        DeviceModel::read_devices(&self.rest_client, self.api_version()).await
    }

    // =========================================================================
    // Update handler
    // =========================================================================

    /// Starts polling for state changes, handing every diff to `callback`.
    ///
    /// The poll timeout and retry policy are taken from the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HandlerAlreadyRegistered`] if a handler is already
    /// registered and [`Error::NoRuntime`] outside a tokio runtime.
    pub fn register_update_handler<F>(&self, callback: F) -> Result<()>
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let mut state_handler = self.state_handler.lock();
        if state_handler.is_some() {
            return Err(Error::HandlerAlreadyRegistered);
        }

        let mut handler = StateHandler::new(
            self.rest_client.clone(),
            Arc::new(callback),
            self.config.refresh_timeout(),
            self.config.retry_policy().clone(),
        );
        handler.start()?;
        *state_handler = Some(handler);
        Ok(())
    }

    /// Stops and removes the update handler. No-op if none is registered.
    pub fn unregister_update_handler(&self) {
        if let Some(handler) = self.state_handler.lock().take() {
            handler.stop();
        }
    }

    /// Returns `true` if an update handler is registered.
    #[must_use]
    pub fn has_update_handler(&self) -> bool {
        self.state_handler.lock().is_some()
    }
}

impl std::fmt::Debug for FibaroClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FibaroClient")
            .field("base_url", &self.rest_client.base_url())
            .field("api_version", &self.api_version())
            .field("has_update_handler", &self.has_update_handler())
            .finish_non_exhaustive()
    }
}
