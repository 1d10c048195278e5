// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scene model for the `scenes` endpoint.

use serde_json::{Map, Value};

use super::{ApiVersion, FibaroId};
use crate::error::Error;
use crate::protocol::RestClient;

/// A scene on the hub.
///
/// Scenes can be started and stopped. The endpoints differ between API
/// versions:
///
/// | Operation | API v4                     | API v5               |
/// |-----------|----------------------------|----------------------|
/// | start     | `scenes/<id>/action/start` | `scenes/<id>/execute` |
/// | stop      | `scenes/<id>/action/stop`  | `scenes/<id>/kill`    |
#[derive(Debug, Clone)]
pub struct SceneModel {
    raw_data: Map<String, Value>,
    rest_client: RestClient,
    api_version: ApiVersion,
}

impl SceneModel {
    /// Wraps one entry of the `scenes` endpoint.
    #[must_use]
    pub fn new(
        raw_data: Map<String, Value>,
        rest_client: RestClient,
        api_version: ApiVersion,
    ) -> Self {
        Self {
            raw_data,
            rest_client,
            api_version,
        }
    }

    /// Loads all scenes from the hub.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the hub does not answer with a
    /// list.
    pub async fn read_scenes(
        rest_client: &RestClient,
        api_version: ApiVersion,
    ) -> Result<Vec<Self>, Error> {
        let response = rest_client.get("scenes", None).await?;
        Ok(super::into_objects("scenes", response)?
            .into_iter()
            .map(|scene| Self::new(scene, rest_client.clone(), api_version))
            .collect())
    }

    #[must_use]
    pub fn fibaro_id(&self) -> FibaroId {
        self.raw_data
            .get("id")
            .and_then(FibaroId::from_json)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.raw_data
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Starts the scene.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn start(&self) -> Result<(), Error> {
        match self.api_version {
            ApiVersion::V4 => self.send_action("action/start").await,
            ApiVersion::V5 => self.send_action("execute").await,
        }
    }

    /// Stops the scene.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn stop(&self) -> Result<(), Error> {
        match self.api_version {
            ApiVersion::V4 => self.send_action("action/stop").await,
            ApiVersion::V5 => self.send_action("kill").await,
        }
    }

    async fn send_action(&self, action: &str) -> Result<(), Error> {
        let url = format!("scenes/{}/{action}", self.fibaro_id());
        tracing::debug!(url = %url, scene = %self.name(), "Sending scene action");
        self.rest_client.post(&url, None, None).await?;
        Ok(())
    }
}
