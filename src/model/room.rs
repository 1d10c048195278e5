// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room model for the `rooms` endpoint.

use serde_json::{Map, Value};

use super::FibaroId;
use crate::error::Error;
use crate::protocol::RestClient;

/// A room on the hub.
#[derive(Debug, Clone)]
pub struct RoomModel {
    raw_data: Map<String, Value>,
}

impl RoomModel {
    /// Wraps one entry of the `rooms` endpoint.
    #[must_use]
    pub fn new(raw_data: Map<String, Value>) -> Self {
        Self { raw_data }
    }

    /// Loads all rooms from the hub.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the hub does not answer with a
    /// list.
    pub async fn read_rooms(rest_client: &RestClient) -> Result<Vec<Self>, Error> {
        let response = rest_client.get("rooms", None).await?;
        Ok(super::into_objects("rooms", response)?
            .into_iter()
            .map(Self::new)
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
}
