// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Login status from `loginStatus`.

use serde_json::{Map, Value};

use crate::error::Error;
use crate::protocol::RestClient;

/// Login status of the configured user.
#[derive(Debug, Clone)]
pub struct LoginModel {
    raw_data: Map<String, Value>,
}

impl LoginModel {
    /// Loads the login status from the hub.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, e.g. with HTTP 403 for invalid
    /// credentials.
    pub async fn read(rest_client: &RestClient) -> Result<Self, Error> {
        let response = rest_client.get("loginStatus", None).await?;
        Ok(Self {
            raw_data: super::into_object("loginStatus", response)?,
        })
    }

    /// Returns true if the hub accepted the credentials.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.raw_data.get("status").is_some_and(super::json_bool)
    }
}
