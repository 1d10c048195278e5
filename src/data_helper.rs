// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Convenience readers over [`FibaroClient`].

use std::collections::{HashMap, HashSet};

use crate::client::FibaroClient;
use crate::error::Result;
use crate::model::{DeviceModel, FibaroId, InfoModel, SceneModel};

/// Device types representing the radio controllers of the hub itself.
const CONTROLLER_TYPES: &[&str] = &[
    "com.fibaro.zwavePrimaryController",
    "com.fibaro.zigbeePrimaryController",
    "com.fibaro.niceEngine",
];

/// Reads a mapping of room id to room name.
///
/// # Errors
///
/// Returns error if the request fails.
pub async fn read_rooms(client: &FibaroClient) -> Result<HashMap<FibaroId, String>> {
    Ok(client
        .read_rooms()
        .await?
        .into_iter()
        .map(|room| (room.fibaro_id(), room.name().to_string()))
        .collect())
}

/// Reads all scenes.
///
/// # Errors
///
/// Returns error if the request fails.
pub async fn read_scenes(client: &FibaroClient) -> Result<Vec<SceneModel>> {
    client.read_scenes().await
}

/// Reads the hub information.
///
/// # Errors
///
/// Returns error if the request fails.
pub async fn get_hub_information(client: &FibaroClient) -> Result<InfoModel> {
    client.read_info().await
}

/// Reads all devices except the ones representing the controllers.
///
/// Plugin devices are only included if `include_devices_from_plugins` is
/// set.
///
/// # Errors
///
/// Returns error if the request fails.
pub async fn read_devices(
    client: &FibaroClient,
    include_devices_from_plugins: bool,
) -> Result<Vec<DeviceModel>> {
    let devices = client.read_devices().await?;
    Ok(filter_devices(devices, include_devices_from_plugins))
}

fn filter_devices(
    devices: Vec<DeviceModel>,
    include_devices_from_plugins: bool,
) -> Vec<DeviceModel> {
    let controller_ids: HashSet<FibaroId> = devices
        .iter()
        .filter(|device| {
            device
                .device_type()
                .is_some_and(|device_type| CONTROLLER_TYPES.contains(&device_type))
        })
        .map(DeviceModel::fibaro_id)
        .collect();

    devices
        .into_iter()
        .filter(|device| !controller_ids.contains(&device.fibaro_id()))
        .filter(|device| include_devices_from_plugins || !device.is_plugin())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::model::ApiVersion;
    use serde_json::{Value, json};

    fn devices(value: Value) -> Vec<DeviceModel> {
        let rest_client = ClientConfig::new("http://hc/api/")
            .into_rest_client()
            .unwrap();
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|device| {
                DeviceModel::new(
                    device.as_object().unwrap().clone(),
                    rest_client.clone(),
                    ApiVersion::V5,
                )
            })
            .collect()
    }

    fn fixture() -> Vec<DeviceModel> {
        devices(json!([
            {"id": 1, "name": "zwave", "type": "com.fibaro.zwavePrimaryController", "isPlugin": false},
            {"id": 3, "name": "Lamp", "type": "com.fibaro.binarySwitch", "isPlugin": false},
            {"id": 40, "name": "Quick App", "type": "com.fibaro.genericDevice", "isPlugin": true},
        ]))
    }

    #[test]
    fn controllers_and_plugins_are_dropped() {
        let ids: Vec<i64> = filter_devices(fixture(), false)
            .iter()
            .map(|device| device.fibaro_id().value())
            .collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn plugins_included_on_request() {
        let ids: Vec<i64> = filter_devices(fixture(), true)
            .iter()
            .map(|device| device.fibaro_id().value())
            .collect();
        assert_eq!(ids, vec![3, 40]);
    }
}
