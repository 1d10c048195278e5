// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device model for the `devices` endpoint.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use super::{ApiVersion, ColorModel, FibaroId, ValueModel, json_bool, json_float, json_int};
use crate::error::{Error, ParseError};
use crate::protocol::RestClient;

/// Device types that are not real devices and never reported.
const IGNORE_DEVICE: &[&str] = &["HC_user", "VOIP_user", "iOS_device"];

/// A device on the hub.
///
/// Holds the static description of the device (name, type, room, ...) and
/// its `properties` mapping. The properties are kept up to date by the
/// [`StateMultiplexer`](crate::StateMultiplexer) while it is running; the
/// models it hands out are snapshots.
///
/// Property accessors return a neutral default (0, `false`, empty) if the
/// device does not report the property. Use the `has_*` companion to tell a
/// missing property from a default value.
#[derive(Clone)]
pub struct DeviceModel {
    data: Map<String, Value>,
    properties: Map<String, Value>,
    rest_client: RestClient,
    api_version: ApiVersion,
}

impl fmt::Debug for DeviceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceModel")
            .field("fibaro_id", &self.fibaro_id())
            .field("name", &self.name())
            .field("type", &self.device_type())
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

impl DeviceModel {
    /// Creates a device from one entry of the `devices` endpoint.
    #[must_use]
    pub fn new(
        mut data: Map<String, Value>,
        rest_client: RestClient,
        api_version: ApiVersion,
    ) -> Self {
        let properties = match data.remove("properties") {
            Some(Value::Object(properties)) => properties,
            _ => Map::new(),
        };
        Self {
            data,
            properties,
            rest_client,
            api_version,
        }
    }

    /// Loads all devices from the hub.
    ///
    /// Internal device types (users, phones) and entries without `id` or
    /// `name` are skipped.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the hub does not answer with a
    /// list.
    pub async fn read_devices(
        rest_client: &RestClient,
        api_version: ApiVersion,
    ) -> Result<Vec<Self>, Error> {
        let response = rest_client.get("devices", None).await?;
        let devices = super::into_objects("devices", response)?
            .into_iter()
            .filter(|device| {
                let device_type = device.get("type").and_then(Value::as_str);
                if device_type.is_some_and(|t| IGNORE_DEVICE.contains(&t)) {
                    tracing::debug!(id = ?device.get("id"), "Ignore device");
                    false
                } else if !device.contains_key("id") || !device.contains_key("name") {
                    tracing::debug!("Ignore device because it does not contain id or name");
                    false
                } else {
                    true
                }
            })
            .map(|device| Self::new(device, rest_client.clone(), api_version))
            .collect();
        Ok(devices)
    }

    /// Returns the API version of the hub the device belongs to.
    #[must_use]
    pub fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    fn int_field(&self, key: &str) -> i64 {
        self.data.get(key).and_then(json_int).unwrap_or(0)
    }

    fn int_property(&self, key: &str) -> i64 {
        self.properties.get(key).and_then(json_int).unwrap_or(0)
    }

    fn float_property(&self, key: &str) -> f64 {
        self.properties.get(key).and_then(json_float).unwrap_or(0.0)
    }

    fn str_property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    // ========================================================================
    // Static description
    // ========================================================================

    /// Returns the device id.
    #[must_use]
    pub fn fibaro_id(&self) -> FibaroId {
        self.data
            .get("id")
            .and_then(FibaroId::from_json)
            .unwrap_or_default()
    }

    /// Returns the device name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.data.get("name").and_then(Value::as_str).unwrap_or_default()
    }

    /// Returns the id of the parent device, or 0 if there is no parent.
    #[must_use]
    pub fn parent_fibaro_id(&self) -> FibaroId {
        FibaroId::new(self.int_field("parentId"))
    }

    /// Returns the device type, e.g. `com.fibaro.binarySwitch`.
    #[must_use]
    pub fn device_type(&self) -> Option<&str> {
        self.data.get("type").and_then(Value::as_str)
    }

    /// Returns the device base type.
    #[must_use]
    pub fn base_type(&self) -> Option<&str> {
        self.data.get("baseType").and_then(Value::as_str)
    }

    /// Returns the room id, or 0 if no room is assigned.
    #[must_use]
    pub fn room_id(&self) -> i64 {
        self.int_field("roomID")
    }

    /// Returns the enabled flag. Devices without that flag are enabled.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.data.get("enabled").is_none_or(json_bool)
    }

    /// Returns the visible flag. Devices without that flag are visible.
    #[must_use]
    pub fn visible(&self) -> bool {
        self.data.get("visible").is_none_or(json_bool)
    }

    /// Returns true for virtual devices and quick apps, false for physical
    /// devices and controllers.
    ///
    /// Devices that do not report the flag count as plugins.
    #[must_use]
    pub fn is_plugin(&self) -> bool {
        self.data.get("isPlugin").is_none_or(json_bool)
    }

    /// Returns true if the device has the interface (capability).
    #[must_use]
    pub fn has_interface(&self, interface_name: &str) -> bool {
        self.data
            .get("interfaces")
            .and_then(Value::as_array)
            .is_some_and(|interfaces| interfaces.iter().any(|i| i.as_str() == Some(interface_name)))
    }

    /// Returns the available actions with their number of arguments.
    pub fn actions(&self) -> impl Iterator<Item = (&str, i64)> {
        self.data
            .get("actions")
            .and_then(Value::as_object)
            .into_iter()
            .flat_map(|actions| actions.iter())
            .map(|(name, args)| (name.as_str(), json_int(args).unwrap_or(0)))
    }

    /// Returns true if the device advertises the action.
    #[must_use]
    pub fn has_action(&self, action: &str) -> bool {
        self.data
            .get("actions")
            .and_then(Value::as_object)
            .is_some_and(|actions| actions.contains_key(action))
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Returns the raw properties mapping.
    #[must_use]
    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    /// Merges changed properties into the device.
    ///
    /// Keys present in `changes` overwrite the current value, all other
    /// properties stay untouched.
    pub(crate) fn update_properties(&mut self, changes: &Map<String, Value>) {
        for (property, value) in changes {
            tracing::debug!(
                device = %self.name(),
                fibaro_id = %self.fibaro_id(),
                property = %property,
                value = %value,
                "Updating device property"
            );
            self.properties.insert(property.clone(), value.clone());
        }
    }

    /// Returns the unit of the value property.
    #[must_use]
    pub fn unit(&self) -> Option<&str> {
        self.str_property("unit")
    }

    /// Returns true if the device has a unit property.
    #[must_use]
    pub fn has_unit(&self) -> bool {
        self.has_property("unit")
    }

    /// Returns the endpoint id or 0.
    ///
    /// Endpoints are numbered if one physical device exposes several
    /// logical devices.
    #[must_use]
    pub fn endpoint_id(&self) -> i64 {
        self.int_property("endPointId")
    }

    /// Returns true if the device has an endpoint id property.
    #[must_use]
    pub fn has_endpoint_id(&self) -> bool {
        self.has_property("endPointId")
    }

    /// Returns the battery level in percent.
    ///
    /// The hub reports 255 for an unknown level, which is returned as 0.
    #[must_use]
    pub fn battery_level(&self) -> i64 {
        match self.int_property("batteryLevel") {
            255 => 0,
            percent => percent,
        }
    }

    #[must_use]
    pub fn has_battery_level(&self) -> bool {
        self.has_property("batteryLevel")
    }

    /// Returns the armed state, false if not supported.
    #[must_use]
    pub fn armed(&self) -> bool {
        self.properties.get("armed").is_some_and(json_bool)
    }

    #[must_use]
    pub fn has_armed(&self) -> bool {
        self.has_property("armed")
    }

    /// Returns true if the device is unreachable, false if not supported.
    #[must_use]
    pub fn dead(&self) -> bool {
        self.properties.get("dead").is_some_and(json_bool)
    }

    #[must_use]
    pub fn has_dead(&self) -> bool {
        self.has_property("dead")
    }

    #[must_use]
    pub fn dead_reason(&self) -> Option<&str> {
        self.str_property("deadReason")
    }

    #[must_use]
    pub fn has_dead_reason(&self) -> bool {
        self.has_property("deadReason")
    }

    /// Returns the `value` property.
    #[must_use]
    pub fn value(&self) -> ValueModel<'_> {
        ValueModel::new(&self.properties, "value")
    }

    /// Returns the `value2` property.
    #[must_use]
    pub fn value_2(&self) -> ValueModel<'_> {
        ValueModel::new(&self.properties, "value2")
    }

    /// Returns the `state` property.
    #[must_use]
    pub fn state(&self) -> ValueModel<'_> {
        ValueModel::new(&self.properties, "state")
    }

    /// Returns the current color.
    #[must_use]
    pub fn color(&self) -> ColorModel<'_> {
        ColorModel::new(&self.properties, "color")
    }

    /// Returns the last color set on the device.
    #[must_use]
    pub fn last_color_set(&self) -> ColorModel<'_> {
        ColorModel::new(&self.properties, "lastColorSet")
    }

    /// Returns the brightness or 0.
    #[must_use]
    pub fn brightness(&self) -> i64 {
        self.int_property("brightness")
    }

    #[must_use]
    pub fn has_brightness(&self) -> bool {
        self.has_property("brightness")
    }

    #[must_use]
    pub fn current_program(&self) -> i64 {
        self.int_property("currentProgram")
    }

    #[must_use]
    pub fn current_program_id(&self) -> i64 {
        self.int_property("currentProgramID")
    }

    /// Returns the mode or 0.
    #[must_use]
    pub fn mode(&self) -> i64 {
        self.int_property("mode")
    }

    #[must_use]
    pub fn has_mode(&self) -> bool {
        self.has_property("mode")
    }

    /// Returns the supported modes, e.g. of fan or HVAC devices.
    #[must_use]
    pub fn supported_modes(&self) -> Vec<i64> {
        self.int_list_property("supportedModes")
    }

    #[must_use]
    pub fn has_supported_modes(&self) -> bool {
        self.has_property("supportedModes")
    }

    /// Returns the operating mode or 0.
    #[must_use]
    pub fn operating_mode(&self) -> i64 {
        self.int_property("operatingMode")
    }

    #[must_use]
    pub fn has_operating_mode(&self) -> bool {
        self.has_property("operatingMode")
    }

    #[must_use]
    pub fn supported_operating_modes(&self) -> Vec<i64> {
        self.int_list_property("supportedOperatingModes")
    }

    #[must_use]
    pub fn has_supported_operating_modes(&self) -> bool {
        self.has_property("supportedOperatingModes")
    }

    #[must_use]
    pub fn thermostat_mode(&self) -> Option<&str> {
        self.str_property("thermostatMode")
    }

    #[must_use]
    pub fn has_thermostat_mode(&self) -> bool {
        self.has_property("thermostatMode")
    }

    #[must_use]
    pub fn thermostat_operating_state(&self) -> Option<&str> {
        self.str_property("thermostatOperatingState")
    }

    #[must_use]
    pub fn has_thermostat_operating_state(&self) -> bool {
        self.has_property("thermostatOperatingState")
    }

    #[must_use]
    pub fn supported_thermostat_modes(&self) -> Vec<&str> {
        self.properties
            .get("supportedThermostatModes")
            .and_then(Value::as_array)
            .map(|modes| modes.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn has_supported_thermostat_modes(&self) -> bool {
        self.has_property("supportedThermostatModes")
    }

    /// Returns the heating setpoint or 0.
    #[must_use]
    pub fn heating_thermostat_setpoint(&self) -> f64 {
        self.float_property("heatingThermostatSetpoint")
    }

    #[must_use]
    pub fn has_heating_thermostat_setpoint(&self) -> bool {
        self.has_property("heatingThermostatSetpoint")
    }

    #[must_use]
    pub fn heating_thermostat_setpoint_future(&self) -> f64 {
        self.float_property("heatingThermostatSetpointFuture")
    }

    #[must_use]
    pub fn has_heating_thermostat_setpoint_future(&self) -> bool {
        self.has_property("heatingThermostatSetpointFuture")
    }

    /// Returns the target level or 0.
    #[must_use]
    pub fn target_level(&self) -> f64 {
        self.float_property("targetLevel")
    }

    /// Returns true if the device can emit central scene events.
    #[must_use]
    pub fn has_central_scene_event(&self) -> bool {
        self.has_property("centralSceneSupport")
    }

    /// Returns the central scene events the device can emit.
    ///
    /// The hub reports them as list or as JSON encoded string.
    ///
    /// # Errors
    ///
    /// Returns error if the property is a string which is not valid JSON.
    pub fn central_scene_event(&self) -> Result<Vec<SceneEvent>, ParseError> {
        let entries = match self.properties.get("centralSceneSupport") {
            Some(Value::Array(entries)) => entries.clone(),
            Some(Value::String(encoded)) => serde_json::from_str(encoded)?,
            _ => Vec::new(),
        };

        Ok(entries
            .iter()
            .filter_map(Value::as_object)
            .map(|entry| SceneEvent {
                key_id: entry.get("keyId").and_then(json_int).unwrap_or(0),
                key_attributes: entry
                    .get("keyAttributes")
                    .and_then(Value::as_array)
                    .map(|attributes| {
                        attributes
                            .iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default(),
            })
            .collect())
    }

    fn int_list_property(&self, key: &str) -> Vec<i64> {
        match self.properties.get(key) {
            Some(Value::String(modes)) if !modes.is_empty() => modes
                .split(',')
                .filter_map(|mode| mode.trim().parse().ok())
                .collect(),
            Some(Value::Array(modes)) => modes.iter().filter_map(json_int).collect(),
            _ => Vec::new(),
        }
    }

    // ========================================================================
    // Actions
    // ========================================================================

    /// Executes a device action, e.g. `turnOn` or `setValue`.
    ///
    /// Actions the device does not advertise are sent anyway; a warning is
    /// logged.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn execute_action(
        &self,
        action: &str,
        arguments: &[Value],
    ) -> Result<Option<Value>, Error> {
        if !self.has_action(action) {
            tracing::warn!(
                fibaro_id = %self.fibaro_id(),
                action = %action,
                actions = ?self.actions().map(|(name, _)| name).collect::<Vec<_>>(),
                "The device has no such action"
            );
        }

        let url = format!(
            "devices/{}/action/{}",
            self.fibaro_id(),
            urlencoding::encode(action)
        );
        let body = serde_json::to_value(ActionArguments { args: arguments })
            .map_err(ParseError::Json)?;

        tracing::debug!(
            fibaro_id = %self.fibaro_id(),
            action = %action,
            args = %body,
            "Executing device action"
        );
        Ok(self.rest_client.post(&url, Some(&body), None).await?)
    }
}

/// Request body of a device action.
#[derive(Serialize)]
struct ActionArguments<'a> {
    #[serde(skip_serializing_if = "<[Value]>::is_empty")]
    args: &'a [Value],
}

/// A central scene event a device can emit, e.g. a button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneEvent {
    key_id: i64,
    key_attributes: Vec<String>,
}

impl SceneEvent {
    /// Returns the key id.
    #[must_use]
    pub fn key_id(&self) -> i64 {
        self.key_id
    }

    /// Returns the event types the key can emit, e.g. `Pressed`.
    #[must_use]
    pub fn key_event_types(&self) -> &[String] {
        &self.key_attributes
    }
}
