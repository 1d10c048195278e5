// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Read models over the hub's REST endpoints.
//!
//! Every model wraps the raw JSON object returned by the hub and exposes
//! typed accessors. Missing fields fall back to documented defaults instead
//! of failing, because the available fields vary between hub generations.
//!
//! - [`InfoModel`] - `settings/info`
//! - [`LoginModel`] - `loginStatus`
//! - [`RoomModel`] - `rooms`
//! - [`SceneModel`] - `scenes`
//! - [`DeviceModel`] - `devices`

mod device;
mod id;
mod info;
mod login;
mod room;
mod scene;
mod value;

pub use device::{DeviceModel, SceneEvent};
pub use id::FibaroId;
pub use info::{ApiVersion, InfoModel};
pub use login::LoginModel;
pub use room::RoomModel;
pub use scene::SceneModel;
pub use value::{ColorModel, ValueModel};

use serde_json::{Map, Value};

use crate::error::ParseError;

/// Reads an integer from a JSON number or a numeric string.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn json_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Reads a float from a JSON number or a numeric string.
pub(crate) fn json_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Reads a bool from a JSON bool or a `"true"`/`"false"` string.
pub(crate) fn json_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Converts a list response into its JSON objects.
pub(crate) fn into_objects(
    endpoint: &str,
    response: Option<Value>,
) -> Result<Vec<Map<String, Value>>, ParseError> {
    match response {
        Some(Value::Array(items)) => Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect()),
        Some(_) => Err(ParseError::UnexpectedFormat(format!(
            "{endpoint} did not return a list"
        ))),
        None => Err(ParseError::UnexpectedFormat(format!(
            "{endpoint} returned no content"
        ))),
    }
}

/// Converts an object response into its JSON map.
pub(crate) fn into_object(
    endpoint: &str,
    response: Option<Value>,
) -> Result<Map<String, Value>, ParseError> {
    match response {
        Some(Value::Object(map)) => Ok(map),
        _ => Err(ParseError::UnexpectedFormat(format!(
            "{endpoint} did not return an object"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_int_accepts_numbers_and_strings() {
        assert_eq!(json_int(&json!(28)), Some(28));
        assert_eq!(json_int(&json!("28")), Some(28));
        assert_eq!(json_int(&json!(3.0)), Some(3));
        assert_eq!(json_int(&json!(3.5)), None);
        assert_eq!(json_int(&json!("abc")), None);
        assert_eq!(json_int(&json!(null)), None);
    }

    #[test]
    fn json_bool_accepts_strings() {
        assert!(json_bool(&json!(true)));
        assert!(json_bool(&json!("True")));
        assert!(!json_bool(&json!("false")));
        assert!(!json_bool(&json!(1)));
    }

    #[test]
    fn into_objects_skips_non_objects() {
        let objects =
            into_objects("rooms", Some(json!([{"id": 1}, 7, {"id": 2}]))).unwrap();
        assert_eq!(objects.len(), 2);
    }

    #[test]
    fn into_objects_rejects_object() {
        assert!(into_objects("rooms", Some(json!({"id": 1}))).is_err());
        assert!(into_objects("rooms", None).is_err());
    }
}
