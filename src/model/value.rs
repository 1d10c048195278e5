// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed views over single device properties.

use serde_json::{Map, Value};

use crate::error::ValueError;

/// Reads one device property in several representations.
///
/// The hub is not consistent in how it encodes values: the same property
/// may be reported as a JSON bool on one device and as the string `"true"`
/// on another, numbers may arrive as strings. The conversions below accept
/// all encodings seen in practice.
///
/// Conversions fail with [`ValueError::Missing`] if the property does not
/// exist and with [`ValueError::NotConvertible`] if it cannot be read as the
/// requested type. Use `unwrap_or` for a default.
///
/// # Examples
///
/// ```
/// use fibaro_lib::ValueModel;
/// use serde_json::json;
///
/// let properties = json!({"value": "21.5"});
/// let value = ValueModel::new(properties.as_object().unwrap(), "value");
///
/// assert_eq!(value.float_value(), Ok(21.5));
/// assert_eq!(value.int_value(), Ok(21));
/// assert!(value.bool_value().unwrap());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ValueModel<'a> {
    properties: &'a Map<String, Value>,
    property_name: &'static str,
}

impl<'a> ValueModel<'a> {
    /// Creates a view of `property_name` within `properties`.
    #[must_use]
    pub fn new(properties: &'a Map<String, Value>, property_name: &'static str) -> Self {
        Self {
            properties,
            property_name,
        }
    }

    fn raw(&self) -> Result<&'a Value, ValueError> {
        match self.properties.get(self.property_name) {
            Some(Value::Null) | None => Err(ValueError::Missing(self.property_name.to_string())),
            Some(value) => Ok(value),
        }
    }

    fn not_convertible(&self, target: &'static str) -> ValueError {
        ValueError::NotConvertible {
            property: self.property_name.to_string(),
            target,
        }
    }

    /// Returns true if the property exists.
    #[must_use]
    pub fn has_value(&self) -> bool {
        self.properties.contains_key(self.property_name)
    }

    /// Returns true if the property is a bool, either as JSON bool or as the
    /// string `"true"` or `"false"`.
    #[must_use]
    pub fn is_bool_value(&self) -> bool {
        match self.properties.get(self.property_name) {
            Some(Value::Bool(_)) => true,
            Some(Value::String(s)) => {
                s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false")
            }
            _ => false,
        }
    }

    /// Returns the value as string.
    ///
    /// Strings are returned as they are, other values in their JSON form.
    ///
    /// # Errors
    ///
    /// Returns error if the property does not exist.
    pub fn str_value(&self) -> Result<String, ValueError> {
        match self.properties.get(self.property_name) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(value) => Ok(value.to_string()),
            None => Err(ValueError::Missing(self.property_name.to_string())),
        }
    }

    /// Returns the value as integer. Fractions are truncated.
    ///
    /// # Errors
    ///
    /// Returns error if the property does not exist or is not numeric.
    // Saturating float to int conversion is intended
    #[allow(clippy::cast_possible_truncation)]
    pub fn int_value(&self) -> Result<i64, ValueError> {
        let value = self.raw()?;
        if let Some(int) = value.as_i64() {
            return Ok(int);
        }
        super::json_float(value)
            .filter(|f| f.is_finite())
            .map(|f| f.trunc() as i64)
            .ok_or_else(|| self.not_convertible("int"))
    }

    /// Returns the value as float.
    ///
    /// # Errors
    ///
    /// Returns error if the property does not exist or is not numeric.
    pub fn float_value(&self) -> Result<f64, ValueError> {
        let value = self.raw()?;
        super::json_float(value).ok_or_else(|| self.not_convertible("float"))
    }

    /// Returns the value as bool.
    ///
    /// Numbers and numeric strings are true when not zero, strings which are
    /// neither numeric nor a bool literal are false.
    ///
    /// # Errors
    ///
    /// Returns error if the property does not exist or is neither a bool,
    /// a string nor a number.
    pub fn bool_value(&self) -> Result<bool, ValueError> {
        match self.raw()? {
            Value::Bool(b) => Ok(*b),
            Value::String(s) if self.is_bool_value() => Ok(s.eq_ignore_ascii_case("true")),
            Value::String(s) => Ok(s.trim().parse::<f64>().is_ok_and(|f| f != 0.0)),
            Value::Number(n) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
            _ => Err(self.not_convertible("bool")),
        }
    }

    /// Returns the value as JSON object.
    ///
    /// Objects encoded as JSON string are decoded.
    ///
    /// # Errors
    ///
    /// Returns error if the property does not exist or holds no object.
    pub fn dict_value(&self) -> Result<Map<String, Value>, ValueError> {
        match self.raw()? {
            Value::Object(map) => Ok(map.clone()),
            Value::String(s) => match serde_json::from_str::<Value>(s) {
                Ok(Value::Object(map)) => Ok(map),
                _ => Err(self.not_convertible("dict")),
            },
            _ => Err(self.not_convertible("dict")),
        }
    }
}

/// Reads a color property of the form `"r,g,b,w"`.
///
/// RGB devices report the white component as 0.
#[derive(Debug, Clone, Copy)]
pub struct ColorModel<'a> {
    properties: &'a Map<String, Value>,
    property_name: &'static str,
}

impl<'a> ColorModel<'a> {
    /// Creates a view of `property_name` within `properties`.
    #[must_use]
    pub fn new(properties: &'a Map<String, Value>, property_name: &'static str) -> Self {
        Self {
            properties,
            property_name,
        }
    }

    /// Returns true if the property exists and holds a valid color.
    #[must_use]
    pub fn has_color(&self) -> bool {
        self.rgbw_color().is_ok()
    }

    /// Returns the color as `(red, green, blue, white)`.
    ///
    /// # Errors
    ///
    /// Returns error if the property does not exist or is not a list of four
    /// integers between 0 and 255.
    pub fn rgbw_color(&self) -> Result<(u8, u8, u8, u8), ValueError> {
        let Some(value) = self.properties.get(self.property_name) else {
            return Err(ValueError::Missing(self.property_name.to_string()));
        };
        let Some(color) = value.as_str() else {
            return Err(ValueError::InvalidColor(value.to_string()));
        };

        let parts = color
            .split(',')
            .map(|part| part.trim().parse::<u8>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ValueError::InvalidColor(color.to_string()))?;

        match parts.as_slice() {
            [r, g, b, w] => Ok((*r, *g, *b, *w)),
            _ => Err(ValueError::InvalidColor(format!(
                "color does not have 4 parts: {color}"
            ))),
        }
    }
}
