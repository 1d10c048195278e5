// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed access to `refreshStates` diff documents.
//!
//! A diff document looks like this:
//!
//! ```json
//! {
//!     "last": 101,
//!     "changes": [{"id": 28, "value": "232.88", "log": ""}],
//!     "events": [{"type": "CentralSceneEvent", "data": {"id": 13, "keyId": 1, "keyAttribute": "Pressed"}}]
//! }
//! ```

use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::model::FibaroId;

/// Keys of a change entry that are not device properties.
const NON_PROPERTY_KEYS: &[&str] = &["log", "logTemp", "id"];

/// Changed properties of one device.
#[derive(Debug, Clone, PartialEq)]
pub struct StateChange {
    fibaro_id: FibaroId,
    property_changes: Map<String, Value>,
}

impl StateChange {
    /// Returns the id of the changed device.
    #[must_use]
    pub fn fibaro_id(&self) -> FibaroId {
        self.fibaro_id
    }

    /// Returns the changed properties with their new values.
    #[must_use]
    pub fn property_changes(&self) -> &Map<String, Value> {
        &self.property_changes
    }
}

/// An event reported by the hub.
///
/// The best known event is `CentralSceneEvent`, which is emitted for button
/// presses.
#[derive(Debug, Clone, PartialEq)]
pub struct FibaroEvent {
    raw_data: Map<String, Value>,
    data: Map<String, Value>,
}

impl FibaroEvent {
    fn new(mut raw_data: Map<String, Value>) -> Self {
        let data = match raw_data.remove("data") {
            Some(Value::Object(data)) => data,
            _ => Map::new(),
        };
        Self { raw_data, data }
    }

    /// Returns the event type, or an empty string if not reported.
    #[must_use]
    pub fn event_type(&self) -> &str {
        self.raw_data
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Returns the id of the device which emitted the event.
    ///
    /// Not every event relates to a device. Newer hubs report `id`, older
    /// ones `deviceId`, normally inside the `data` object.
    #[must_use]
    pub fn fibaro_id(&self) -> Option<FibaroId> {
        [
            self.data.get("id"),
            self.data.get("deviceId"),
            self.raw_data.get("id"),
            self.raw_data.get("deviceId"),
        ]
        .into_iter()
        .flatten()
        .find_map(FibaroId::from_json)
    }

    /// Returns the raw `data` object of the event.
    #[must_use]
    pub fn event_data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Returns the key id of a scene event, or 0.
    #[must_use]
    pub fn key_id(&self) -> i64 {
        self.data
            .get("keyId")
            .and_then(crate::model::json_int)
            .unwrap_or(0)
    }

    /// Returns the key attribute of a scene event, e.g. `Pressed`,
    /// `Released` or `HeldDown`. Empty if not reported.
    #[must_use]
    pub fn key_event_type(&self) -> &str {
        self.data
            .get("keyAttribute")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

/// Resolves a diff document into state changes and events.
///
/// The document is validated completely on construction, so iterating
/// cannot fail: either every entry is usable or the document is rejected.
/// The resolver never modifies the document.
#[derive(Debug, Clone, Copy)]
pub struct StateResolver<'a> {
    changes: &'a [Value],
    events: &'a [Value],
}

impl<'a> StateResolver<'a> {
    /// Validates a diff document.
    ///
    /// Missing or `null` `changes` and `events` count as empty.
    ///
    /// # Errors
    ///
    /// Returns error if the document is not an object, `changes` or `events`
    /// is not a list of objects, or a change entry has no numeric `id`.
    pub fn new(document: &'a Value) -> Result<Self, ParseError> {
        let Some(document) = document.as_object() else {
            return Err(ParseError::UnexpectedFormat(
                "state document is not an object".to_string(),
            ));
        };

        let changes = object_list(document, "changes")?;
        for (index, change) in changes.iter().enumerate() {
            match change.get("id") {
                None => return Err(ParseError::MissingField(format!("changes[{index}].id"))),
                Some(id) if FibaroId::from_json(id).is_none() => {
                    return Err(ParseError::InvalidValue {
                        field: format!("changes[{index}].id"),
                        message: format!("{id} is not a device id"),
                    });
                }
                Some(_) => {}
            }
        }

        let events = object_list(document, "events")?;
        Ok(Self { changes, events })
    }

    /// Returns the state changes in document order.
    pub fn state_updates(&self) -> impl Iterator<Item = StateChange> + 'a {
        self.changes
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|change| {
                let fibaro_id = change.get("id").and_then(FibaroId::from_json)?;
                let property_changes = change
                    .iter()
                    .filter(|(key, _)| !NON_PROPERTY_KEYS.contains(&key.as_str()))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                Some(StateChange {
                    fibaro_id,
                    property_changes,
                })
            })
    }

    /// Returns the events in document order.
    pub fn events(&self) -> impl Iterator<Item = FibaroEvent> + 'a {
        self.events
            .iter()
            .filter_map(Value::as_object)
            .map(|event| FibaroEvent::new(event.clone()))
    }
}

fn object_list<'a>(
    document: &'a Map<String, Value>,
    key: &str,
) -> Result<&'a [Value], ParseError> {
    match document.get(key) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(entries)) => {
            if let Some(index) = entries.iter().position(|entry| !entry.is_object()) {
                return Err(ParseError::UnexpectedFormat(format!(
                    "{key}[{index}] is not an object"
                )));
            }
            Ok(entries)
        }
        Some(_) => Err(ParseError::UnexpectedFormat(format!("{key} is not a list"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_changes_and_events() {
        let document = json!({
            "last": 101,
            "changes": [
                {"id": 28, "value": "232.88", "log": "", "logTemp": ""},
            ],
            "events": [
                {"type": "DevicePropertyUpdatedEvent", "data": {"id": 28, "property": "value"}},
                {"type": "PowerMetricsChangedEvent", "data": {}},
            ],
        });

        let resolver = StateResolver::new(&document).unwrap();

        let updates: Vec<_> = resolver.state_updates().collect();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].fibaro_id(), FibaroId::new(28));
        assert_eq!(updates[0].property_changes().len(), 1);
        assert_eq!(updates[0].property_changes()["value"], json!("232.88"));

        let events: Vec<_> = resolver.events().collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type(), "DevicePropertyUpdatedEvent");
        assert_eq!(events[0].fibaro_id(), Some(FibaroId::new(28)));
        assert_eq!(events[1].fibaro_id(), None);
    }

    #[test]
    fn empty_document() {
        let document = json!({"last": 5});
        let resolver = StateResolver::new(&document).unwrap();

        assert_eq!(resolver.state_updates().count(), 0);
        assert_eq!(resolver.events().count(), 0);
    }

    #[test]
    fn central_scene_event() {
        let document = json!({
            "events": [{
                "type": "CentralSceneEvent",
                "data": {"id": 13, "keyId": "1", "keyAttribute": "Pressed"},
            }],
        });

        let event = StateResolver::new(&document).unwrap().events().next().unwrap();
        assert_eq!(event.event_type(), "CentralSceneEvent");
        assert_eq!(event.fibaro_id(), Some(FibaroId::new(13)));
        assert_eq!(event.key_id(), 1);
        assert_eq!(event.key_event_type(), "Pressed");
    }

    #[test]
    fn event_device_id_fallbacks() {
        let document = json!({
            "events": [
                {"type": "A", "data": {"deviceId": 7}},
                {"type": "B", "id": 8},
                {"type": "C", "data": {"id": 0}},
                {"type": "D", "data": {"id": "x"}},
            ],
        });

        let ids: Vec<_> = StateResolver::new(&document)
            .unwrap()
            .events()
            .map(|event| event.fibaro_id())
            .collect();
        assert_eq!(
            ids,
            vec![
                Some(FibaroId::new(7)),
                Some(FibaroId::new(8)),
                Some(FibaroId::new(0)),
                None,
            ]
        );
    }

    #[test]
    fn event_defaults() {
        let document = json!({"events": [{}]});
        let event = StateResolver::new(&document).unwrap().events().next().unwrap();

        assert_eq!(event.event_type(), "");
        assert_eq!(event.key_id(), 0);
        assert_eq!(event.key_event_type(), "");
        assert!(event.event_data().is_empty());
    }

    #[test]
    fn rejects_change_without_id() {
        let document = json!({"changes": [{"id": 1, "value": 1}, {"value": 2}]});
        assert!(matches!(
            StateResolver::new(&document),
            Err(ParseError::MissingField(field)) if field == "changes[1].id"
        ));
    }

    #[test]
    fn rejects_non_numeric_change_id() {
        let document = json!({"changes": [{"id": "abc"}]});
        assert!(matches!(
            StateResolver::new(&document),
            Err(ParseError::InvalidValue { .. })
        ));
    }

    #[test]
    fn rejects_malformed_lists() {
        assert!(StateResolver::new(&json!({"changes": {"id": 1}})).is_err());
        assert!(StateResolver::new(&json!({"events": [1, 2]})).is_err());
        assert!(StateResolver::new(&json!([])).is_err());
    }

    #[test]
    fn does_not_modify_document() {
        let document = json!({"changes": [{"id": 3, "log": "x", "value": true}]});
        let before = document.clone();

        let resolver = StateResolver::new(&document).unwrap();
        let _ = resolver.state_updates().count();
        let _ = resolver.events().count();

        assert_eq!(document, before);
    }
}
