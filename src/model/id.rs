// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hub object identifier type.

use std::fmt;

use serde_json::Value;

/// Identifier of a device, room or scene on the hub.
///
/// The hub numbers its objects with integers. This wrapper keeps those ids
/// apart from other integers such as cursors or key ids.
///
/// # Examples
///
/// ```
/// use fibaro_lib::FibaroId;
///
/// let id = FibaroId::from(28);
/// assert_eq!(id.value(), 28);
/// assert_eq!(id.to_string(), "28");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FibaroId(i64);

impl FibaroId {
    /// Creates an id from its raw value.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }

    /// Reads an id from a JSON number or numeric string.
    pub(crate) fn from_json(value: &Value) -> Option<Self> {
        super::json_int(value).map(Self)
    }
}

impl fmt::Display for FibaroId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for FibaroId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<i32> for FibaroId {
    fn from(id: i32) -> Self {
        Self(i64::from(id))
    }
}

impl From<u32> for FibaroId {
    fn from(id: u32) -> Self {
        Self(i64::from(id))
    }
}

impl From<FibaroId> for i64 {
    fn from(id: FibaroId) -> Self {
        id.0
    }
}
