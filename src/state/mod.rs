// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State synchronization with the hub.
//!
//! The hub reports changes through the `refreshStates` endpoint, a long-poll
//! endpoint that answers with the diff since a cursor:
//!
//! - [`StateHandler`] - Polling loop with retry and cancellation
//! - [`StateResolver`] - Typed view of one diff document
//! - [`StateMultiplexer`] - Device cache and per-device listener fan-out
//!
//! # Examples
//!
//! ```
//! use fibaro_lib::state::StateResolver;
//! use serde_json::json;
//!
//! let diff = json!({
//!     "last": 101,
//!     "changes": [{"id": 28, "value": "232.88"}],
//!     "events": [{"type": "CentralSceneEvent", "data": {"id": 13, "keyId": 1, "keyAttribute": "Pressed"}}],
//! });
//!
//! let resolver = StateResolver::new(&diff).unwrap();
//! let change = resolver.state_updates().next().unwrap();
//! assert_eq!(change.fibaro_id().value(), 28);
//!
//! let event = resolver.events().next().unwrap();
//! assert_eq!(event.key_event_type(), "Pressed");
//! ```

mod handler;
mod multiplexer;
mod resolver;

pub use handler::{HandlerState, StateHandler, UpdateCallback};
pub use multiplexer::StateMultiplexer;
pub use resolver::{FibaroEvent, StateChange, StateResolver};
