// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Listener registration for device changes and events.
//!
//! Listeners are registered per device id through the
//! [`StateMultiplexer`](crate::StateMultiplexer) or the
//! [`DeviceManager`](crate::DeviceManager) and receive updates from the
//! polling task.
//!
//! ```no_run
//! use fibaro_lib::{ClientConfig, DeviceManager, FibaroClient};
//! use std::sync::Arc;
//!
//! # async fn example() -> fibaro_lib::Result<()> {
//! let client = Arc::new(FibaroClient::new(
//!     ClientConfig::new("http://192.168.1.166/api/").with_credentials("admin", "admin"),
//! )?);
//! client.connect().await?;
//!
//! let manager = DeviceManager::new(client, false).await?;
//! let handle = manager.add_change_listener(28, |device| {
//!     println!("{} changed: {:?}", device.name(), device.value().str_value());
//! });
//!
//! // Later, unregister
//! handle.unregister();
//! # Ok(())
//! # }
//! ```

mod registry;

pub use registry::{ListenerHandle, ListenerId, ListenerRegistry};
pub(crate) use registry::panic_message;
