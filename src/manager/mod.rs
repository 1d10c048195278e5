// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! High level access to the devices of a hub.
//!
//! The [`DeviceManager`] loads all devices, keeps them in sync with the hub
//! and dispatches changes and events to per-device listeners.
//!
//! # Examples
//!
//! ```no_run
//! use fibaro_lib::{ClientConfig, FibaroClient};
//! use fibaro_lib::manager::DeviceManager;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> fibaro_lib::Result<()> {
//!     let client = Arc::new(FibaroClient::new(
//!         ClientConfig::new("http://192.168.1.166/api/").with_credentials("admin", "admin"),
//!     )?);
//!     client.connect().await?;
//!
//!     let manager = DeviceManager::new(client, false).await?;
//!     for device in manager.get_devices() {
//!         println!("{} {}", device.fibaro_id(), device.name());
//!     }
//!
//!     manager.add_event_listener(13, |event| {
//!         println!("Key {} {}", event.key_id(), event.key_event_type());
//!     });
//!
//!     tokio::time::sleep(std::time::Duration::from_secs(60)).await;
//!     manager.close();
//!     Ok(())
//! }
//! ```

mod device_manager;

pub use device_manager::DeviceManager;
