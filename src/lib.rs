// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `fibaro_lib` - A Rust library to access Fibaro home automation hubs.
//!
//! This library provides async APIs for the REST interface of Fibaro Home
//! Center 2, Home Center 3, Home Center Lite, Yubii Home and Z-Box Hub.
//!
//! # Supported Features
//!
//! - **Hub information**: Model, serial number, firmware, API version
//! - **Rooms and scenes**: List rooms, start and stop scenes
//! - **Devices**: Typed access to device properties, execute device actions
//! - **State synchronization**: Long-polling of the `refreshStates`
//!   endpoint with a local device cache and per-device listeners
//!
//! # Quick Start
//!
//! ## Reading Devices
//!
//! ```no_run
//! use fibaro_lib::{ClientConfig, FibaroClient};
//!
//! #[tokio::main]
//! async fn main() -> fibaro_lib::Result<()> {
//!     let client = FibaroClient::new(
//!         ClientConfig::new("http://192.168.1.166/api/").with_credentials("admin", "admin"),
//!     )?;
//!     client.connect().await?;
//!
//!     for device in client.read_devices().await? {
//!         println!("{} {} {:?}", device.fibaro_id(), device.name(), device.value().str_value());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Executing Actions
//!
//! ```no_run
//! use fibaro_lib::{ClientConfig, FibaroClient};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> fibaro_lib::Result<()> {
//!     let client = FibaroClient::new(
//!         ClientConfig::new("http://192.168.1.166/api/").with_credentials("admin", "admin"),
//!     )?;
//!     client.connect().await?;
//!
//!     for device in client.read_devices().await? {
//!         if device.has_action("setValue") {
//!             device.execute_action("setValue", &[json!(50)]).await?;
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Listening for Changes
//!
//! ```no_run
//! use fibaro_lib::{ClientConfig, DeviceManager, FibaroConnection};
//!
//! #[tokio::main]
//! async fn main() -> fibaro_lib::Result<()> {
//!     let connection = FibaroConnection::new(ClientConfig::new("http://192.168.1.166/api/"))?;
//!     connection.connect("admin", "admin").await?;
//!
//!     let manager = DeviceManager::new(connection.fibaro_client()?, false).await?;
//!
//!     // Called on the polling task for every change of device 28
//!     let handle = manager.add_change_listener(28, |device| {
//!         println!("{} is now {:?}", device.name(), device.value().float_value());
//!     });
//!
//!     tokio::time::sleep(std::time::Duration::from_secs(60)).await;
//!     handle.unregister();
//!     manager.close();
//!     Ok(())
//! }
//! ```
//!
//! # Logging
//!
//! The library logs through [`tracing`]. It does not install a subscriber.

mod client;
mod config;
mod connection;
pub mod data_helper;
pub mod error;
pub mod manager;
pub mod model;
pub mod protocol;
pub mod state;
pub mod subscription;

pub use client::FibaroClient;
pub use config::{ClientConfig, RetryPolicy};
pub use connection::FibaroConnection;
pub use error::{Error, ParseError, ProtocolError, Result, ValueError};
pub use manager::DeviceManager;
pub use model::{
    ApiVersion, ColorModel, DeviceModel, FibaroId, InfoModel, LoginModel, RoomModel, SceneEvent,
    SceneModel, ValueModel,
};
pub use protocol::RestClient;
pub use state::{
    FibaroEvent, HandlerState, StateChange, StateHandler, StateMultiplexer, StateResolver,
    UpdateCallback,
};
pub use subscription::{ListenerHandle, ListenerId, ListenerRegistry};
