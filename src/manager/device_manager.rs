// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device manager over a started state multiplexer.

use std::sync::Arc;

use crate::client::FibaroClient;
use crate::error::Result;
use crate::model::{DeviceModel, FibaroId};
use crate::state::{FibaroEvent, StateMultiplexer};
use crate::subscription::ListenerHandle;

/// Manager for the devices of one hub.
///
/// Construction loads all devices and starts the polling loop; from then on
/// the device snapshots returned by [`get_devices`](Self::get_devices) are
/// current and listeners are notified. [`close`](Self::close) stops the
/// polling loop.
#[derive(Debug)]
pub struct DeviceManager {
    multiplexer: StateMultiplexer,
}

impl DeviceManager {
    /// Loads the devices and starts listening for changes.
    ///
    /// Plugin devices (virtual devices, quick apps) are only included if
    /// `include_devices_from_plugins` is set.
    ///
    /// # Errors
    ///
    /// Returns error if the devices cannot be read or the client already has
    /// an update handler.
    pub async fn new(
        client: Arc<FibaroClient>,
        include_devices_from_plugins: bool,
    ) -> Result<Self> {
        let multiplexer = StateMultiplexer::new(client, include_devices_from_plugins);
        multiplexer.start().await?;
        Ok(Self { multiplexer })
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    /// Registers a listener receiving the updated device on property changes.
    ///
    /// Returns a handle which can be used to unregister the listener.
    pub fn add_change_listener<F>(
        &self,
        fibaro_id: impl Into<FibaroId>,
        listener: F,
    ) -> ListenerHandle
    where
        F: Fn(&DeviceModel) + Send + Sync + 'static,
    {
        self.multiplexer.add_change_listener(fibaro_id, listener)
    }

    /// Registers a listener receiving the events emitted by the device,
    /// e.g. scene activation events of buttons.
    ///
    /// Returns a handle which can be used to unregister the listener.
    pub fn add_event_listener<F>(
        &self,
        fibaro_id: impl Into<FibaroId>,
        listener: F,
    ) -> ListenerHandle
    where
        F: Fn(&FibaroEvent) + Send + Sync + 'static,
    {
        self.multiplexer.add_event_listener(fibaro_id, listener)
    }

    // =========================================================================
    // Devices
    // =========================================================================

    /// Returns the current devices, ordered by id.
    #[must_use]
    pub fn get_devices(&self) -> Vec<DeviceModel> {
        self.multiplexer.get_devices()
    }

    /// Stops listening for changes.
    pub fn close(&self) {
        self.multiplexer.stop();
    }
}
