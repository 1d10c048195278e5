// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device cache and listener fan-out on top of the polling loop.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use serde_json::Value;

use super::{FibaroEvent, StateResolver};
use crate::client::FibaroClient;
use crate::data_helper;
use crate::error::{Error, Result};
use crate::model::{DeviceModel, FibaroId};
use crate::subscription::{ListenerHandle, ListenerRegistry};

/// Keeps a local copy of all devices in sync with the hub and notifies
/// listeners about changes and events per device.
///
/// [`start`](Self::start) reads all devices and registers the multiplexer as
/// the update handler of the client. Every polled diff is merged into the
/// cached devices; the change listeners of a device receive the updated
/// device, the event listeners the events emitted by it.
///
/// Listeners run on the polling task and must not block. They may register
/// and unregister listeners, themselves included.
///
/// Listeners stay registered across [`stop`](Self::stop) and a later
/// restart. Dropping a started multiplexer stops it.
pub struct StateMultiplexer {
    client: Arc<FibaroClient>,
    include_devices_from_plugins: bool,
    started: AtomicBool,
    shared: Arc<Shared>,
}

struct Shared {
    devices: RwLock<BTreeMap<FibaroId, DeviceModel>>,
    change_listeners: Arc<ListenerRegistry<DeviceModel>>,
    event_listeners: Arc<ListenerRegistry<FibaroEvent>>,
}

impl StateMultiplexer {
    /// Creates a stopped multiplexer with an empty cache.
    #[must_use]
    pub fn new(client: Arc<FibaroClient>, include_devices_from_plugins: bool) -> Self {
        Self {
            client,
            include_devices_from_plugins,
            started: AtomicBool::new(false),
            shared: Arc::new(Shared {
                devices: RwLock::new(BTreeMap::new()),
                change_listeners: Arc::new(ListenerRegistry::new()),
                event_listeners: Arc::new(ListenerRegistry::new()),
            }),
        }
    }

    /// Loads the devices and starts dispatching changes and events.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HandlerAlreadyRegistered`] if the client already has
    /// an update handler, and any error from reading the devices or
    /// starting the polling loop.
    pub async fn start(&self) -> Result<()> {
        if self.client.has_update_handler() {
            return Err(Error::HandlerAlreadyRegistered);
        }

        let devices =
            data_helper::read_devices(&self.client, self.include_devices_from_plugins).await?;
        tracing::debug!(count = devices.len(), "Loaded devices");
        {
            let mut cache = self.shared.devices.write();
            cache.clear();
            cache.extend(devices.into_iter().map(|device| (device.fibaro_id(), device)));
        }

        let shared = Arc::clone(&self.shared);
        self.client
            .register_update_handler(move |document| shared.on_change(document))?;
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Stops the polling loop and clears the device cache.
    ///
    /// Only the update handler registered by [`start`](Self::start) is
    /// removed from the client.
    pub fn stop(&self) {
        if self.started.swap(false, Ordering::SeqCst) {
            self.client.unregister_update_handler();
        }
        self.shared.devices.write().clear();
    }

    /// Registers a listener receiving the updated device whenever one of
    /// its properties changes.
    pub fn add_change_listener<F>(
        &self,
        fibaro_id: impl Into<FibaroId>,
        listener: F,
    ) -> ListenerHandle
    where
        F: Fn(&DeviceModel) + Send + Sync + 'static,
    {
        self.shared
            .change_listeners
            .register(fibaro_id.into(), listener)
    }

    /// Registers a listener receiving the events emitted by the device.
    pub fn add_event_listener<F>(
        &self,
        fibaro_id: impl Into<FibaroId>,
        listener: F,
    ) -> ListenerHandle
    where
        F: Fn(&FibaroEvent) + Send + Sync + 'static,
    {
        self.shared
            .event_listeners
            .register(fibaro_id.into(), listener)
    }

    /// Returns a snapshot of all cached devices, ordered by id.
    #[must_use]
    pub fn get_devices(&self) -> Vec<DeviceModel> {
        self.shared.devices.read().values().cloned().collect()
    }

    /// Returns a snapshot of one cached device.
    #[must_use]
    pub fn get_device(&self, fibaro_id: impl Into<FibaroId>) -> Option<DeviceModel> {
        self.shared.devices.read().get(&fibaro_id.into()).cloned()
    }
}

impl Drop for StateMultiplexer {
    fn drop(&mut self) {
        if self.started.load(Ordering::SeqCst) {
            tracing::debug!("Stopping dropped state multiplexer");
            self.stop();
        }
    }
}

impl std::fmt::Debug for StateMultiplexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateMultiplexer")
            .field("include_devices_from_plugins", &self.include_devices_from_plugins)
            .field("started", &self.started.load(Ordering::SeqCst))
            .field("device_count", &self.shared.devices.read().len())
            .field("change_listeners", &self.shared.change_listeners)
            .field("event_listeners", &self.shared.event_listeners)
            .finish_non_exhaustive()
    }
}

impl Shared {
    /// Merges one diff into the cache and notifies listeners.
    ///
    /// State changes are handled before events, each in document order.
    fn on_change(&self, document: &Value) {
        let resolver = match StateResolver::new(document) {
            Ok(resolver) => resolver,
            Err(error) => {
                tracing::warn!(error = %error, "Ignoring malformed state document");
                return;
            }
        };

        for change in resolver.state_updates() {
            let fibaro_id = change.fibaro_id();
            let updated = {
                let mut devices = self.devices.write();
                devices.get_mut(&fibaro_id).map(|device| {
                    device.update_properties(change.property_changes());
                    device.clone()
                })
            };

            match updated {
                Some(device) => {
                    self.change_listeners.dispatch(fibaro_id, &device);
                }
                None => {
                    tracing::debug!(fibaro_id = %fibaro_id, "Dropping change of unknown device");
                }
            }
        }

        for event in resolver.events() {
            if let Some(fibaro_id) = event.fibaro_id() {
                self.event_listeners.dispatch(fibaro_id, &event);
            }
        }
    }
}
