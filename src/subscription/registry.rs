// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-device listener registry.
//!
//! - [`ListenerId`] - Unique identifier of one registration
//! - [`ListenerHandle`] - Token returned on registration, used to unregister
//! - [`ListenerRegistry`] - Listeners keyed by device id, dispatched in
//!   registration order

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::model::FibaroId;

/// Unique identifier of a listener registration.
///
/// Ids increase monotonically within a registry, so ordering by id is
/// registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Listener({})", self.0)
    }
}

/// Type alias for listener callbacks.
type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Removal side of a registry, independent of the payload type.
trait Unregister: Send + Sync {
    fn remove(&self, fibaro_id: FibaroId, id: ListenerId) -> bool;
}

/// Token for one registered listener.
///
/// Dropping the handle keeps the listener registered. Call
/// [`unregister`](Self::unregister) to remove it; the handle is consumed, so
/// a listener cannot be removed twice.
pub struct ListenerHandle {
    fibaro_id: FibaroId,
    id: ListenerId,
    registry: Weak<dyn Unregister>,
}

impl ListenerHandle {
    /// Returns the device id the listener is registered for.
    #[must_use]
    pub fn fibaro_id(&self) -> FibaroId {
        self.fibaro_id
    }

    /// Returns the id of the registration.
    #[must_use]
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Removes the listener from its registry.
    ///
    /// Returns `true` if the listener was still registered. Returns `false`
    /// if the registry is gone or was cleared in the meantime.
    pub fn unregister(self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.remove(self.fibaro_id, self.id))
    }
}

impl std::fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("fibaro_id", &self.fibaro_id)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Registry of listeners keyed by device id.
///
/// Each device id maps to its listeners in registration order. All methods
/// take `&self`; the map is guarded by a `parking_lot::RwLock`.
///
/// Dispatch clones the listener list for the device and releases the lock
/// before calling any listener, so listeners may register or unregister
/// (themselves included) while being called. A panicking listener is logged
/// and skipped; the remaining listeners still run.
pub struct ListenerRegistry<T> {
    /// Counter for generating unique listener IDs.
    next_id: AtomicU64,
    listeners: RwLock<HashMap<FibaroId, BTreeMap<ListenerId, Listener<T>>>>,
}

impl<T: 'static> ListenerRegistry<T> {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: RwLock::new(HashMap::new()),
        }
    }

    fn next_id(&self) -> ListenerId {
        ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers a listener for the device.
    pub fn register<F>(self: &Arc<Self>, fibaro_id: FibaroId, callback: F) -> ListenerHandle
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.listeners
            .write()
            .entry(fibaro_id)
            .or_default()
            .insert(id, Arc::new(callback));

        tracing::debug!(fibaro_id = %fibaro_id, listener = %id, "Listener registered");

        let weak = Arc::downgrade(self);
        let registry: Weak<dyn Unregister> = weak;
        ListenerHandle {
            fibaro_id,
            id,
            registry,
        }
    }

    /// Calls every listener of the device with `value`.
    ///
    /// Returns the number of listeners called. Unknown device ids are a
    /// no-op.
    pub fn dispatch(&self, fibaro_id: FibaroId, value: &T) -> usize {
        let snapshot: Vec<(ListenerId, Listener<T>)> = match self.listeners.read().get(&fibaro_id) {
            Some(listeners) => listeners
                .iter()
                .map(|(id, callback)| (*id, Arc::clone(callback)))
                .collect(),
            None => return 0,
        };

        for (id, callback) in &snapshot {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| callback(value))) {
                tracing::warn!(
                    fibaro_id = %fibaro_id,
                    listener = %id,
                    panic = panic_message(panic.as_ref()),
                    "Listener panicked"
                );
            }
        }
        snapshot.len()
    }

    /// Returns the number of listeners registered for the device.
    #[must_use]
    pub fn listener_count(&self, fibaro_id: FibaroId) -> usize {
        self.listeners.read().get(&fibaro_id).map_or(0, BTreeMap::len)
    }

    /// Returns the total number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.read().values().map(BTreeMap::len).sum()
    }

    /// Returns `true` if there are no registered listeners.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes all listeners.
    pub fn clear(&self) {
        self.listeners.write().clear();
    }
}

impl<T: 'static> Unregister for ListenerRegistry<T> {
    fn remove(&self, fibaro_id: FibaroId, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let Some(device_listeners) = listeners.get_mut(&fibaro_id) else {
            return false;
        };
        let removed = device_listeners.remove(&id).is_some();
        if device_listeners.is_empty() {
            listeners.remove(&fibaro_id);
        }
        if removed {
            tracing::debug!(fibaro_id = %fibaro_id, listener = %id, "Listener unregistered");
        }
        removed
    }
}

impl<T: 'static> Default for ListenerRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> std::fmt::Debug for ListenerRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listener_count", &self.len())
            .finish()
    }
}

/// Extracts the message of a caught panic.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn listener_id_display() {
        assert_eq!(ListenerId(42).to_string(), "Listener(42)");
    }

    #[test]
    fn registry_new_is_empty() {
        let registry = ListenerRegistry::<u32>::new();
        assert!(registry.is_empty());
        assert_eq!(registry.listener_count(FibaroId::new(1)), 0);
    }

    #[test]
    fn dispatch_only_reaches_matching_device() {
        let registry = Arc::new(ListenerRegistry::<u32>::new());
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        registry.register(FibaroId::new(28), move |value| {
            counter_clone.fetch_add(*value, Ordering::SeqCst);
        });

        assert_eq!(registry.dispatch(FibaroId::new(28), &5), 1);
        assert_eq!(registry.dispatch(FibaroId::new(3), &5), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn dispatch_in_registration_order() {
        let registry = Arc::new(ListenerRegistry::<()>::new());
        let calls = Arc::new(Mutex::new(Vec::new()));

        for n in 0..3 {
            let calls = calls.clone();
            registry.register(FibaroId::new(1), move |()| calls.lock().push(n));
        }

        registry.dispatch(FibaroId::new(1), &());
        assert_eq!(*calls.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn unregister_removes_only_that_listener() {
        let registry = Arc::new(ListenerRegistry::<()>::new());
        let counter = Arc::new(AtomicU32::new(0));

        let c1 = counter.clone();
        let first = registry.register(FibaroId::new(1), move |()| {
            c1.fetch_add(1, Ordering::SeqCst);
        });
        let c2 = counter.clone();
        registry.register(FibaroId::new(1), move |()| {
            c2.fetch_add(10, Ordering::SeqCst);
        });

        assert!(first.unregister());
        assert_eq!(registry.listener_count(FibaroId::new(1)), 1);

        registry.dispatch(FibaroId::new(1), &());
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn unregister_after_clear_returns_false() {
        let registry = Arc::new(ListenerRegistry::<()>::new());
        let handle = registry.register(FibaroId::new(1), |()| {});

        registry.clear();
        assert!(!handle.unregister());
    }

    #[test]
    fn unregister_after_registry_dropped_returns_false() {
        let registry = Arc::new(ListenerRegistry::<()>::new());
        let handle = registry.register(FibaroId::new(1), |()| {});

        drop(registry);
        assert!(!handle.unregister());
    }

    #[test]
    fn panicking_listener_does_not_stop_dispatch() {
        let registry = Arc::new(ListenerRegistry::<()>::new());
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        registry.register(FibaroId::new(1), |()| panic!("listener failure"));
        registry.register(FibaroId::new(1), move |()| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(registry.dispatch(FibaroId::new(1), &()), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listener_may_unregister_itself() {
        let registry = Arc::new(ListenerRegistry::<()>::new());
        let slot: Arc<Mutex<Option<ListenerHandle>>> = Arc::new(Mutex::new(None));
        let counter = Arc::new(AtomicU32::new(0));

        let slot_clone = slot.clone();
        let counter_clone = counter.clone();
        let handle = registry.register(FibaroId::new(1), move |()| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            if let Some(handle) = slot_clone.lock().take() {
                handle.unregister();
            }
        });
        *slot.lock() = Some(handle);

        registry.dispatch(FibaroId::new(1), &());
        registry.dispatch(FibaroId::new(1), &());

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn panic_message_extraction() {
        let panic = std::panic::catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(panic_message(panic.as_ref()), "boom");
    }
}
