//! EventManager<T>: routes named events to their [`ListenerCollection`]s.
//!
//! Collections are created lazily on the first subscription to a name and
//! kept (possibly empty) until [`EventManager::remove_all_listeners`] discards
//! the whole mapping. The map lock is only held long enough to look up or
//! insert a collection, never while listeners run, so listeners can call
//! `on()`/`off()`/`emit()` on the same manager.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{EmitError, Result};

use super::listener_collection::{ListenerCollection, ListenerFn, Unsubscribe};

/// Name-keyed multiplexer over many [`ListenerCollection`]s.
pub struct EventManager<T> {
    events: Mutex<HashMap<String, Arc<ListenerCollection<T>>>>,
}

impl<T: 'static> EventManager<T> {
    /// Create a new manager with no known events.
    pub fn new() -> Self {
        Self {
            events: Mutex::new(HashMap::new()),
        }
    }

    // -----------------------------------------------------------------------
    // Subscription
    // -----------------------------------------------------------------------

    /// Subscribe `callback` to `event_name`, creating its collection if needed.
    pub fn add_listener(
        &self,
        event_name: &str,
        callback: impl Fn(&T) + Send + Sync + 'static,
        once: bool,
    ) -> Unsubscribe {
        self.add_listener_arc(event_name, Arc::new(callback), once)
    }

    /// Identity-preserving form of [`add_listener`](Self::add_listener); pass
    /// the same `Arc` to [`off`](Self::off) to remove it later.
    pub fn add_listener_arc(
        &self,
        event_name: &str,
        callback: Arc<ListenerFn<T>>,
        once: bool,
    ) -> Unsubscribe {
        self.collection_for(event_name).subscribe_arc(callback, once)
    }

    pub fn on(
        &self,
        event_name: &str,
        callback: impl Fn(&T) + Send + Sync + 'static,
    ) -> Unsubscribe {
        self.add_listener(event_name, callback, false)
    }

    pub fn on_arc(&self, event_name: &str, callback: Arc<ListenerFn<T>>) -> Unsubscribe {
        self.add_listener_arc(event_name, callback, false)
    }

    /// Subscribe a listener that is removed after its first invocation.
    pub fn once(
        &self,
        event_name: &str,
        callback: impl Fn(&T) + Send + Sync + 'static,
    ) -> Unsubscribe {
        self.add_listener(event_name, callback, true)
    }

    pub fn once_arc(&self, event_name: &str, callback: Arc<ListenerFn<T>>) -> Unsubscribe {
        self.add_listener_arc(event_name, callback, true)
    }

    // -----------------------------------------------------------------------
    // Removal
    // -----------------------------------------------------------------------

    /// Remove every listener for `event_name` registered with `callback`.
    ///
    /// Unknown event names are a no-op. Returns `true` if anything was removed.
    pub fn remove_listener(&self, event_name: &str, callback: &Arc<ListenerFn<T>>) -> bool {
        match self.get(event_name) {
            Some(collection) => collection.unsubscribe(callback),
            None => false,
        }
    }

    pub fn off(&self, event_name: &str, callback: &Arc<ListenerFn<T>>) -> bool {
        self.remove_listener(event_name, callback)
    }

    /// Discard the entire name→collection mapping.
    ///
    /// Every previously known name behaves as unseen afterwards. A pass that
    /// is already running keeps its own collection alive until it finishes.
    pub fn remove_all_listeners(&self) {
        let discarded = std::mem::take(&mut *self.events.lock());
        tracing::debug!(events = discarded.len(), "discarded all event listeners");
        drop(discarded);
    }

    // -----------------------------------------------------------------------
    // Emission
    // -----------------------------------------------------------------------

    /// Notify the listeners of `event_name` with `args`. Unknown names are a
    /// no-op. Listener panics propagate, as with
    /// [`ListenerCollection::notify`].
    pub fn emit(&self, event_name: &str, args: &T) {
        if let Some(collection) = self.get(event_name) {
            collection.notify(args);
        }
    }

    /// Like [`emit`](Self::emit), but every listener runs even if an earlier
    /// one panics; the panics are reported in the returned error.
    pub fn emit_isolated(&self, event_name: &str, args: &T) -> Result<(), EmitError> {
        let Some(collection) = self.get(event_name) else {
            return Ok(());
        };
        collection
            .notify_isolated(args)
            .map_err(|source| EmitError::Listeners {
                event: event_name.to_string(),
                source,
            })
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// The collection for `event_name`, if one has been created.
    pub fn get(&self, event_name: &str) -> Option<Arc<ListenerCollection<T>>> {
        self.events.lock().get(event_name).cloned()
    }

    /// A copy of the full name→collection mapping.
    pub fn gets(&self) -> HashMap<String, Arc<ListenerCollection<T>>> {
        self.events.lock().clone()
    }

    /// Names with a collection, in no particular order.
    pub fn event_names(&self) -> Vec<String> {
        self.events.lock().keys().cloned().collect()
    }

    /// Number of linked listeners for `event_name` (0 for unknown names).
    pub fn listener_count(&self, event_name: &str) -> usize {
        self.get(event_name).map_or(0, |c| c.size())
    }

    fn collection_for(&self, event_name: &str) -> Arc<ListenerCollection<T>> {
        let mut events = self.events.lock();
        if let Some(collection) = events.get(event_name) {
            return Arc::clone(collection);
        }
        tracing::debug!(event = event_name, "creating listener collection");
        let collection = Arc::new(ListenerCollection::new());
        events.insert(event_name.to_string(), Arc::clone(&collection));
        collection
    }
}

impl<T: 'static> Default for EventManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Free-function constructor, for call sites that prefer it over `new()`.
pub fn create_event_manager<T: 'static>() -> EventManager<T> {
    EventManager::new()
}
