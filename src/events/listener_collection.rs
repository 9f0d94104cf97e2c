//! ListenerCollection<T>: the ordered listener registry for a single event.
//!
//! Records live in an arena keyed by [`ListenerId`]. Ids are handed out by a
//! monotonic counter and new records are only ever appended, so key order is
//! chain order: a record's `prev`/`next` are its neighbouring keys, `first`
//! and `last` are the smallest and largest keys. Unlinking removes the key,
//! which repairs both neighbours in one step.
//!
//! Notification walks the chain one step at a time, re-reading the successor
//! of the last visited id under the lock before every invocation:
//!   - A record unlinked before the walk reaches it is never invoked.
//!   - A record unlinking itself (or an earlier one) does not disturb the walk.
//!   - A record appended during a pass is visited in that same pass.
//!
//! The lock is never held while a callback runs, so callbacks may freely call
//! back into the collection (subscribe, unsubscribe, notify, clear).
//!
//! Panics inside a listener propagate out of [`ListenerCollection::notify`]
//! and abort the rest of the pass. [`ListenerCollection::notify_isolated`]
//! is the opt-in variant that keeps going and reports failures instead.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::error::{ListenerPanic, NotifyError, Result};

/// Identifies one subscription record within a collection.
pub type ListenerId = u64;

/// Closure type for event listeners.
pub type ListenerFn<T> = dyn Fn(&T) + Send + Sync;

/// An owned one-shot closure that unlinks exactly one record when called.
///
/// Calling it after the record is already gone (or after the collection was
/// dropped) does nothing.
pub type Unsubscribe = Box<dyn FnOnce() + Send + Sync>;

type Chain<T> = BTreeMap<ListenerId, Listener<T>>;

struct Listener<T> {
    callback: Arc<ListenerFn<T>>,
    once: bool,
}

// ============================================================================
// Snapshot record
// ============================================================================

/// A read-only copy of one linked record, as returned by
/// [`ListenerCollection::get`].
pub struct ListenerRecord<T> {
    pub id: ListenerId,
    pub once: bool,
    pub callback: Arc<ListenerFn<T>>,
    /// Id of the preceding record at snapshot time.
    pub prev: Option<ListenerId>,
    /// Id of the following record at snapshot time.
    pub next: Option<ListenerId>,
}

impl<T> ListenerRecord<T> {
    /// Whether this record was registered with `callback` (pointer identity).
    pub fn is_callback(&self, callback: &Arc<ListenerFn<T>>) -> bool {
        same_callback(&self.callback, callback)
    }
}

impl<T> Clone for ListenerRecord<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            once: self.once,
            callback: Arc::clone(&self.callback),
            prev: self.prev,
            next: self.next,
        }
    }
}

impl<T> fmt::Debug for ListenerRecord<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRecord")
            .field("id", &self.id)
            .field("once", &self.once)
            .field("prev", &self.prev)
            .field("next", &self.next)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ListenerCollection
// ============================================================================

/// Ordered, re-entrant listener registry for one logical event.
///
/// `T` is the payload type; several arguments are passed as a tuple.
pub struct ListenerCollection<T> {
    chain: Arc<Mutex<Chain<T>>>,
    next_id: AtomicU64,
}

impl<T: 'static> ListenerCollection<T> {
    /// Create a new, empty collection.
    pub fn new() -> Self {
        Self {
            chain: Arc::new(Mutex::new(BTreeMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Append `callback` at the tail and return a token that unlinks exactly
    /// this record.
    ///
    /// With `once` set the record is unlinked as soon as a notification pass
    /// reaches it.
    pub fn subscribe(
        &self,
        callback: impl Fn(&T) + Send + Sync + 'static,
        once: bool,
    ) -> Unsubscribe {
        self.subscribe_arc(Arc::new(callback), once)
    }

    /// Like [`subscribe`](Self::subscribe), but keeps the caller's `Arc` so
    /// the same callback can later be removed with
    /// [`unsubscribe`](Self::unsubscribe).
    ///
    /// Subscribing the same `Arc` twice creates two independent records.
    pub fn subscribe_arc(&self, callback: Arc<ListenerFn<T>>, once: bool) -> Unsubscribe {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.chain.lock().insert(id, Listener { callback, once });

        let chain: Weak<Mutex<Chain<T>>> = Arc::downgrade(&self.chain);
        Box::new(move || {
            if let Some(chain) = chain.upgrade() {
                let _removed = chain.lock().remove(&id);
            }
        })
    }

    /// Unlink every record whose callback is `callback` (pointer identity).
    ///
    /// Returns `true` if at least one record was removed.
    pub fn unsubscribe(&self, callback: &Arc<ListenerFn<T>>) -> bool {
        // Removed callbacks are dropped after the lock is released.
        let removed: Vec<Listener<T>> = {
            let mut chain = self.chain.lock();
            let ids: Vec<ListenerId> = chain
                .iter()
                .filter(|(_, l)| same_callback(&l.callback, callback))
                .map(|(id, _)| *id)
                .collect();
            ids.iter().filter_map(|id| chain.remove(id)).collect()
        };
        !removed.is_empty()
    }

    /// Unlink the record `id`. Idempotent: returns `false` if it is not linked.
    pub fn unsubscribe_record(&self, id: ListenerId) -> bool {
        let removed = self.chain.lock().remove(&id);
        removed.is_some()
    }

    /// Invoke every linked listener with `args`, in subscription order.
    ///
    /// A panicking listener aborts the pass and the panic reaches the caller.
    pub fn notify(&self, args: &T) {
        let mut cursor = None;
        while let Some((id, callback)) = self.advance(cursor) {
            cursor = Some(id);
            callback(args);
        }
    }

    /// Like [`notify`](Self::notify), but a panicking listener does not stop
    /// the pass. Every panic is logged and collected into the returned error.
    pub fn notify_isolated(&self, args: &T) -> Result<(), NotifyError> {
        let mut failures = Vec::new();
        let mut cursor = None;
        while let Some((id, callback)) = self.advance(cursor) {
            cursor = Some(id);
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(args))) {
                let message = panic_message(payload.as_ref());
                tracing::warn!(
                    listener = id,
                    panic = %message,
                    "listener panicked, continuing notification"
                );
                failures.push(ListenerPanic {
                    listener: id,
                    message,
                });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(NotifyError { failures })
        }
    }

    /// Snapshot of the linked records, first to last.
    pub fn get(&self) -> Vec<ListenerRecord<T>> {
        let chain = self.chain.lock();
        let ids: Vec<ListenerId> = chain.keys().copied().collect();
        ids.iter()
            .enumerate()
            .map(|(i, id)| ListenerRecord {
                id: *id,
                once: chain[id].once,
                callback: Arc::clone(&chain[id].callback),
                prev: i.checked_sub(1).map(|p| ids[p]),
                next: ids.get(i + 1).copied(),
            })
            .collect()
    }

    /// Drop every record at once. Outstanding tokens become no-ops.
    pub fn clear(&self) {
        let cleared = std::mem::take(&mut *self.chain.lock());
        drop(cleared);
    }

    /// Number of currently linked records.
    pub fn size(&self) -> usize {
        self.chain.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.lock().is_empty()
    }

    /// Step the walk: find the first linked record after `after`, claim it if
    /// it is a once-record, and hand back its callback with the lock released.
    fn advance(&self, after: Option<ListenerId>) -> Option<(ListenerId, Arc<ListenerFn<T>>)> {
        let mut chain = self.chain.lock();
        let (id, callback, once) = {
            let (id, listener) = match after {
                None => chain.first_key_value(),
                Some(after) => chain
                    .range((Bound::Excluded(after), Bound::Unbounded))
                    .next(),
            }?;
            (*id, Arc::clone(&listener.callback), listener.once)
        };
        // Claimed before the call so a re-entrant notify cannot fire it twice.
        if once {
            chain.remove(&id);
        }
        Some((id, callback))
    }
}

impl<T: 'static> Default for ListenerCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Free-function constructor, for call sites that prefer it over `new()`.
pub fn create_listener_collection<T: 'static>() -> ListenerCollection<T> {
    ListenerCollection::new()
}

// ============================================================================
// Helpers
// ============================================================================

/// Identity comparison on the callback allocation, ignoring vtable metadata.
fn same_callback<T>(a: &Arc<ListenerFn<T>>, b: &Arc<ListenerFn<T>>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
