// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The event primitive: persistent listeners plus one-shot waiters.
//!
//! An [`Event<T>`] owns two independent delivery lists. *Listeners* are
//! callbacks invoked on every firing until explicitly removed; *waiters*
//! are suspended tasks, each resumed with the value of the next firing and
//! then discarded. [`Event::fire`] delivers to both.
//!
//! # Examples
//!
//! ```
//! use event_lib::Event;
//!
//! let event = Event::<i32>::new();
//!
//! // Persistent listener, called on every firing
//! let id = event.add_listener(|value| println!("received {value}"));
//!
//! event.fire(1);
//! event.fire(2);
//!
//! event.remove_listener(id);
//! event.fire(3); // no longer observed
//! ```

mod listener;
mod waiter;

use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use listener::ListenerEntry;
use waiter::{WaiterEntry, WaiterSlot};

pub use listener::ListenerId;
pub use waiter::NextValue;

/// State shared by every handle of one event and by its pending waiter
/// futures.
pub(crate) struct Shared<T> {
    /// Counter for generating unique listener IDs.
    next_listener_id: AtomicU64,
    /// Counter for generating unique waiter IDs.
    next_waiter_id: AtomicU64,
    /// Both delivery lists live behind one mutex: every mutating operation
    /// on either list is mutually exclusive with all the others. The lock
    /// is never held while external code runs.
    lists: Mutex<Lists<T>>,
}

struct Lists<T> {
    listeners: Vec<ListenerEntry<T>>,
    waiters: Vec<WaiterEntry<T>>,
}

impl<T> Shared<T> {
    /// Detaches a waiter from the live list, if it is still there.
    pub(crate) fn remove_waiter(&self, id: u64) {
        self.lists.lock().waiters.retain(|entry| entry.id != id);
    }
}

/// A typed publish/notify event.
///
/// `Event<T>` lets any number of listeners register to be called
/// synchronously whenever the event fires, and separately lets any number
/// of concurrent tasks suspend until the next firing via [`Event::next`].
///
/// Cloning an `Event` is cheap and produces another handle to the *same*
/// event: listeners and waiters registered through one clone are fired
/// through any other. `Event<T>` is `Send + Sync` whenever `T: Send`, so
/// handles can be shared freely across tasks and threads.
///
/// # Delivery contract
///
/// - A listener receives every firing that happens after its registration
///   and before its removal, in firing order.
/// - A waiter receives exactly the first firing after its registration, or
///   none at all if its future is dropped first.
/// - Within one [`fire`](Event::fire), pending waiters are resumed first,
///   then listeners are invoked in registration order.
///
/// # Examples
///
/// ```
/// use event_lib::Event;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let event = Event::<u32>::new();
///
/// // A waiter suspends until the next firing...
/// let fired = event.next();
///
/// // ...and a firing resumes it with the value.
/// event.fire(42);
/// assert_eq!(fired.await, 42);
/// # }
/// ```
pub struct Event<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Event<T> {
    /// Creates a new event with no listeners and no waiters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                next_listener_id: AtomicU64::new(1),
                next_waiter_id: AtomicU64::new(1),
                lists: Mutex::new(Lists {
                    listeners: Vec::new(),
                    waiters: Vec::new(),
                }),
            }),
        }
    }

    /// Registers a listener to be notified on every subsequent firing.
    ///
    /// Listeners are invoked in registration order. Registering the same
    /// callback twice yields two independent registrations with distinct
    /// ids; there is no deduplication.
    ///
    /// Returns the id to pass to [`Event::remove_listener`] later.
    pub fn add_listener<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = ListenerId::new(self.shared.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.shared.lists.lock().listeners.push(ListenerEntry {
            id,
            callback: Arc::new(callback),
        });
        id
    }

    /// Removes the listener registered under `id`.
    ///
    /// Returns `true` if a listener was found and removed. Removing an
    /// unknown or already-removed id is a no-op, not an error.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut lists = self.shared.lists.lock();
        let before = lists.listeners.len();
        lists.listeners.retain(|entry| entry.id != id);
        lists.listeners.len() != before
    }

    /// Waits for the next firing, resolving to its value.
    ///
    /// The waiter is registered when this method is *called*, so a firing
    /// between the call and the first poll of the returned future is still
    /// delivered. Each waiter is one-shot: it observes exactly one firing
    /// and is then gone.
    ///
    /// Dropping the returned [`NextValue`] before it resolves cancels the
    /// waiter. Cancellation and a concurrent [`fire`](Event::fire) resolve
    /// their race atomically: the waiter is either resumed or cancelled,
    /// never both.
    ///
    /// # Examples
    ///
    /// ```
    /// use event_lib::Event;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let event = Event::<i32>::new();
    ///
    /// let fired = event.next();
    /// event.fire(7);
    /// assert_eq!(fired.await, 7);
    /// # }
    /// ```
    pub fn next(&self) -> NextValue<T> {
        let id = self.shared.next_waiter_id.fetch_add(1, Ordering::Relaxed);
        let slot = Arc::new(WaiterSlot::new());
        self.shared.lists.lock().waiters.push(WaiterEntry {
            id,
            slot: Arc::clone(&slot),
        });
        NextValue::new(Arc::clone(&self.shared), id, slot)
    }

    /// Waits for the next firing, giving up after `timeout`.
    ///
    /// This is [`Event::next`] raced against a timer: on expiry the waiter
    /// is deregistered and can no longer be resumed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if no firing happens within `timeout`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use event_lib::{Error, Event};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let event = Event::<i32>::new();
    ///
    /// let outcome = event.next_timeout(Duration::from_millis(10)).await;
    /// assert!(matches!(outcome, Err(Error::Timeout(10))));
    /// assert_eq!(event.waiter_count(), 0);
    /// # }
    /// ```
    pub async fn next_timeout(&self, timeout: Duration) -> Result<T> {
        tokio::time::timeout(timeout, self.next())
            .await
            .map_err(|_| Error::Timeout(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)))
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.shared.lists.lock().listeners.len()
    }

    /// Returns the number of waiters pending on the next firing.
    #[must_use]
    pub fn waiter_count(&self) -> usize {
        self.shared.lists.lock().waiters.len()
    }

    /// Returns `true` if the event has no listeners and no waiters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let lists = self.shared.lists.lock();
        lists.listeners.is_empty() && lists.waiters.is_empty()
    }

    /// Removes every registered listener.
    ///
    /// Pending waiters are unaffected.
    pub fn clear_listeners(&self) {
        self.shared.lists.lock().listeners.clear();
    }
}

impl<T: Clone> Event<T> {
    /// Fires the event, delivering `value` to every pending waiter and
    /// every registered listener.
    ///
    /// Delivery order is a committed contract: the current waiter list is
    /// atomically swapped out and each captured waiter resumed with its own
    /// clone of `value`, then listeners are invoked with `&value` in
    /// registration order. Listeners and waiters registered *during* this
    /// firing (for instance from inside a listener) observe only subsequent
    /// firings.
    ///
    /// No lock is held while waiters are woken or listeners run, so
    /// callbacks may freely re-enter the event, including firing it again.
    /// A listener that panics is contained: the panic is logged and the
    /// remaining listeners still run. Firing with zero listeners and zero
    /// waiters is a no-op.
    pub fn fire(&self, value: T) {
        let (waiters, listeners) = {
            let mut lists = self.shared.lists.lock();
            (mem::take(&mut lists.waiters), lists.listeners.clone())
        };

        tracing::trace!(
            waiters = waiters.len(),
            listeners = listeners.len(),
            "firing event"
        );

        // Waiters first. A waiter that was cancelled between the swap above
        // and this delivery refuses the value; it is dropped here instead
        // of being handed to a dead waiter.
        for entry in waiters {
            match entry.slot.resume(value.clone()) {
                Ok(Some(waker)) => waker.wake(),
                Ok(None) => {}
                Err(_) => {
                    tracing::trace!(waiter = entry.id, "waiter cancelled before delivery");
                }
            }
        }

        for entry in listeners {
            let invocation = panic::catch_unwind(AssertUnwindSafe(|| (entry.callback)(&value)));
            if invocation.is_err() {
                tracing::warn!(listener = %entry.id, "listener panicked during dispatch");
            }
        }
    }
}

impl Event<()> {
    /// Fires the event with the unit value.
    ///
    /// Shorthand for signal-only events that carry no payload.
    ///
    /// # Examples
    ///
    /// ```
    /// use event_lib::Event;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let event = Event::<()>::new();
    ///
    /// let fired = event.next();
    /// event.signal();
    /// fired.await;
    /// # }
    /// ```
    pub fn signal(&self) {
        self.fire(());
    }
}

impl<T> Default for Event<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Event<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> std::fmt::Debug for Event<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lists = self.shared.lists.lock();
        f.debug_struct("Event")
            .field("listeners", &lists.listeners.len())
            .field("waiters", &lists.waiters.len())
            .finish()
    }
}
