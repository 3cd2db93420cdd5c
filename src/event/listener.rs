// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Listener handles and storage.

use std::sync::Arc;

/// Unique identifier for a registered listener.
///
/// This ID is returned by [`Event::add_listener`] and can be passed to
/// [`Event::remove_listener`] later. Removal is by identity, never by
/// comparing callbacks: two registrations that are behaviorally identical
/// still get distinct ids. IDs are unique within an event's lifetime.
///
/// # Examples
///
/// ```
/// use event_lib::Event;
///
/// let event = Event::<i32>::new();
/// let id = event.add_listener(|value| println!("got {value}"));
///
/// // Later, remove exactly this registration
/// event.remove_listener(id);
/// ```
///
/// [`Event::add_listener`]: crate::Event::add_listener
/// [`Event::remove_listener`]: crate::Event::remove_listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Creates a new listener ID with the given value.
    #[must_use]
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

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

/// Type alias for stored listener callbacks.
pub(crate) type ListenerFn<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// A single listener registration.
///
/// Entries are kept in registration order. Duplicates are allowed; each
/// registration is an independent entry with its own id.
pub(crate) struct ListenerEntry<T> {
    pub(crate) id: ListenerId,
    pub(crate) callback: ListenerFn<T>,
}

impl<T> Clone for ListenerEntry<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: Arc::clone(&self.callback),
        }
    }
}
