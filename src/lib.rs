// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `event_lib` - A typed publish/notify event primitive.
//!
//! This library provides a single building block, [`Event<T>`], meant to be
//! embedded in larger systems: any number of listeners register to be
//! called synchronously when the event fires, and any number of concurrent
//! tasks suspend until the next firing and resume with the fired value.
//!
//! # Supported Features
//!
//! - **Persistent listeners**: callbacks invoked on every firing, in
//!   registration order, until removed by their [`ListenerId`]
//! - **One-shot waiters**: awaitable futures resolved with the value of
//!   the next firing, cancelled simply by dropping them
//! - **Shared handles**: an [`Event`] clones into cheap handles backed by
//!   the same state, safe to use from many tasks and threads at once
//! - **Panic containment**: a listener that panics never stops delivery to
//!   the remaining listeners
//!
//! # Quick Start
//!
//! ## Listening with a callback
//!
//! ```
//! use event_lib::Event;
//!
//! let event = Event::<i32>::new();
//!
//! let id = event.add_listener(|value| println!("received {value}"));
//!
//! event.fire(1);
//! event.fire(2);
//!
//! event.remove_listener(id);
//! event.fire(3); // no longer observed
//! ```
//!
//! ## Awaiting the next firing
//!
//! ```
//! use event_lib::Event;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let event = Event::<u32>::new();
//!
//! // The waiter is registered as soon as `next` is called, so the firing
//! // below cannot be missed.
//! let fired = event.next();
//!
//! event.fire(42);
//! assert_eq!(fired.await, 42);
//! # }
//! ```
//!
//! ## Bounded waiting
//!
//! ```
//! use std::time::Duration;
//! use event_lib::{Error, Event};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let event = Event::<u32>::new();
//!
//! // Nothing fires, so the wait expires and the waiter is deregistered.
//! let outcome = event.next_timeout(Duration::from_millis(10)).await;
//! assert!(matches!(outcome, Err(Error::Timeout(10))));
//! # }
//! ```

pub mod error;
pub mod event;

pub use error::{Error, Result};
pub use event::{Event, ListenerId, NextValue};
