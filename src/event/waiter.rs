// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! One-shot waiter bookkeeping and the future returned by
//! [`Event::next`](crate::Event::next).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use parking_lot::Mutex;

use super::Shared;

/// Delivery state of a single waiter.
///
/// A waiter starts out `Pending` and moves to exactly one of `Resumed` or
/// `Cancelled`; both are terminal. The slot mutex is the atomicity point
/// between a firing and a concurrent cancellation: whichever transition
/// takes the lock first wins, never both.
enum SlotState<T> {
    /// Registered; `waker` holds the task to wake once a value arrives.
    /// `None` until the future has been polled for the first time.
    Pending { waker: Option<Waker> },
    /// A firing delivered a value that the future has not consumed yet.
    Resumed { value: Option<T> },
    /// The future was dropped before any firing reached this waiter.
    Cancelled,
}

/// The slot shared between one pending [`NextValue`] future and the event.
pub(crate) struct WaiterSlot<T> {
    state: Mutex<SlotState<T>>,
}

impl<T> WaiterSlot<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::Pending { waker: None }),
        }
    }

    /// Attempts to deliver `value`, moving `Pending` to `Resumed`.
    ///
    /// On success returns the waker to invoke, if the future has been
    /// polled already. Returns `Err(value)` if the waiter was cancelled
    /// first, handing the undelivered value back to the caller.
    pub(crate) fn resume(&self, value: T) -> Result<Option<Waker>, T> {
        let mut state = self.state.lock();
        match &mut *state {
            SlotState::Pending { waker } => {
                let woken = waker.take();
                *state = SlotState::Resumed { value: Some(value) };
                Ok(woken)
            }
            _ => Err(value),
        }
    }

    /// Marks the waiter cancelled if it is still pending.
    ///
    /// Returns `true` if this call performed the transition; `false` means
    /// a firing already resumed the waiter.
    pub(crate) fn cancel(&self) -> bool {
        let mut state = self.state.lock();
        if matches!(*state, SlotState::Pending { .. }) {
            *state = SlotState::Cancelled;
            true
        } else {
            false
        }
    }

    /// Polls for the delivered value, registering `cx`'s waker while the
    /// slot is still pending.
    pub(crate) fn poll_value(&self, cx: &mut Context<'_>) -> Poll<T> {
        let mut state = self.state.lock();
        match &mut *state {
            SlotState::Pending { waker } => {
                // Keep the most recent waker; the task may have migrated
                // between polls.
                match waker {
                    Some(current) if current.will_wake(cx.waker()) => {}
                    _ => *waker = Some(cx.waker().clone()),
                }
                Poll::Pending
            }
            // `value` is `None` only if a resolved future is polled again;
            // stay pending rather than fabricate a second delivery.
            SlotState::Resumed { value } => value.take().map_or(Poll::Pending, Poll::Ready),
            SlotState::Cancelled => Poll::Pending,
        }
    }
}

/// A pending waiter as stored in the event's waiter list.
pub(crate) struct WaiterEntry<T> {
    pub(crate) id: u64,
    pub(crate) slot: Arc<WaiterSlot<T>>,
}

/// Future returned by [`Event::next`], resolving to the value of the next
/// firing.
///
/// The waiter is registered when this future is *created*, not when it is
/// first polled, so a firing between creation and the first poll is still
/// delivered:
///
/// ```
/// use event_lib::Event;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let event = Event::<u32>::new();
///
/// let fired = event.next();
/// event.fire(42);
/// assert_eq!(fired.await, 42);
/// # }
/// ```
///
/// Dropping the future before it resolves cancels the waiter: it is
/// deregistered from the event and can never be resumed afterwards, even by
/// a firing racing the drop.
///
/// [`Event::next`]: crate::Event::next
#[must_use = "futures do nothing unless awaited; dropping this future cancels the waiter"]
pub struct NextValue<T> {
    shared: Arc<Shared<T>>,
    id: u64,
    slot: Arc<WaiterSlot<T>>,
}

impl<T> NextValue<T> {
    pub(super) fn new(shared: Arc<Shared<T>>, id: u64, slot: Arc<WaiterSlot<T>>) -> Self {
        Self { shared, id, slot }
    }
}

impl<T> Future for NextValue<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        self.slot.poll_value(cx)
    }
}

impl<T> Drop for NextValue<T> {
    fn drop(&mut self) {
        // Pending -> Cancelled first, then detach from the waiter list. A
        // fire that already captured this waiter observes the cancelled
        // slot and keeps the value instead of delivering it.
        if self.slot.cancel() {
            self.shared.remove_waiter(self.id);
        }
    }
}

impl<T> std::fmt::Debug for NextValue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NextValue").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resume_pending_slot_delivers_the_value() {
        let slot = WaiterSlot::new();
        assert!(slot.resume(7).is_ok());

        let mut cx = Context::from_waker(Waker::noop());
        assert_eq!(slot.poll_value(&mut cx), Poll::Ready(7));
    }

    #[test]
    fn cancel_then_resume_hands_the_value_back() {
        let slot = WaiterSlot::new();
        assert!(slot.cancel());
        assert!(matches!(slot.resume(7), Err(7)));
    }

    #[test]
    fn resume_then_cancel_reports_the_lost_race() {
        let slot = WaiterSlot::new();
        assert!(slot.resume(7).is_ok());
        assert!(!slot.cancel());
    }

    #[test]
    fn cancel_is_idempotent_on_terminal_states() {
        let slot: WaiterSlot<i32> = WaiterSlot::new();
        assert!(slot.cancel());
        assert!(!slot.cancel());
    }

    #[test]
    fn pending_poll_stays_pending() {
        let slot: WaiterSlot<i32> = WaiterSlot::new();
        let mut cx = Context::from_waker(Waker::noop());
        assert!(slot.poll_value(&mut cx).is_pending());
    }

    #[test]
    fn resume_returns_the_registered_waker() {
        let slot: WaiterSlot<i32> = WaiterSlot::new();
        let mut cx = Context::from_waker(Waker::noop());
        assert!(slot.poll_value(&mut cx).is_pending());

        // A waker was registered by the poll above, so resume must hand
        // it out for waking.
        assert!(matches!(slot.resume(3), Ok(Some(_))));
    }
}
