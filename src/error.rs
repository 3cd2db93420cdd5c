// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `event_lib` library.
//!
//! Every event operation either succeeds or is a no-op; the only failure
//! surfaced to callers is giving up on a pending wait. Plain cancellation is
//! not an error value either: dropping the future returned by
//! [`Event::next`](crate::Event::next) is itself the cancellation signal.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Waiting for the next firing exceeded the caller's deadline.
    ///
    /// Produced by [`Event::next_timeout`](crate::Event::next_timeout).
    /// The expired waiter has already been deregistered when this is
    /// returned.
    #[error("timed out after {0} ms waiting for the next firing")]
    Timeout(u64),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_display() {
        let err = Error::Timeout(250);
        assert_eq!(
            err.to_string(),
            "timed out after 250 ms waiting for the next firing"
        );
    }
}
