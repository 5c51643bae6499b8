// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{any::Any, error::Error, io};

/// Finds the first error of type `T` in the chain rooted at `error`.
///
/// `io::Error::source` skips over the custom error an `io::Error` wraps, and several layers of
/// the stack (tar, flate2, the member stream) nest `io::Error`s inside each other, so each layer
/// is checked through `get_ref` before following `source`.
pub(crate) fn find_cause<T: Error + 'static>(error: &io::Error) -> Option<&T> {
    let mut current: &(dyn Error + 'static) = match error.get_ref() {
        Some(inner) => inner,
        None => return None,
    };
    loop {
        if let Some(found) = current.downcast_ref::<T>() {
            return Some(found);
        }
        let next = match current.downcast_ref::<io::Error>() {
            Some(io_error) => io_error
                .get_ref()
                .map(|inner| inner as &(dyn Error + 'static)),
            None => current.source(),
        };
        current = next?;
    }
}

/// Extracts a human-readable message from a thread's panic payload.
pub(crate) fn panic_payload_to_string(payload: Box<dyn Any + Send + 'static>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "(unknown panic payload)".to_owned()
    }
}
