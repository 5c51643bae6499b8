// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{io, sync::Arc};
use thiserror::Error;

/// An error that occurs while reading a [`JunitDocument`](crate::JunitDocument).
///
/// Returned by [`JunitDocument::deserialize`](crate::JunitDocument::deserialize).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DeserializeError {
    /// The underlying reader returned an error.
    ///
    /// The original `io::Error` is preserved so that callers can inspect its cause chain.
    #[error("I/O error reading JUnit document")]
    Io(#[source] io::Error),

    /// The input is not well-formed XML.
    #[error("invalid XML in JUnit document at byte {position}")]
    Xml {
        /// The byte offset at which the error was detected.
        position: usize,

        /// The underlying error.
        #[source]
        error: quick_xml::Error,
    },

    /// An attribute had a value that could not be interpreted.
    #[error("invalid value `{value}` for attribute `{attribute}` on <{element}> at byte {position}")]
    InvalidAttribute {
        /// The element the attribute was found on.
        element: &'static str,

        /// The attribute name.
        attribute: &'static str,

        /// The raw attribute value.
        value: String,

        /// The byte offset at which the error was detected.
        position: usize,
    },

    /// The document ended before an element was closed.
    #[error("JUnit document ended inside <{element}>")]
    UnexpectedEof {
        /// The innermost element that was still open.
        element: String,
    },

    /// The root element is not `<testsuites>` or `<testsuite>`.
    #[error("unexpected root element <{name}> at byte {position}")]
    UnexpectedRoot {
        /// The name of the root element.
        name: String,

        /// The byte offset of the element.
        position: usize,
    },

    /// The document does not contain any root element.
    #[error("JUnit document has no <testsuites> or <testsuite> element")]
    MissingRoot,
}

impl DeserializeError {
    pub(crate) fn from_xml(error: quick_xml::Error, position: usize) -> Self {
        match error {
            // Unwrap I/O errors so that their cause chain stays reachable.
            quick_xml::Error::Io(error) => {
                let error = Arc::try_unwrap(error)
                    .unwrap_or_else(|shared| io::Error::new(shared.kind(), shared.to_string()));
                DeserializeError::Io(error)
            }
            error => DeserializeError::Xml { position, error },
        }
    }

    /// Returns the underlying I/O error, if this error was caused by the reader.
    pub fn as_io(&self) -> Option<&io::Error> {
        match self {
            DeserializeError::Io(error) => Some(error),
            _ => None,
        }
    }
}
