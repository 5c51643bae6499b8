// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read JUnit reports produced by conformance test runs.
//!
//! The data model is intentionally permissive: a [`TestCaseRecord`] can carry a failure and a
//! skip marker at the same time, because real-world reports do. Deciding what such a record
//! means is left to consumers.

#![warn(missing_docs)]

mod deserialize;
mod errors;
mod record;

pub use errors::*;
pub use record::*;
