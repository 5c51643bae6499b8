// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Summarize the test results in a conformance run archive.
//!
//! `compliance-results` reads an outer tar archive (from a file or standard input), streams the
//! first member ending with `.tar.gz` out of it, and prints one row per test case: failures
//! first, then passes, then everything else.
//!
//! For machine-readable output, see the `compliance-metadata` crate.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::{OutputContext, OutputWriter, StderrStyles};
