// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Structured access to the machine-readable output of `compliance-results`.
//!
//! With `--message-format json`, `compliance-results` prints a single [`ReportSummary`] to
//! standard output. Failures are reported through the exit codes documented in
//! [`ComplianceExitCode`].

mod exit_codes;
mod report;

pub use exit_codes::*;
pub use report::*;
