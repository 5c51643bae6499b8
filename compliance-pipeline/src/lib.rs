// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for `compliance-results`.
//!
//! The basic flow of operations is:
//!
//! 1. [`extract::ArchiveExtractor`] scans an outer tar stream for the first member whose name
//!    ends with a suffix, and exposes that member as a live byte stream. The bytes are copied on
//!    a worker thread through a bounded [`pipe`].
//! 2. [`decompress::GzipStage`] decompresses the member.
//! 3. A [`parse::ResultParser`] turns the decompressed bytes into test case records.
//! 4. [`filter`] drops records that shouldn't be reported, [`sort`] orders the rest by
//!    [`outcome`], and [`report`] projects them into rows.
//!
//! [`pipeline::ResultsPipeline`] ties these together, and [`render`] prints the result.

pub mod config;
pub mod decompress;
pub mod errors;
pub mod extract;
pub mod filter;
mod helpers;
pub mod outcome;
pub mod parse;
pub mod pipe;
pub mod pipeline;
pub mod render;
pub mod report;
pub mod sort;

pub use compliance_junit::TestCaseRecord;
