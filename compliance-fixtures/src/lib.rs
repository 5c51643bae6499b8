// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory archives and readers for `compliance-results` tests.

mod archives;
mod readers;

pub use archives::*;
pub use readers::*;
