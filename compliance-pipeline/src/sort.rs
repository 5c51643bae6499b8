// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordering test case records by outcome.

use crate::outcome::classify;
use compliance_junit::TestCaseRecord;

/// Sorts records by the rank of their outcome: failed first, then passed, skipped and unknown.
///
/// The sort is stable, so records with the same outcome keep their relative order.
pub fn sort_by_outcome(mut records: Vec<TestCaseRecord>) -> Vec<TestCaseRecord> {
    records.sort_by(|a, b| classify(a).rank().cmp(&classify(b).rank()));
    records
}
