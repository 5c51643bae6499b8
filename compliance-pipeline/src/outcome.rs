// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classification of test case records into outcome categories.

use compliance_junit::TestCaseRecord;
use compliance_metadata::StatusSummary;
use std::fmt;

/// The reported outcome of a test case.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum OutcomeCategory {
    /// The test case failed or errored.
    Failed,

    /// The test case passed.
    Passed,

    /// The test case was skipped.
    Skipped,

    /// The outcome could not be determined.
    Unknown,
}

impl OutcomeCategory {
    /// All categories, in report order.
    pub const ALL: [Self; 4] = [Self::Failed, Self::Passed, Self::Skipped, Self::Unknown];

    /// Returns the position of this category in the report. Lower ranks come first.
    pub fn rank(self) -> u8 {
        match self {
            Self::Failed => 0,
            Self::Passed => 1,
            Self::Skipped => 2,
            Self::Unknown => 3,
        }
    }

    /// Returns the label shown in the `STATUS` column.
    pub fn as_str(self) -> &'static str {
        self.to_summary().as_str()
    }

    /// Converts this category to its machine-readable form.
    pub fn to_summary(self) -> StatusSummary {
        match self {
            Self::Failed => StatusSummary::Failed,
            Self::Passed => StatusSummary::Passed,
            Self::Skipped => StatusSummary::Skipped,
            Self::Unknown => StatusSummary::Unknown,
        }
    }
}

impl fmt::Display for OutcomeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a record.
///
/// The first matching rule wins:
///
/// 1. a record marked as skipped is [`Skipped`](OutcomeCategory::Skipped), even if it also has
///    a failure;
/// 2. a record with a failure or error is [`Failed`](OutcomeCategory::Failed);
/// 3. a record with a name is [`Passed`](OutcomeCategory::Passed);
/// 4. anything else is [`Unknown`](OutcomeCategory::Unknown).
pub fn classify(record: &TestCaseRecord) -> OutcomeCategory {
    if record.is_skipped() {
        OutcomeCategory::Skipped
    } else if record.is_failed() {
        OutcomeCategory::Failed
    } else if is_structurally_valid(record) {
        OutcomeCategory::Passed
    } else {
        OutcomeCategory::Unknown
    }
}

// A record without a name can't be attributed to a test, so it can't be called a pass.
fn is_structurally_valid(record: &TestCaseRecord) -> bool {
    !record.name.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use compliance_junit::{NonSuccess, Skipped};
    use test_case::test_case;

    fn record(name: &str, failed: bool, skipped: bool) -> TestCaseRecord {
        let mut record = TestCaseRecord::new(name);
        if failed {
            record.set_failure(NonSuccess::failure());
        }
        if skipped {
            record.set_skipped(Skipped::new());
        }
        record
    }

    #[test_case(record("a", false, false), OutcomeCategory::Passed ; "passed")]
    #[test_case(record("a", true, false), OutcomeCategory::Failed ; "failed")]
    #[test_case(record("a", false, true), OutcomeCategory::Skipped ; "skipped")]
    #[test_case(record("a", true, true), OutcomeCategory::Skipped ; "skip takes precedence")]
    #[test_case(record("", false, false), OutcomeCategory::Unknown ; "empty name")]
    #[test_case(record("  \t", false, false), OutcomeCategory::Unknown ; "blank name")]
    #[test_case(record("", true, false), OutcomeCategory::Failed ; "empty name failed")]
    #[test_case(record("", false, true), OutcomeCategory::Skipped ; "empty name skipped")]
    fn classification(record: TestCaseRecord, expected: OutcomeCategory) {
        assert_eq!(classify(&record), expected);
        // Classification is deterministic.
        assert_eq!(classify(&record), classify(&record.clone()));
    }

    #[test]
    fn errors_are_failures() {
        let mut record = TestCaseRecord::new("errored");
        record.set_failure(NonSuccess::error());
        assert_eq!(classify(&record), OutcomeCategory::Failed);
    }

    #[test]
    fn ranks_follow_report_order() {
        let ranks: Vec<_> = OutcomeCategory::ALL.iter().map(|c| c.rank()).collect();
        assert_eq!(ranks, [0, 1, 2, 3]);
    }

    #[test_case(OutcomeCategory::Failed, "FAILED")]
    #[test_case(OutcomeCategory::Passed, "PASSED")]
    #[test_case(OutcomeCategory::Skipped, "SKIPPED")]
    #[test_case(OutcomeCategory::Unknown, "UNKNOWN")]
    fn labels(category: OutcomeCategory, label: &str) {
        assert_eq!(category.to_string(), label);
    }
}
