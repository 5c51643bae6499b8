// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dropping test case records that shouldn't be reported.

use crate::{
    config::FilterConfig,
    errors::FilterBuildError,
    outcome::{OutcomeCategory, classify},
};
use compliance_junit::TestCaseRecord;
use regex::Regex;
use serde::Deserialize;

/// Returns the records for which `exclude` returns false, in their original order.
pub fn filter_records<F>(records: Vec<TestCaseRecord>, mut exclude: F) -> Vec<TestCaseRecord>
where
    F: FnMut(&TestCaseRecord) -> bool,
{
    records.into_iter().filter(|record| !exclude(record)).collect()
}

/// Which outcomes are shown in the report.
#[derive(Copy, Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum ShowFilter {
    /// Show every outcome.
    #[default]
    All,

    /// Only show passed test cases.
    Passed,

    /// Only show failed test cases.
    Failed,

    /// Only show skipped test cases.
    ///
    /// This shows nothing unless skipped test cases are also included.
    Skipped,
}

impl ShowFilter {
    fn shows(self, category: OutcomeCategory) -> bool {
        match self {
            ShowFilter::All => true,
            ShowFilter::Passed => category == OutcomeCategory::Passed,
            ShowFilter::Failed => category == OutcomeCategory::Failed,
            ShowFilter::Skipped => category == OutcomeCategory::Skipped,
        }
    }
}

/// The exclusion predicate built from configuration.
#[derive(Clone, Debug)]
pub struct RecordFilter {
    exclude_skipped: bool,
    show: ShowFilter,
    exclude_names: Vec<Regex>,
}

impl RecordFilter {
    /// Builds a filter from configuration.
    pub fn new(config: &FilterConfig) -> Result<Self, FilterBuildError> {
        let exclude_names = config
            .exclude_names
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|error| FilterBuildError::new(pattern, error))
            })
            .collect::<Result<_, _>>()?;
        Ok(Self {
            exclude_skipped: config.exclude_skipped,
            show: config.show,
            exclude_names,
        })
    }

    /// Returns true if `record` should be left out of the report.
    ///
    /// Skipped records are recognized by their skip marker alone, independently of how they
    /// would be classified.
    pub fn excludes(&self, record: &TestCaseRecord) -> bool {
        if self.exclude_skipped && record.is_skipped() {
            return true;
        }
        if !self.show.shows(classify(record)) {
            return true;
        }
        self.exclude_names
            .iter()
            .any(|regex| regex.is_match(&record.name))
    }

    /// Returns the records this filter keeps, in their original order.
    pub fn apply(&self, records: Vec<TestCaseRecord>) -> Vec<TestCaseRecord> {
        filter_records(records, |record| self.excludes(record))
    }
}

impl Default for RecordFilter {
    fn default() -> Self {
        Self {
            exclude_skipped: true,
            show: ShowFilter::All,
            exclude_names: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compliance_junit::{NonSuccess, Skipped};
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn records() -> Vec<TestCaseRecord> {
        let mut failed = TestCaseRecord::new("[sig-network] fails");
        failed.set_failure(NonSuccess::failure());
        let passed = TestCaseRecord::new("[sig-apps] passes");
        let mut skipped = TestCaseRecord::new("[sig-storage] skipped");
        skipped.set_skipped(Skipped::new());
        let mut both = TestCaseRecord::new("[sig-node] flaked");
        both.set_failure(NonSuccess::failure()).set_skipped(Skipped::new());
        let unnamed = TestCaseRecord::new("");
        vec![failed, passed, skipped, both, unnamed]
    }

    fn names(records: &[TestCaseRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn filter_records_keeps_order() {
        let kept = filter_records(records(), |r| r.name.contains("sig-storage"));
        assert_eq!(
            names(&kept),
            ["[sig-network] fails", "[sig-apps] passes", "[sig-node] flaked", ""]
        );
    }

    #[test]
    fn filter_records_empty() {
        assert!(filter_records(Vec::new(), |_| true).is_empty());
        assert!(filter_records(Vec::new(), |_| false).is_empty());
    }

    #[test]
    fn default_filter_drops_skipped() {
        let kept = RecordFilter::default().apply(records());
        assert_eq!(names(&kept), ["[sig-network] fails", "[sig-apps] passes", ""]);
    }

    #[test_case(true, ShowFilter::All, &["[sig-network] fails", "[sig-apps] passes", ""] ; "all")]
    #[test_case(true, ShowFilter::Failed, &["[sig-network] fails"] ; "failed")]
    #[test_case(true, ShowFilter::Passed, &["[sig-apps] passes"] ; "passed")]
    #[test_case(true, ShowFilter::Skipped, &[] ; "skipped excluded")]
    #[test_case(
        false,
        ShowFilter::Skipped,
        &["[sig-storage] skipped", "[sig-node] flaked"]
        ; "skipped included"
    )]
    #[test_case(
        false,
        ShowFilter::All,
        &[
            "[sig-network] fails",
            "[sig-apps] passes",
            "[sig-storage] skipped",
            "[sig-node] flaked",
            "",
        ]
        ; "everything"
    )]
    fn show(exclude_skipped: bool, show: ShowFilter, expected: &[&str]) {
        let config = FilterConfig {
            exclude_skipped,
            show,
            exclude_names: Vec::new(),
        };
        let kept = RecordFilter::new(&config).unwrap().apply(records());
        assert_eq!(names(&kept), expected);
    }

    #[test]
    fn exclude_names() {
        let config = FilterConfig {
            exclude_skipped: false,
            show: ShowFilter::All,
            exclude_names: vec![r"^\[sig-(network|storage)\]".to_owned(), "^$".to_owned()],
        };
        let kept = RecordFilter::new(&config).unwrap().apply(records());
        assert_eq!(names(&kept), ["[sig-apps] passes", "[sig-node] flaked"]);
    }

    #[test]
    fn invalid_pattern() {
        let config = FilterConfig {
            exclude_skipped: true,
            show: ShowFilter::All,
            exclude_names: vec!["ok".to_owned(), "[unclosed".to_owned()],
        };
        let error = RecordFilter::new(&config).unwrap_err();
        assert_eq!(error.pattern(), "[unclosed");
    }
}
