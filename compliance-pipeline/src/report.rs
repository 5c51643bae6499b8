// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The rows of a compliance report.

use crate::{
    extract::MatchedMember,
    outcome::{OutcomeCategory, classify},
};
use compliance_junit::TestCaseRecord;
use compliance_metadata::{MemberSummary, ReportRowSummary, ReportSummary, StatusCounts};

/// A single line of the report.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReportRow {
    /// The outcome of the test case.
    pub category: OutcomeCategory,

    /// The name of the test case.
    pub name: String,
}

impl ReportRow {
    /// Creates a row for a record.
    pub fn from_record(record: &TestCaseRecord) -> Self {
        Self {
            category: classify(record),
            name: record.name.clone(),
        }
    }
}

/// The result of a successful pipeline run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ComplianceReport {
    /// The member the results were read from.
    pub member: MatchedMember,

    /// The rows, in report order.
    pub rows: Vec<ReportRow>,
}

impl ComplianceReport {
    /// Builds a report out of records that have already been filtered and sorted.
    pub fn new(member: MatchedMember, records: &[TestCaseRecord]) -> Self {
        Self {
            member,
            rows: records.iter().map(ReportRow::from_record).collect(),
        }
    }

    /// Returns the number of rows per outcome.
    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for row in &self.rows {
            counts.record(row.category.to_summary());
        }
        counts
    }

    /// Converts this report to its machine-readable form.
    pub fn to_summary(&self) -> ReportSummary {
        let mut summary = ReportSummary::new(MemberSummary {
            name: self.member.name.clone(),
            size: self.member.size,
        });
        for row in &self.rows {
            summary.add_row(ReportRowSummary {
                status: row.category.to_summary(),
                name: row.name.clone(),
            });
        }
        summary
    }
}
