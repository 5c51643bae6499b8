// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};
use std::{fmt, io};

/// Root element of the JSON report printed by `compliance-results --message-format json`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct ReportSummary {
    /// The archive member the results were read from.
    pub member: MemberSummary,

    /// Number of rows per status.
    pub counts: StatusCounts,

    /// The report rows, in report order: failed first, then passed, skipped and unknown.
    pub rows: Vec<ReportRowSummary>,
}

impl ReportSummary {
    /// Creates a new, empty summary for the given member.
    pub fn new(member: MemberSummary) -> Self {
        Self {
            member,
            counts: StatusCounts::default(),
            rows: Vec::new(),
        }
    }

    /// Adds a row, updating the counts.
    pub fn add_row(&mut self, row: ReportRowSummary) -> &mut Self {
        self.counts.record(row.status);
        self.rows.push(row);
        self
    }

    /// Parses a summary from JSON.
    pub fn parse_json(json: impl AsRef<str>) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json.as_ref())
    }

    /// Serializes this summary as JSON to the given writer.
    pub fn write_json(&self, writer: impl io::Write) -> Result<(), serde_json::Error> {
        serde_json::to_writer(writer, self)
    }
}

/// The archive member a report was read from.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MemberSummary {
    /// The path of the member within the outer archive.
    pub name: String,

    /// The size of the member as declared by the archive, in bytes.
    pub size: u64,
}

/// A single row of the report.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReportRowSummary {
    /// The outcome of the test case.
    pub status: StatusSummary,

    /// The name of the test case.
    pub name: String,
}

/// The outcome of a test case, as shown in the `STATUS` column.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusSummary {
    /// The test case failed or errored.
    Failed,

    /// The test case passed.
    Passed,

    /// The test case was skipped.
    Skipped,

    /// The outcome could not be determined.
    Unknown,
}

impl StatusSummary {
    /// Returns the label for this status, as shown in reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Failed => "FAILED",
            Self::Passed => "PASSED",
            Self::Skipped => "SKIPPED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for StatusSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of report rows per status.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StatusCounts {
    /// Rows with status `FAILED`.
    pub failed: usize,

    /// Rows with status `PASSED`.
    pub passed: usize,

    /// Rows with status `SKIPPED`.
    pub skipped: usize,

    /// Rows with status `UNKNOWN`.
    pub unknown: usize,
}

impl StatusCounts {
    /// Records one row with the given status.
    pub fn record(&mut self, status: StatusSummary) {
        match status {
            StatusSummary::Failed => self.failed += 1,
            StatusSummary::Passed => self.passed += 1,
            StatusSummary::Skipped => self.skipped += 1,
            StatusSummary::Unknown => self.unknown += 1,
        }
    }

    /// Returns the total number of rows.
    pub fn total(&self) -> usize {
        self.failed + self.passed + self.skipped + self.unknown
    }
}
