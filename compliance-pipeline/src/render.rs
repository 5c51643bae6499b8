// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rendering compliance reports for display.

use crate::{outcome::OutcomeCategory, report::ComplianceReport};
use owo_colors::{OwoColorize, Style};
use std::io::{self, Write};

/// The output format for a report.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum MessageFormat {
    /// A two-column `STATUS`/`TEST` table.
    #[default]
    Human,

    /// A single JSON object, as described by
    /// [`ReportSummary`](compliance_metadata::ReportSummary).
    Json,
}

/// Writes a [`ComplianceReport`] in a [`MessageFormat`].
#[derive(Debug)]
pub struct ReportRenderer {
    format: MessageFormat,
    styles: Styles,
}

impl ReportRenderer {
    /// Creates a new renderer for the given format.
    pub fn new(format: MessageFormat) -> Self {
        Self {
            format,
            styles: Styles::default(),
        }
    }

    /// Colorizes human-readable output.
    pub fn colorize(&mut self) {
        self.styles.colorize();
    }

    /// Writes the report.
    pub fn render(&self, report: &ComplianceReport, mut writer: impl Write) -> io::Result<()> {
        match self.format {
            MessageFormat::Human => self.render_table(report, &mut writer),
            MessageFormat::Json => {
                report
                    .to_summary()
                    .write_json(&mut writer)
                    .map_err(io::Error::from)?;
                writeln!(writer)
            }
        }
    }

    /// Writes a one-line summary of the number of rows per outcome.
    pub fn write_summary(
        &self,
        report: &ComplianceReport,
        mut writer: impl Write,
    ) -> io::Result<()> {
        let counts = report.counts();
        let total = counts.total();
        writeln!(
            writer,
            "{} {}: {} failed, {} passed, {} skipped, {} unknown",
            total.style(self.styles.bold),
            if total == 1 { "test" } else { "tests" },
            counts.failed.style(self.styles.failed),
            counts.passed.style(self.styles.passed),
            counts.skipped.style(self.styles.skipped),
            counts.unknown.style(self.styles.unknown),
        )
    }

    fn render_table(&self, report: &ComplianceReport, writer: &mut dyn Write) -> io::Result<()> {
        const STATUS_HEADER: &str = "STATUS";

        let width = report
            .rows
            .iter()
            .map(|row| row.category.as_str().len())
            .chain(std::iter::once(STATUS_HEADER.len()))
            .max()
            .unwrap_or(STATUS_HEADER.len());

        // Labels are padded before styling so escape codes don't count toward the width.
        writeln!(
            writer,
            "{}  {}",
            format!("{STATUS_HEADER:width$}").style(self.styles.bold),
            "TEST".style(self.styles.bold),
        )?;
        for row in &report.rows {
            let label = format!("{:width$}", row.category.as_str());
            writeln!(
                writer,
                "{}  {}",
                label.style(self.styles.category(row.category)),
                row.name,
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Styles {
    bold: Style,
    failed: Style,
    passed: Style,
    skipped: Style,
    unknown: Style,
}

impl Styles {
    fn colorize(&mut self) {
        self.bold = Style::new().bold();
        self.failed = Style::new().red().bold();
        self.passed = Style::new().green().bold();
        self.skipped = Style::new().yellow().bold();
        self.unknown = Style::new().dimmed();
    }

    fn category(&self, category: OutcomeCategory) -> Style {
        match category {
            OutcomeCategory::Failed => self.failed,
            OutcomeCategory::Passed => self.passed,
            OutcomeCategory::Skipped => self.skipped,
            OutcomeCategory::Unknown => self.unknown,
        }
    }
}
