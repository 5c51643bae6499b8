// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The end-to-end results pipeline.

use crate::{
    config::ComplianceConfig,
    decompress::GzipStage,
    errors::{FilterBuildError, PipelineError},
    extract::ArchiveExtractor,
    filter::RecordFilter,
    parse::{ResultParser, ResultsTarballParser},
    report::ComplianceReport,
    sort::sort_by_outcome,
};
use std::io::{self, Read};
use tracing::{debug, info};

/// Extracts, decompresses, parses, filters and orders compliance results.
#[derive(Debug)]
pub struct ResultsPipeline {
    extractor: ArchiveExtractor,
    parser: Box<dyn ResultParser>,
    filter: RecordFilter,
}

impl ResultsPipeline {
    /// Creates a new pipeline out of its stages.
    pub fn new(
        extractor: ArchiveExtractor,
        parser: Box<dyn ResultParser>,
        filter: RecordFilter,
    ) -> Self {
        Self {
            extractor,
            parser,
            filter,
        }
    }

    /// Creates a pipeline from configuration.
    pub fn from_config(config: &ComplianceConfig) -> Result<Self, FilterBuildError> {
        Ok(Self::new(
            config.extractor(),
            config.build_parser(),
            config.record_filter()?,
        ))
    }

    /// Runs the pipeline over an outer archive.
    ///
    /// Either every stage succeeds and a report is returned, or the first failure is returned
    /// and nothing is reported. The member is always read to the end, even if the parser doesn't
    /// need all of it, so that truncation and corruption anywhere in it are reported.
    pub fn run<R>(&self, outer: R) -> Result<ComplianceReport, PipelineError>
    where
        R: Read + Send + 'static,
    {
        let stream = self
            .extractor
            .extract(outer)
            .map_err(PipelineError::Extract)?;
        let member = stream.member().clone();

        let mut stage = GzipStage::new(stream).map_err(PipelineError::from_decompress)?;
        let records = self
            .parser
            .parse(&mut stage)
            .map_err(PipelineError::from_parse)?;
        debug!(member = %member.name, records = records.len(), "parsed compliance results");

        // Parsers may stop early: read the rest so copy errors and the gzip trailer are checked.
        let trailing =
            io::copy(&mut stage, &mut io::sink()).map_err(PipelineError::from_read_error)?;
        debug!(member = %member.name, trailing, "read remainder of member");

        let records = sort_by_outcome(self.filter.apply(records));
        info!(member = %member.name, rows = records.len(), "built compliance report");
        Ok(ComplianceReport::new(member, &records))
    }
}

impl Default for ResultsPipeline {
    fn default() -> Self {
        Self::new(
            ArchiveExtractor::default(),
            Box::new(ResultsTarballParser::default()),
            RecordFilter::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        errors::{CorruptStreamError, ExtractError, ParseError},
        helpers::find_cause,
        outcome::OutcomeCategory,
        parse::JunitXmlParser,
    };
    use compliance_fixtures::{build_tar, gzip, results_tarball};
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use std::{fmt::Write as _, io::Cursor};

    static JUNIT: &str = indoc! {r#"
        <testsuites>
          <testsuite name="e2e">
            <testcase name="B"/>
            <testcase name="S"><skipped/></testcase>
            <testcase name="A"><failure message="boom"/></testcase>
          </testsuite>
        </testsuites>
    "#};

    fn junit_pipeline() -> ResultsPipeline {
        ResultsPipeline::new(
            ArchiveExtractor::default(),
            Box::new(JunitXmlParser),
            RecordFilter::default(),
        )
    }

    #[test]
    fn default_pipeline() {
        let outer = build_tar(&[
            ("meta/run.log", b"log"),
            ("202406011200_sonobuoy_0c1f.tar.gz", &results_tarball(JUNIT, &[])),
        ]);
        let report = ResultsPipeline::default().run(Cursor::new(outer)).unwrap();
        assert_eq!(report.member.name, "202406011200_sonobuoy_0c1f.tar.gz");
        let rows: Vec<_> = report
            .rows
            .iter()
            .map(|row| (row.category, row.name.as_str()))
            .collect();
        assert_eq!(
            rows,
            [(OutcomeCategory::Failed, "A"), (OutcomeCategory::Passed, "B")]
        );
    }

    #[test]
    fn missing_member() {
        let outer = build_tar(&[("meta/run.log", b"log")]);
        let error = junit_pipeline().run(Cursor::new(outer)).unwrap_err();
        assert!(
            matches!(
                error,
                PipelineError::Extract(ExtractError::NoMatchingMember { .. })
            ),
            "unexpected error: {error:?}"
        );
        assert_eq!(
            error.to_string(),
            "could not extract the compliance results from archive"
        );
    }

    #[test]
    fn member_is_not_gzip() {
        let outer = build_tar(&[("results.tar.gz", JUNIT.as_bytes())]);
        let error = junit_pipeline().run(Cursor::new(outer)).unwrap_err();
        match error {
            PipelineError::CorruptStream(error) => {
                let corrupt = find_cause::<CorruptStreamError>(&error).expect("corrupt stream");
                assert!(
                    matches!(corrupt, CorruptStreamError::InvalidHeader { .. }),
                    "unexpected error: {corrupt:?}"
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_member() {
        let outer = build_tar(&[("results.tar.gz", b"")]);
        let error = junit_pipeline().run(Cursor::new(outer)).unwrap_err();
        assert!(
            matches!(error, PipelineError::CorruptStream(_)),
            "unexpected error: {error:?}"
        );
    }

    #[test]
    fn corrupt_body() {
        let mut member = gzip(JUNIT.as_bytes());
        let len = member.len();
        // Clobber the deflate data, leaving the header intact.
        for byte in &mut member[10..len - 8] {
            *byte = 0xff;
        }
        let outer = build_tar(&[("results.tar.gz", &member)]);
        let error = junit_pipeline().run(Cursor::new(outer)).unwrap_err();
        assert!(
            matches!(error, PipelineError::CorruptStream(_)),
            "unexpected error: {error:?}"
        );
    }

    #[test]
    fn truncated_member_reports_copy_error() {
        // The root element only closes at the very end, so the parser must read every byte.
        let mut junit = "<testsuite name=\"e2e\">".to_owned();
        for i in 0..2000 {
            write!(junit, "<testcase name=\"case-{i}\" time=\"{i}.5\"/>").unwrap();
        }
        junit.push_str("</testsuite>");
        let member = gzip(junit.as_bytes());
        let outer = build_tar(&[("results.tar.gz", &member)]);
        let truncated = outer[..512 + member.len() / 2].to_vec();

        let error = junit_pipeline().run(Cursor::new(truncated)).unwrap_err();
        let copy_error = error.member_copy_error().unwrap_or_else(|| {
            panic!("expected a member copy error, found {error:?}");
        });
        assert_eq!(copy_error.member(), "results.tar.gz");
        assert_eq!(
            error.to_string(),
            "compliance results archive was truncated while copying"
        );
    }

    #[test]
    fn default_parser_checks_gzip_trailer() {
        let mut member = results_tarball(JUNIT, &[]);
        let len = member.len();
        // CRC32 of the uncompressed tarball.
        member[len - 8] ^= 0xff;
        let outer = build_tar(&[("results.tar.gz", &member)]);
        let error = ResultsPipeline::default()
            .run(Cursor::new(outer))
            .unwrap_err();
        assert!(
            matches!(error, PipelineError::CorruptStream(_)),
            "unexpected error: {error:?}"
        );
    }

    #[test]
    fn invalid_junit() {
        let outer = build_tar(&[("results.tar.gz", &gzip(b"<testsuite><testcase"))]);
        let error = junit_pipeline().run(Cursor::new(outer)).unwrap_err();
        assert!(
            matches!(error, PipelineError::Parse(ParseError::Junit(_))),
            "unexpected error: {error:?}"
        );
    }

    #[test]
    fn missing_junit_document() {
        let inner = gzip(&build_tar(&[("plugins/e2e/results/other.xml", b"<x/>")]));
        let outer = build_tar(&[("results.tar.gz", &inner)]);
        let error = ResultsPipeline::default()
            .run(Cursor::new(outer))
            .unwrap_err();
        assert!(
            matches!(
                error,
                PipelineError::Parse(ParseError::JunitDocumentNotFound { .. })
            ),
            "unexpected error: {error:?}"
        );
    }

    #[test]
    fn from_config_applies_filter() {
        let mut config = ComplianceConfig::default_config();
        config.parser = crate::config::ParserKind::JunitXml;
        config.filter.exclude_skipped = false;
        let pipeline = ResultsPipeline::from_config(&config).unwrap();

        let outer = build_tar(&[("results.tar.gz", &gzip(JUNIT.as_bytes()))]);
        let report = pipeline.run(Cursor::new(outer)).unwrap();
        let names: Vec<_> = report.rows.iter().map(|row| row.name.as_str()).collect();
        assert_eq!(names, ["A", "B", "S"]);
    }
}
