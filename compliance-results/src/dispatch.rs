// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::{ExpectedError, Result},
    output::{OutputContext, OutputOpts, OutputWriter},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, ValueEnum, builder::NonEmptyStringValueParser};
use compliance_metadata::ComplianceExitCode;
use compliance_pipeline::{
    config::{ComplianceConfig, ParserKind},
    filter::ShowFilter,
    pipeline::ResultsPipeline,
    render::{MessageFormat, ReportRenderer},
};
use std::{
    fs::File,
    io::{self, BufReader, Write},
};
use tracing::debug;

/// Summarize the test results in a conformance run archive.
///
/// Reads an outer tar archive, streams the first member ending with the results suffix out of
/// it, and prints one row per test case: failures first, then passes.
#[derive(Debug, Parser)]
#[command(
    version,
    styles = crate::output::clap_styles::style(),
    max_term_width = 100
)]
pub struct ComplianceResultsApp {
    /// Path to the outer archive, or `-` to read it from standard input
    #[arg(value_name = "ARCHIVE")]
    archive: Option<Utf8PathBuf>,

    /// Config file [default: .config/compliance.toml in the current directory]
    #[arg(long, value_name = "PATH", env = "COMPLIANCE_CONFIG")]
    config_file: Option<Utf8PathBuf>,

    #[command(flatten)]
    extract_opts: ExtractOpts,

    #[command(flatten)]
    filter_opts: FilterOpts,

    #[command(flatten)]
    report_opts: ReportOpts,

    #[command(flatten)]
    output: OutputOpts,
}

impl ComplianceResultsApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let config = self.load_config()?;
        debug!(?config, "resolved configuration");
        let pipeline = ResultsPipeline::from_config(&config)?;

        let report = match &self.archive {
            Some(path) if path.as_str() != "-" => {
                let file = File::open(path)
                    .map_err(|err| ExpectedError::archive_open_error(path.clone(), err))?;
                pipeline.run(BufReader::new(file))?
            }
            _ => {
                debug!("reading outer archive from standard input");
                pipeline.run(io::stdin())?
            }
        };

        let mut renderer = ReportRenderer::new(self.report_opts.message_format.into());
        if output.color.should_colorize(supports_color::Stream::Stdout) {
            renderer.colorize();
        }
        let mut stdout = output_writer.stdout_writer();
        renderer
            .render(&report, &mut stdout)
            .and_then(|()| stdout.flush())
            .map_err(ExpectedError::write_output_error)?;
        drop(stdout);

        let summary = self.report_opts.summary || output.verbose;
        if summary && self.report_opts.message_format == MessageFormatOpt::Human {
            let mut renderer = ReportRenderer::new(MessageFormat::Human);
            if output.color.should_colorize(supports_color::Stream::Stderr) {
                renderer.colorize();
            }
            let mut stderr = output_writer.stderr_writer();
            renderer
                .write_summary(&report, &mut stderr)
                .and_then(|()| stderr.flush())
                .map_err(ExpectedError::write_output_error)?;
        }

        Ok(ComplianceExitCode::OK)
    }

    fn load_config(&self) -> Result<ComplianceConfig> {
        let mut config =
            ComplianceConfig::from_sources(Utf8Path::new("."), self.config_file.as_deref())?;
        self.extract_opts.apply(&mut config);
        self.filter_opts.apply(&mut config);
        Ok(config)
    }
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Extraction options")]
struct ExtractOpts {
    /// Suffix selecting the results member in the outer archive [default: .tar.gz]
    #[arg(long, value_name = "SUFFIX", value_parser = NonEmptyStringValueParser::new())]
    member_suffix: Option<String>,

    /// Format of the decompressed results [default: results-tarball]
    #[arg(long, value_enum, value_name = "FORMAT")]
    parser: Option<ParserOpt>,

    /// Path of the JUnit document within a results tarball
    #[arg(long, value_name = "PATH")]
    junit_path: Option<Utf8PathBuf>,
}

impl ExtractOpts {
    fn apply(&self, config: &mut ComplianceConfig) {
        if let Some(suffix) = &self.member_suffix {
            config.member_suffix.clone_from(suffix);
        }
        if let Some(parser) = self.parser {
            config.parser = parser.into();
        }
        if let Some(junit_path) = &self.junit_path {
            config.junit_path.clone_from(junit_path);
        }
    }
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Filter options")]
struct FilterOpts {
    /// Only show tests with this outcome
    #[arg(long, value_enum, value_name = "OUTCOME")]
    show: Option<ShowOpt>,

    /// Keep tests marked as skipped
    #[arg(long)]
    include_skipped: bool,

    /// Drop tests whose name matches this regular expression (can be repeated)
    #[arg(long, value_name = "REGEX")]
    exclude_name: Vec<String>,
}

impl FilterOpts {
    fn apply(&self, config: &mut ComplianceConfig) {
        if let Some(show) = self.show {
            config.filter.show = show.into();
        }
        if self.include_skipped {
            config.filter.exclude_skipped = false;
        }
        config
            .filter
            .exclude_names
            .extend(self.exclude_name.iter().cloned());
    }
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Report options")]
struct ReportOpts {
    /// Output format
    #[arg(long, value_enum, default_value_t, value_name = "FORMAT")]
    message_format: MessageFormatOpt,

    /// Print a count of tests per outcome to stderr (implied by --verbose, human format only)
    #[arg(long)]
    summary: bool,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
enum MessageFormatOpt {
    /// A two-column table
    #[default]
    Human,
    /// A single JSON object
    Json,
}

impl From<MessageFormatOpt> for MessageFormat {
    fn from(opt: MessageFormatOpt) -> Self {
        match opt {
            MessageFormatOpt::Human => MessageFormat::Human,
            MessageFormatOpt::Json => MessageFormat::Json,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ParserOpt {
    /// A gzip-compressed tar archive containing a JUnit document
    ResultsTarball,
    /// A gzip-compressed JUnit document
    JunitXml,
}

impl From<ParserOpt> for ParserKind {
    fn from(opt: ParserOpt) -> Self {
        match opt {
            ParserOpt::ResultsTarball => ParserKind::ResultsTarball,
            ParserOpt::JunitXml => ParserKind::JunitXml,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ShowOpt {
    All,
    Passed,
    Failed,
    Skipped,
}

impl From<ShowOpt> for ShowFilter {
    fn from(opt: ShowOpt) -> Self {
        match opt {
            ShowOpt::All => ShowFilter::All,
            ShowOpt::Passed => ShowFilter::Passed,
            ShowOpt::Failed => ShowFilter::Failed,
            ShowOpt::Skipped => ShowFilter::Skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Color;
    use camino_tempfile::Utf8TempDir;
    use clap::CommandFactory;
    use compliance_fixtures::{build_tar, results_tarball};
    use compliance_metadata::{ReportSummary, StatusSummary};
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    static JUNIT: &str = indoc! {r#"
        <testsuites>
          <testsuite name="Kubernetes e2e suite">
            <testcase name="[sig-apps] Deployment rollover"/>
            <testcase name="[sig-storage] CSI volumes"><skipped/></testcase>
            <testcase name="[sig-network] Services should serve">
              <failure message="timed out"/>
            </testcase>
          </testsuite>
        </testsuites>
    "#};

    /// Writes a run archive to a temporary directory and returns the directory and archive path.
    fn write_archive() -> (Utf8TempDir, Utf8PathBuf) {
        let results = results_tarball(JUNIT, &[]);
        let outer = build_tar(&[
            ("meta/run.log", b"log"),
            ("202406011200_sonobuoy_0c1f.tar.gz", &results),
        ]);

        let dir = camino_tempfile::tempdir().unwrap();
        let path = dir.path().join("run.tar");
        std::fs::write(&path, outer).unwrap();
        (dir, path)
    }

    fn run(args: &[&str]) -> (Result<i32>, String, String) {
        let app = ComplianceResultsApp::try_parse_from(
            std::iter::once("compliance-results").chain(args.iter().copied()),
        )
        .unwrap();
        let output = OutputContext {
            verbose: false,
            color: Color::Never,
        };
        let mut writer = OutputWriter::Test {
            stdout: Vec::new(),
            stderr: Vec::new(),
        };
        let res = app.exec(output, &mut writer);
        match writer {
            OutputWriter::Test { stdout, stderr } => (
                res,
                String::from_utf8(stdout).unwrap(),
                String::from_utf8(stderr).unwrap(),
            ),
            OutputWriter::Normal => unreachable!(),
        }
    }

    #[test]
    fn verify_app() {
        ComplianceResultsApp::command().debug_assert();
    }

    #[test]
    fn test_argument_parsing() {
        use clap::error::ErrorKind::{self, *};

        let valid: &[&'static str] = &[
            "compliance-results",
            "compliance-results run.tar",
            "compliance-results -",
            "compliance-results --config-file custom.toml run.tar",
            "compliance-results --member-suffix .tgz run.tar",
            "compliance-results --parser junit-xml run.tar",
            "compliance-results --parser results-tarball --junit-path a/b.xml",
            "compliance-results --show failed --include-skipped",
            "compliance-results --exclude-name Serial --exclude-name Disruptive",
            "compliance-results --message-format json",
            "compliance-results --summary -v --color never",
        ];

        let invalid: &[(&'static str, ErrorKind)] = &[
            ("compliance-results --member-suffix ''", InvalidValue),
            ("compliance-results --parser yaml", InvalidValue),
            ("compliance-results --show flaky", InvalidValue),
            ("compliance-results --message-format xml", InvalidValue),
            ("compliance-results --color sometimes", InvalidValue),
            ("compliance-results a.tar b.tar", UnknownArgument),
        ];

        for args in valid {
            if let Err(error) = ComplianceResultsApp::try_parse_from(split(args)) {
                panic!("{args} should have successfully parsed, but didn't: {error}");
            }
        }

        for &(args, kind) in invalid {
            match ComplianceResultsApp::try_parse_from(split(args)) {
                Ok(_) => panic!("{args} should have errored out but successfully parsed"),
                Err(error) => {
                    let actual_kind = error.kind();
                    if kind != actual_kind {
                        panic!(
                            "{args} should error with {kind}, but errored with {actual_kind}: {error}"
                        );
                    }
                }
            }
        }
    }

    fn split(args: &str) -> impl Iterator<Item = &str> {
        args.split_whitespace()
            .map(|arg| if arg == "''" { "" } else { arg })
    }

    #[test]
    fn cli_overrides_apply_over_config() {
        let app = ComplianceResultsApp::try_parse_from([
            "compliance-results",
            "--member-suffix",
            ".results.tgz",
            "--parser",
            "junit-xml",
            "--show",
            "failed",
            "--include-skipped",
            "--exclude-name",
            "Serial",
        ])
        .unwrap();

        let mut config = ComplianceConfig::default_config();
        app.extract_opts.apply(&mut config);
        app.filter_opts.apply(&mut config);
        assert_eq!(config.member_suffix, ".results.tgz");
        assert_eq!(config.parser, ParserKind::JunitXml);
        assert_eq!(config.filter.show, ShowFilter::Failed);
        assert!(!config.filter.exclude_skipped);
        assert_eq!(config.filter.exclude_names, ["Serial"]);
    }

    #[test]
    fn human_report() {
        let (_dir, path) = write_archive();
        let (res, stdout, stderr) = run(&[path.as_str(), "--summary"]);
        assert_eq!(res.unwrap(), ComplianceExitCode::OK);
        assert_eq!(
            stdout,
            indoc! {"
                STATUS  TEST
                FAILED  [sig-network] Services should serve
                PASSED  [sig-apps] Deployment rollover
            "}
        );
        assert_eq!(stderr, "2 tests: 1 failed, 1 passed, 0 skipped, 0 unknown\n");
    }

    #[test]
    fn json_report() {
        let (_dir, path) = write_archive();
        let (res, stdout, stderr) = run(&[
            path.as_str(),
            "--message-format",
            "json",
            "--include-skipped",
            "--summary",
        ]);
        assert_eq!(res.unwrap(), ComplianceExitCode::OK);
        // The summary line is only printed alongside human output.
        assert_eq!(stderr, "");

        let summary = ReportSummary::parse_json(&stdout).unwrap();
        assert_eq!(summary.member.name, "202406011200_sonobuoy_0c1f.tar.gz");
        let rows: Vec<_> = summary
            .rows
            .iter()
            .map(|row| (row.status, row.name.as_str()))
            .collect();
        assert_eq!(
            rows,
            [
                (StatusSummary::Failed, "[sig-network] Services should serve"),
                (StatusSummary::Passed, "[sig-apps] Deployment rollover"),
                (StatusSummary::Skipped, "[sig-storage] CSI volumes"),
            ]
        );
    }

    #[test]
    fn missing_archive() {
        let dir = camino_tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.tar");
        let (res, stdout, _) = run(&[path.as_str()]);
        let error = res.unwrap_err();
        assert!(
            matches!(error, ExpectedError::ArchiveOpenError { .. }),
            "unexpected error: {error:?}"
        );
        assert_eq!(error.process_exit_code(), ComplianceExitCode::SETUP_ERROR);
        assert_eq!(stdout, "");
    }

    #[test]
    fn no_results_member() {
        let dir = camino_tempfile::tempdir().unwrap();
        let path = dir.path().join("run.tar");
        std::fs::write(&path, build_tar(&[("meta/run.log", b"log")])).unwrap();

        let (res, stdout, _) = run(&[path.as_str()]);
        let error = res.unwrap_err();
        assert_eq!(
            error.process_exit_code(),
            ComplianceExitCode::ARCHIVE_EXTRACT_FAILED
        );
        // No partial report is written.
        assert_eq!(stdout, "");
    }

    #[test]
    fn invalid_exclude_pattern() {
        let (_dir, path) = write_archive();
        let (res, _, _) = run(&[path.as_str(), "--exclude-name", "(unclosed"]);
        let error = res.unwrap_err();
        assert!(
            matches!(error, ExpectedError::FilterBuildError { .. }),
            "unexpected error: {error:?}"
        );
        assert_eq!(error.process_exit_code(), ComplianceExitCode::SETUP_ERROR);
    }
}
