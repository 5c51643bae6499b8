// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use camino::Utf8PathBuf;
use compliance_metadata::ComplianceExitCode;
use compliance_pipeline::errors::{ConfigParseError, FilterBuildError, PipelineError};
use owo_colors::OwoColorize;
use std::error::Error;
use thiserror::Error;
use tracing::error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// An error that `compliance-results` knows how to report.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("test name filter build error")]
    FilterBuildError {
        #[from]
        err: FilterBuildError,
    },
    #[error("failed to open archive")]
    ArchiveOpenError {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("pipeline error")]
    PipelineError {
        #[from]
        err: PipelineError,
    },
    #[error("error writing output")]
    WriteOutputError {
        #[source]
        err: std::io::Error,
    },
}

impl ExpectedError {
    pub(crate) fn archive_open_error(path: impl Into<Utf8PathBuf>, err: std::io::Error) -> Self {
        Self::ArchiveOpenError {
            path: path.into(),
            err,
        }
    }

    pub(crate) fn write_output_error(err: std::io::Error) -> Self {
        Self::WriteOutputError { err }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ConfigParseError { .. }
            | Self::FilterBuildError { .. }
            | Self::ArchiveOpenError { .. } => ComplianceExitCode::SETUP_ERROR,
            Self::PipelineError { err } => match err {
                PipelineError::Extract(_) => ComplianceExitCode::ARCHIVE_EXTRACT_FAILED,
                PipelineError::CorruptStream(_) | PipelineError::MemberCopy(_) => {
                    ComplianceExitCode::RESULTS_READ_FAILED
                }
                PipelineError::Parse(_) => ComplianceExitCode::RESULTS_PARSE_FAILED,
                _ => ComplianceExitCode::RESULTS_READ_FAILED,
            },
            Self::WriteOutputError { .. } => ComplianceExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error: Option<&dyn Error> = match &self {
            Self::ConfigParseError { err } => {
                error!(
                    "failed to parse config at `{}`",
                    err.config_file().style(styles.bold)
                );
                err.source()
            }
            Self::FilterBuildError { err } => {
                error!(
                    "invalid test name pattern `{}`",
                    err.pattern().style(styles.bold)
                );
                err.source()
            }
            Self::ArchiveOpenError { path, err } => {
                error!("failed to open archive `{}`", path.style(styles.bold));
                Some(err as &dyn Error)
            }
            Self::PipelineError { err } => {
                error!("{err}");
                err.source()
            }
            Self::WriteOutputError { err } => {
                error!("error writing report to output");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compliance_pipeline::{config::ComplianceConfig, pipeline::ResultsPipeline};
    use std::io::{self, Cursor};

    fn pipeline_error(outer: Vec<u8>) -> ExpectedError {
        let config = ComplianceConfig::default_config();
        ResultsPipeline::from_config(&config)
            .unwrap()
            .run(Cursor::new(outer))
            .unwrap_err()
            .into()
    }

    #[test]
    fn exit_codes() {
        let error = pipeline_error(Vec::new());
        assert_eq!(
            error.process_exit_code(),
            ComplianceExitCode::ARCHIVE_EXTRACT_FAILED
        );

        let error = ExpectedError::archive_open_error(
            "missing.tar",
            io::Error::from(io::ErrorKind::NotFound),
        );
        assert_eq!(error.process_exit_code(), ComplianceExitCode::SETUP_ERROR);

        let error = ExpectedError::write_output_error(io::Error::from(io::ErrorKind::BrokenPipe));
        assert_eq!(
            error.process_exit_code(),
            ComplianceExitCode::WRITE_OUTPUT_ERROR
        );
    }
}
