// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by the compliance results pipeline.

use crate::helpers::find_cause;
use camino::Utf8PathBuf;
use compliance_junit::DeserializeError;
use config::ConfigError;
use std::io;
use thiserror::Error;

/// An error that occurred while scanning the outer archive for the results member.
///
/// All of these are detected before any byte of the member is handed to the caller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtractError {
    /// The outer stream could not be read as a tar archive.
    #[error("outer archive is malformed")]
    MalformedArchive {
        /// The number of entries that were read successfully before the error.
        entries_scanned: usize,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The outer archive was read to the end without finding a matching member.
    #[error(
        "no compliance results archive found \
         (scanned {entries_scanned} entries, none ending with `{suffix}`)"
    )]
    NoMatchingMember {
        /// The suffix that was searched for.
        suffix: String,

        /// The number of entries in the outer archive.
        entries_scanned: usize,
    },

    /// The thread that reads the outer archive could not be started.
    #[error("failed to spawn archive member copy thread")]
    WorkerSpawn(#[source] io::Error),

    /// The thread that reads the outer archive panicked while scanning.
    #[error("archive member copy thread panicked: {message}")]
    WorkerPanic {
        /// The panic message.
        message: String,
    },
}

/// An error that occurred while copying the results member out of the outer archive.
///
/// This is delivered to readers of a [`MemberStream`](crate::extract::MemberStream), wrapped in
/// an [`io::Error`] of the same kind as the underlying error, instead of an end-of-stream.
#[derive(Debug, Error)]
#[error("error copying archive member `{member}` after {bytes_read} bytes")]
pub struct MemberCopyError {
    member: String,
    bytes_read: u64,
    #[source]
    error: io::Error,
}

impl MemberCopyError {
    pub(crate) fn new(member: impl Into<String>, bytes_read: u64, error: io::Error) -> Self {
        Self {
            member: member.into(),
            bytes_read,
            error,
        }
    }

    /// Returns the name of the member that was being copied.
    pub fn member(&self) -> &str {
        &self.member
    }

    /// Returns the number of bytes that were delivered to the reader before the error.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Returns the error that interrupted the copy.
    pub fn error(&self) -> &io::Error {
        &self.error
    }
}

/// Describes why a compressed stream could not be decoded.
///
/// Header problems are returned directly by [`GzipStage::new`](crate::decompress::GzipStage::new).
/// Problems found later are wrapped in an [`io::Error`] by the reads that detect them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CorruptStreamError {
    /// The stream contained no bytes at all.
    #[error("compressed stream is empty")]
    Empty,

    /// The stream does not start with the gzip magic bytes.
    #[error("invalid gzip header: expected magic bytes 1f 8b, found {}", format_bytes(.found))]
    InvalidHeader {
        /// The bytes found at the start of the stream.
        found: Vec<u8>,
    },

    /// The decoder rejected the stream, or the stream ended in the middle of a record.
    #[error("error decoding gzip stream")]
    Decode(#[source] io::Error),
}

fn format_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// An error returned while setting up a [`GzipStage`](crate::decompress::GzipStage).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecompressError {
    /// The stream is not a gzip stream.
    #[error("results stream is corrupt")]
    CorruptStream(#[source] CorruptStreamError),

    /// Reading the start of the stream failed.
    #[error("error reading compressed stream")]
    Read(#[source] io::Error),
}

/// An error returned by a [`ResultParser`](crate::parse::ResultParser).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Reading the decompressed results failed.
    #[error("error reading decompressed results")]
    Read(#[source] io::Error),

    /// The JUnit document could not be read.
    #[error("error reading JUnit document")]
    Junit(#[source] DeserializeError),

    /// The results tarball did not contain a JUnit document at the expected path.
    #[error("JUnit document `{path}` not found in results tarball")]
    JunitDocumentNotFound {
        /// The path that was searched for.
        path: Utf8PathBuf,
    },
}

impl ParseError {
    /// Splits out the underlying I/O error, if this error was caused by the input stream.
    pub fn into_io(self) -> Result<io::Error, Self> {
        match self {
            ParseError::Read(error) => Ok(error),
            ParseError::Junit(DeserializeError::Io(error)) => Ok(error),
            other => Err(other),
        }
    }
}

/// An error that occurred while building a [`RecordFilter`](crate::filter::RecordFilter).
#[derive(Debug, Error)]
#[error("invalid test name pattern `{pattern}`")]
pub struct FilterBuildError {
    pattern: String,
    #[source]
    error: regex::Error,
}

impl FilterBuildError {
    pub(crate) fn new(pattern: impl Into<String>, error: regex::Error) -> Self {
        Self {
            pattern: pattern.into(),
            error,
        }
    }

    /// Returns the pattern that failed to compile.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

/// An error that occurred while reading configuration.
#[derive(Debug, Error)]
#[error("failed to parse compliance config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file this error was found in.
    pub fn config_file(&self) -> &camino::Utf8Path {
        &self.config_file
    }

    /// Returns the kind of error.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of a [`ConfigParseError`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// The config could not be read or deserialized.
    #[error(transparent)]
    Build(Box<ConfigError>),

    /// `member-suffix` was set to an empty string.
    #[error("`member-suffix` must not be empty")]
    EmptyMemberSuffix,

    /// A pattern in `filter.exclude-names` failed to compile.
    #[error(transparent)]
    Filter(FilterBuildError),
}

/// An error that aborted the pipeline. No report is produced when this is returned.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// The results member could not be located in the outer archive.
    #[error("could not extract the compliance results from archive")]
    Extract(#[source] ExtractError),

    /// The results member was not a valid compressed stream.
    #[error("could not decompress compliance results")]
    CorruptStream(#[source] io::Error),

    /// Copying the results member out of the outer archive failed partway through.
    ///
    /// The inner error chain contains a [`MemberCopyError`].
    #[error("compliance results archive was truncated while copying")]
    MemberCopy(#[source] io::Error),

    /// The decompressed results could not be parsed.
    #[error("could not parse the compliance results")]
    Parse(#[source] ParseError),
}

impl PipelineError {
    /// Attributes an I/O error observed downstream of extraction to the stage that caused it.
    ///
    /// A copy failure takes precedence: it is the root cause even if the decoder or parser
    /// noticed something was off first.
    pub(crate) fn from_read_error(error: io::Error) -> Self {
        if find_cause::<MemberCopyError>(&error).is_some() {
            PipelineError::MemberCopy(error)
        } else if find_cause::<CorruptStreamError>(&error).is_some() {
            PipelineError::CorruptStream(error)
        } else {
            PipelineError::Parse(ParseError::Read(error))
        }
    }

    pub(crate) fn from_decompress(error: DecompressError) -> Self {
        match error {
            DecompressError::CorruptStream(error) => PipelineError::CorruptStream(
                io::Error::new(io::ErrorKind::InvalidData, error),
            ),
            DecompressError::Read(error) => Self::from_read_error(error),
        }
    }

    pub(crate) fn from_parse(error: ParseError) -> Self {
        match error.into_io() {
            Ok(error) => Self::from_read_error(error),
            Err(error) => PipelineError::Parse(error),
        }
    }

    /// Returns the [`MemberCopyError`] in this error's chain, if any.
    pub fn member_copy_error(&self) -> Option<&MemberCopyError> {
        match self {
            PipelineError::MemberCopy(error) => find_cause(error),
            _ => None,
        }
    }
}
