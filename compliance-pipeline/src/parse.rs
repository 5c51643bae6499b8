// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turning decompressed results into test case records.

use crate::errors::ParseError;
use camino::{Utf8Path, Utf8PathBuf};
use compliance_junit::{JunitDocument, TestCaseRecord};
use std::{
    fmt,
    io::{BufReader, Read},
};
use tracing::{debug, trace};

/// Parses a decompressed results stream into test case records.
pub trait ResultParser: fmt::Debug + Send + Sync {
    /// Reads `input` and returns the records it describes, in document order.
    ///
    /// Implementations may stop reading once they have what they need.
    fn parse(&self, input: &mut dyn Read) -> Result<Vec<TestCaseRecord>, ParseError>;
}

/// Parses a JUnit XML document.
#[derive(Clone, Copy, Debug, Default)]
pub struct JunitXmlParser;

impl ResultParser for JunitXmlParser {
    fn parse(&self, input: &mut dyn Read) -> Result<Vec<TestCaseRecord>, ParseError> {
        let document =
            JunitDocument::deserialize(BufReader::new(input)).map_err(ParseError::Junit)?;
        Ok(document.into_testcases())
    }
}

/// Parses a results tarball: a tar archive containing a JUnit XML document.
#[derive(Clone, Debug)]
pub struct ResultsTarballParser {
    junit_path: Utf8PathBuf,
}

impl ResultsTarballParser {
    /// The path of the JUnit document in results tarballs produced by the conformance tool.
    pub const DEFAULT_JUNIT_PATH: &'static str = "plugins/e2e/results/junit_01.xml";

    /// Creates a parser that reads the first member whose path ends with `junit_path`.
    ///
    /// Paths are compared component by component, so `./plugins/e2e/results/junit_01.xml`
    /// matches the default path but `myplugins/e2e/results/junit_01.xml` does not.
    pub fn new(junit_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            junit_path: junit_path.into(),
        }
    }

    /// Returns the path of the JUnit document.
    pub fn junit_path(&self) -> &Utf8Path {
        &self.junit_path
    }
}

impl Default for ResultsTarballParser {
    fn default() -> Self {
        Self::new(Self::DEFAULT_JUNIT_PATH)
    }
}

impl ResultParser for ResultsTarballParser {
    fn parse(&self, input: &mut dyn Read) -> Result<Vec<TestCaseRecord>, ParseError> {
        let mut archive = tar::Archive::new(input);
        for entry in archive.entries().map_err(ParseError::Read)? {
            let entry = entry.map_err(ParseError::Read)?;
            let path = entry.path().map_err(ParseError::Read)?.into_owned();
            if !path.ends_with(self.junit_path.as_std_path()) {
                trace!(path = %path.display(), "skipping results tarball entry");
                continue;
            }

            debug!(path = %path.display(), size = entry.size(), "reading JUnit document");
            let document =
                JunitDocument::deserialize(BufReader::new(entry)).map_err(ParseError::Junit)?;
            return Ok(document.into_testcases());
        }

        Err(ParseError::JunitDocumentNotFound {
            path: self.junit_path.clone(),
        })
    }
}
