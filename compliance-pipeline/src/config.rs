// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for `compliance-results`.
//!
//! The built-in defaults in `default-config.toml` are layered under an optional
//! `.config/compliance.toml`, or a config file passed in explicitly.

use crate::{
    errors::{ConfigParseError, ConfigParseErrorKind, FilterBuildError},
    extract::ArchiveExtractor,
    filter::{RecordFilter, ShowFilter},
    parse::{JunitXmlParser, ResultParser, ResultsTarballParser},
};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::warn;

/// Overall configuration for `compliance-results`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct ComplianceConfig {
    /// The suffix that selects the results member in the outer archive.
    pub member_suffix: String,

    /// How the decompressed results are parsed.
    pub parser: ParserKind,

    /// The path of the JUnit document within a results tarball.
    pub junit_path: Utf8PathBuf,

    /// The number of chunks buffered between the copy thread and the reader.
    pub pipe_capacity: usize,

    /// Which records are left out of the report.
    pub filter: FilterConfig,
}

impl ComplianceConfig {
    /// The default location of the config within a directory.
    pub const CONFIG_PATH: &'static str = ".config/compliance.toml";

    /// Contains the default config as a TOML file.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Returns the built-in configuration.
    pub fn default_config() -> Self {
        let (config, unknown) = Self::build_and_deserialize(Self::make_default_config())
            .expect("default config is always valid");

        // The default config is embedded in the binary, so it must not have unknown keys.
        if !unknown.is_empty() {
            panic!(
                "found unknown keys in default config: {}",
                unknown.into_iter().collect::<Vec<_>>().join(", ")
            );
        }
        config
    }

    /// Reads the config from `config_file`, or if not specified from `.config/compliance.toml`
    /// in `dir`, layered over the built-in defaults.
    ///
    /// An explicitly specified file must exist. Unknown keys are reported as warnings.
    pub fn from_sources(
        dir: &Utf8Path,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = dir.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        let builder = Self::make_default_config().add_source(source);
        let (config, unknown) = Self::build_and_deserialize(builder)
            .map_err(|kind| ConfigParseError::new(&config_file, kind))?;
        if !unknown.is_empty() {
            warn!(
                config_file = %config_file,
                keys = ?unknown,
                "ignoring unknown configuration keys",
            );
        }

        config
            .validate()
            .map_err(|kind| ConfigParseError::new(&config_file, kind))?;
        Ok(config)
    }

    /// Returns an extractor for the configured member suffix.
    pub fn extractor(&self) -> ArchiveExtractor {
        ArchiveExtractor::new(self.member_suffix.clone()).with_pipe_capacity(self.pipe_capacity)
    }

    /// Returns the configured parser.
    pub fn build_parser(&self) -> Box<dyn ResultParser> {
        match self.parser {
            ParserKind::ResultsTarball => {
                Box::new(ResultsTarballParser::new(self.junit_path.clone()))
            }
            ParserKind::JunitXml => Box::new(JunitXmlParser),
        }
    }

    /// Returns the configured record filter.
    pub fn record_filter(&self) -> Result<RecordFilter, FilterBuildError> {
        RecordFilter::new(&self.filter)
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn build_and_deserialize(
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<(Self, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build()
            .map_err(|error| ConfigParseErrorKind::Build(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config = Self::deserialize(ignored_de)
            .map_err(|error| ConfigParseErrorKind::Build(Box::new(error)))?;
        Ok((config, ignored))
    }

    fn validate(&self) -> Result<(), ConfigParseErrorKind> {
        if self.member_suffix.is_empty() {
            return Err(ConfigParseErrorKind::EmptyMemberSuffix);
        }
        self.record_filter().map_err(ConfigParseErrorKind::Filter)?;
        Ok(())
    }
}

/// The format of the decompressed results.
#[derive(Copy, Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum ParserKind {
    /// A tar archive containing a JUnit document.
    ResultsTarball,

    /// A JUnit document.
    JunitXml,
}

/// Configuration for the record filter.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct FilterConfig {
    /// Drop records marked as skipped.
    pub exclude_skipped: bool,

    /// Which outcomes are shown.
    pub show: ShowFilter,

    /// Regular expressions for test case names to drop.
    pub exclude_names: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            exclude_skipped: true,
            show: ShowFilter::All,
            exclude_names: Vec::new(),
        }
    }
}
