// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `compliance-results` failures.
///
/// The command may fail for a variety of reasons. This structure documents the exit codes that
/// may occur in case of expected failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum ComplianceExitCode {}

impl ComplianceExitCode {
    /// No errors occurred and the report was rendered.
    pub const OK: i32 = 0;

    /// The outer archive could not be read, or no results member was found in it.
    pub const ARCHIVE_EXTRACT_FAILED: i32 = 103;

    /// The results member could not be decompressed, or was truncated while being copied.
    pub const RESULTS_READ_FAILED: i32 = 104;

    /// The decompressed results could not be parsed into test cases.
    pub const RESULTS_PARSE_FAILED: i32 = 105;

    /// Writing the report to stdout produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;

    /// A user issue happened while setting up the invocation, such as an invalid config file or
    /// an input archive that could not be opened.
    pub const SETUP_ERROR: i32 = 96;
}
