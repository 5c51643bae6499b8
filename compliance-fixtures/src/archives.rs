// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use flate2::{Compression, write::GzEncoder};
use std::io::Write;

/// The path of the JUnit document within a results tarball.
pub const JUNIT_PATH: &str = "plugins/e2e/results/junit_01.xml";

/// Builds an in-memory tar archive out of `(path, contents)` pairs, in order.
pub fn build_tar(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, contents) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, path, *contents)
            .expect("appending to an in-memory tar succeeds");
    }
    builder
        .into_inner()
        .expect("finishing an in-memory tar succeeds")
}

/// Compresses `data` as a single gzip member.
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("writing to a Vec succeeds");
    encoder.finish().expect("finishing a Vec succeeds")
}

/// Builds a gzip-compressed results tarball with the JUnit document at [`JUNIT_PATH`], followed
/// by `extra` entries.
pub fn results_tarball(junit: &str, extra: &[(&str, &[u8])]) -> Vec<u8> {
    let mut entries = vec![(JUNIT_PATH, junit.as_bytes())];
    entries.extend_from_slice(extra);
    gzip(&build_tar(&entries))
}

/// Builds an outer run archive holding a single results member.
pub fn run_archive(member_name: &str, member: &[u8]) -> Vec<u8> {
    build_tar(&[(member_name, member)])
}
