// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Streaming extraction of a single member from an outer tar archive.
//!
//! The outer archive is read on a worker thread. Entries are scanned in order until one whose
//! path ends with the configured suffix is found, at which point the caller is told about the
//! match and the member's bytes are copied into a [`pipe`](crate::pipe). The caller reads the
//! other end of the pipe through a [`MemberStream`] while the copy is still in progress.
//!
//! Scan failures are returned from [`ArchiveExtractor::extract`] itself. Copy failures are
//! delivered to the reader as read errors.

use crate::{
    errors::{ExtractError, MemberCopyError},
    helpers::panic_payload_to_string,
    pipe::{PipeReader, PipeWriter, StreamState, pipe},
};
use std::{
    io::{self, Read},
    sync::mpsc::{self, SyncSender},
    thread,
};
use tracing::{debug, info, trace, warn};

/// Scans an outer tar archive for a member and streams its contents.
#[derive(Clone, Debug)]
pub struct ArchiveExtractor {
    suffix: String,
    pipe_capacity: usize,
}

impl ArchiveExtractor {
    /// The suffix used to find the results member when none is configured.
    pub const DEFAULT_SUFFIX: &'static str = ".tar.gz";

    /// The number of chunks that may be buffered between the copy thread and the reader.
    pub const DEFAULT_PIPE_CAPACITY: usize = 16;

    /// Creates a new extractor that selects the first member whose path ends with `suffix`.
    ///
    /// Matching is case-sensitive and done on the raw bytes of the path.
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
            pipe_capacity: Self::DEFAULT_PIPE_CAPACITY,
        }
    }

    /// Sets the number of chunks that may be in flight between the copy thread and the reader.
    pub fn with_pipe_capacity(mut self, pipe_capacity: usize) -> Self {
        self.pipe_capacity = pipe_capacity;
        self
    }

    /// Returns the suffix this extractor matches.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Starts reading `outer` as a tar archive, and returns a stream over the first matching
    /// member's contents.
    ///
    /// This blocks until a matching member is found, the archive is exhausted or the archive
    /// fails to parse. Entries after the matching member are never read.
    pub fn extract<R>(&self, outer: R) -> Result<MemberStream, ExtractError>
    where
        R: Read + Send + 'static,
    {
        let (writer, reader) = pipe(self.pipe_capacity);
        let (handoff_tx, handoff_rx) = mpsc::sync_channel(1);
        let suffix = self.suffix.clone();

        debug!(suffix = %self.suffix, "scanning outer archive");
        let handle = thread::Builder::new()
            .name("compliance-member-copy".to_owned())
            .spawn(move || scan_and_copy(outer, &suffix, writer, handoff_tx))
            .map_err(ExtractError::WorkerSpawn)?;

        match handoff_rx.recv() {
            Ok(Ok(member)) => {
                // The copy thread runs until the member is copied or the stream is dropped.
                drop(handle);
                Ok(MemberStream::new(member, reader))
            }
            Ok(Err(error)) => {
                // The thread exits right after reporting.
                let _ = handle.join();
                Err(error)
            }
            Err(_) => {
                let message = match handle.join() {
                    Err(payload) => panic_payload_to_string(payload),
                    Ok(()) => "copy thread exited without reporting a result".to_owned(),
                };
                Err(ExtractError::WorkerPanic { message })
            }
        }
    }
}

impl Default for ArchiveExtractor {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SUFFIX)
    }
}

/// The outer archive member selected by an [`ArchiveExtractor`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MatchedMember {
    /// The path of the member within the outer archive, converted lossily to UTF-8.
    pub name: String,

    /// The size of the member as declared in its header.
    pub size: u64,
}

type Handoff = SyncSender<Result<MatchedMember, ExtractError>>;

fn scan_and_copy<R: Read>(outer: R, suffix: &str, writer: PipeWriter, handoff: Handoff) {
    let mut archive = tar::Archive::new(outer);
    let mut entries_scanned = 0;

    let entries = match archive.entries() {
        Ok(entries) => entries,
        Err(error) => {
            let _ = handoff.send(Err(ExtractError::MalformedArchive {
                entries_scanned,
                error,
            }));
            return;
        }
    };

    for entry in entries {
        let mut entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                let _ = handoff.send(Err(ExtractError::MalformedArchive {
                    entries_scanned,
                    error,
                }));
                return;
            }
        };
        entries_scanned += 1;

        let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        if !entry.path_bytes().ends_with(suffix.as_bytes()) {
            trace!(path = %name, "skipping entry");
            continue;
        }

        let member = MatchedMember {
            name,
            size: entry.size(),
        };
        info!(
            member = %member.name,
            size = member.size,
            entries_scanned,
            "found compliance results archive",
        );
        if handoff.send(Ok(member.clone())).is_err() {
            return;
        }
        copy_member(&member, &mut entry, writer);
        return;
    }

    let _ = handoff.send(Err(ExtractError::NoMatchingMember {
        suffix: suffix.to_owned(),
        entries_scanned,
    }));
}

fn copy_member(member: &MatchedMember, entry: &mut impl Read, mut writer: PipeWriter) {
    match io::copy(entry, &mut writer) {
        Ok(copied) if copied == member.size => match writer.finish() {
            Ok(()) => debug!(member = %member.name, copied, "finished copying member"),
            Err(error) => {
                debug!(member = %member.name, %error, "reader went away before end of stream");
            }
        },
        Ok(copied) => {
            // The entry reader returns a short read instead of an error when the outer stream
            // ends early.
            warn!(
                member = %member.name,
                copied,
                expected = member.size,
                "outer archive ended in the middle of the member",
            );
            writer.close_with_error(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "outer archive ended after {copied} of {} bytes of the member",
                    member.size
                ),
            ));
        }
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => {
            debug!(
                member = %member.name,
                copied = writer.bytes_written(),
                "reader went away, stopping copy",
            );
        }
        Err(error) => {
            warn!(
                member = %member.name,
                copied = writer.bytes_written(),
                %error,
                "error copying member",
            );
            writer.close_with_error(error);
        }
    }
}

/// A readable stream over the contents of a [`MatchedMember`].
///
/// Errors that interrupted the copy are returned by `read` as [`io::Error`]s of the same kind,
/// wrapping a [`MemberCopyError`].
#[derive(Debug)]
pub struct MemberStream {
    member: MatchedMember,
    reader: PipeReader,
    bytes_read: u64,
}

impl MemberStream {
    fn new(member: MatchedMember, reader: PipeReader) -> Self {
        Self {
            member,
            reader,
            bytes_read: 0,
        }
    }

    /// Returns the member being streamed.
    pub fn member(&self) -> &MatchedMember {
        &self.member
    }

    /// Returns the number of bytes read so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Returns the state of the stream.
    pub fn state(&self) -> StreamState {
        self.reader.state()
    }
}

impl Read for MemberStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.reader.read(buf) {
            Ok(n) => {
                self.bytes_read += n as u64;
                Ok(n)
            }
            Err(error) => Err(io::Error::new(
                error.kind(),
                MemberCopyError::new(self.member.name.clone(), self.bytes_read, error),
            )),
        }
    }
}
