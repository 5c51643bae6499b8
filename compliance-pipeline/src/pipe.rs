// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A bounded, in-memory byte pipe between two threads.
//!
//! The writer half implements [`io::Write`] and the reader half implements [`io::Read`]. At most
//! `capacity` chunks may be in flight at once: writes block until the reader catches up.
//!
//! The writer must end the stream explicitly, with either [`PipeWriter::finish`] or
//! [`PipeWriter::close_with_error`]. A writer that is dropped without doing either is treated as
//! a failed producer, so that a reader never mistakes an aborted copy for a complete one.

use bytes::{Buf, Bytes};
use std::{
    fmt, io,
    sync::mpsc::{self, Receiver, SyncSender},
};

/// Creates a new pipe that buffers at most `capacity` chunks.
///
/// A capacity of 0 is treated as 1.
pub fn pipe(capacity: usize) -> (PipeWriter, PipeReader) {
    let (sender, receiver) = mpsc::sync_channel(capacity.max(1));
    let writer = PipeWriter {
        sender,
        bytes_written: 0,
    };
    let reader = PipeReader {
        receiver,
        current: Bytes::new(),
        state: ReaderState::Open,
    };
    (writer, reader)
}

enum PipeMessage {
    Chunk(Bytes),
    Eof,
    Error(io::Error),
}

/// The writing half of a [`pipe`].
pub struct PipeWriter {
    sender: SyncSender<PipeMessage>,
    bytes_written: u64,
}

impl PipeWriter {
    /// Returns the number of bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Signals a clean end of stream to the reader.
    ///
    /// Returns a [`io::ErrorKind::BrokenPipe`] error if the reader has gone away.
    pub fn finish(self) -> io::Result<()> {
        self.sender
            .send(PipeMessage::Eof)
            .map_err(|_| reader_dropped())
    }

    /// Ends the stream with an error. The reader observes this error instead of an end of
    /// stream, after all bytes written before it.
    pub fn close_with_error(self, error: io::Error) {
        // If the reader is gone there's nobody left to tell.
        let _ = self.sender.send(PipeMessage::Error(error));
    }
}

impl io::Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.sender
            .send(PipeMessage::Chunk(Bytes::copy_from_slice(buf)))
            .map_err(|_| reader_dropped())?;
        self.bytes_written += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Debug for PipeWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipeWriter")
            .field("bytes_written", &self.bytes_written)
            .finish_non_exhaustive()
    }
}

fn reader_dropped() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "pipe reader was dropped")
}

/// The state of a [`PipeReader`] as seen by its consumer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StreamState {
    /// More bytes may arrive.
    Streaming,

    /// The writer finished cleanly and every byte has been read.
    Done,

    /// The writer closed the stream with an error, or went away without closing it.
    Failed,
}

#[derive(Debug)]
enum ReaderState {
    Open,
    Done,
    // The original error is handed out once. Later reads get a copy of its kind and message.
    Failed { kind: io::ErrorKind, message: String },
}

/// The reading half of a [`pipe`].
pub struct PipeReader {
    receiver: Receiver<PipeMessage>,
    current: Bytes,
    state: ReaderState,
}

impl PipeReader {
    /// Returns the current state of the stream.
    pub fn state(&self) -> StreamState {
        match &self.state {
            ReaderState::Open => StreamState::Streaming,
            ReaderState::Done if self.current.has_remaining() => StreamState::Streaming,
            ReaderState::Done => StreamState::Done,
            ReaderState::Failed { .. } => StreamState::Failed,
        }
    }

    fn fail(&mut self, error: io::Error) -> io::Error {
        self.state = ReaderState::Failed {
            kind: error.kind(),
            message: error.to_string(),
        };
        error
    }
}

impl io::Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            if self.current.has_remaining() {
                let n = buf.len().min(self.current.remaining());
                self.current.copy_to_slice(&mut buf[..n]);
                return Ok(n);
            }

            match &self.state {
                ReaderState::Open => {}
                ReaderState::Done => return Ok(0),
                ReaderState::Failed { kind, message } => {
                    return Err(io::Error::new(*kind, message.clone()));
                }
            }

            match self.receiver.recv() {
                Ok(PipeMessage::Chunk(chunk)) => self.current = chunk,
                Ok(PipeMessage::Eof) => self.state = ReaderState::Done,
                Ok(PipeMessage::Error(error)) => return Err(self.fail(error)),
                Err(_) => {
                    return Err(self.fail(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "pipe writer was dropped without closing the pipe",
                    )));
                }
            }
        }
    }
}

impl fmt::Debug for PipeReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipeReader")
            .field("buffered", &self.current.remaining())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
