// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::io::{self, Read};

/// A reader that yields `data` up to `fail_after` bytes, then fails with `kind`.
#[derive(Debug)]
pub struct FailingReader {
    data: io::Cursor<Vec<u8>>,
    fail_after: u64,
    kind: io::ErrorKind,
}

impl FailingReader {
    /// Creates a new reader over `data` that fails after `fail_after` bytes.
    pub fn new(data: Vec<u8>, fail_after: u64, kind: io::ErrorKind) -> Self {
        Self {
            data: io::Cursor::new(data),
            fail_after,
            kind,
        }
    }
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.fail_after.saturating_sub(self.data.position());
        if remaining == 0 {
            return Err(io::Error::new(self.kind, "injected read failure"));
        }
        let len = buf.len().min(remaining as usize);
        self.data.read(&mut buf[..len])
    }
}
