// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gzip decompression of the results member.

use crate::errors::{CorruptStreamError, DecompressError};
use flate2::read::MultiGzDecoder;
use std::{
    fmt,
    io::{self, Chain, Cursor, Read},
};
use thiserror::Error;

/// gzip magic bytes (RFC 1952).
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Lazily decompresses a gzip stream.
///
/// Concatenated gzip members are decoded as a single stream.
pub struct GzipStage<R> {
    decoder: MultiGzDecoder<UpstreamRead<Chain<Cursor<[u8; 2]>, R>>>,
}

impl<R: Read> GzipStage<R> {
    /// Checks that `reader` starts with a gzip header and prepares to decompress it.
    ///
    /// Only the magic bytes are read here. Everything else is read as the stage is read.
    pub fn new(mut reader: R) -> Result<Self, DecompressError> {
        let mut magic = [0; 2];
        let mut filled = 0;
        while filled < magic.len() {
            match reader.read(&mut magic[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => return Err(DecompressError::Read(error)),
            }
        }

        if filled == 0 {
            return Err(DecompressError::CorruptStream(CorruptStreamError::Empty));
        }
        if magic[..filled] != GZIP_MAGIC {
            return Err(DecompressError::CorruptStream(
                CorruptStreamError::InvalidHeader {
                    found: magic[..filled].to_vec(),
                },
            ));
        }

        let upstream = UpstreamRead(Cursor::new(magic).chain(reader));
        Ok(Self {
            decoder: MultiGzDecoder::new(upstream),
        })
    }
}

impl<R: Read> Read for GzipStage<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.decoder.read(buf).map_err(|error| {
            let kind = error.kind();
            if error.get_ref().is_some_and(|inner| inner.is::<UpstreamError>()) {
                match error.into_inner().map(|inner| inner.downcast::<UpstreamError>()) {
                    Some(Ok(upstream)) => upstream.0,
                    // Checked above.
                    Some(Err(inner)) => io::Error::new(kind, inner),
                    None => io::Error::from(kind),
                }
            } else {
                io::Error::new(kind, CorruptStreamError::Decode(error))
            }
        })
    }
}

impl<R> fmt::Debug for GzipStage<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GzipStage").finish_non_exhaustive()
    }
}

/// Marks errors returned by the compressed stream, so they can be told apart from errors the
/// decoder itself produces.
#[derive(Debug, Error)]
#[error("error reading compressed stream")]
struct UpstreamError(#[source] io::Error);

struct UpstreamRead<R>(R);

impl<R: Read> Read for UpstreamRead<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf).map_err(|error| {
            if error.kind() == io::ErrorKind::Interrupted {
                error
            } else {
                io::Error::new(error.kind(), UpstreamError(error))
            }
        })
    }
}
