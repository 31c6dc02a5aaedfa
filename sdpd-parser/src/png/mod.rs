//! PNG container scanning
//!
//!     A PNG file is an 8 byte signature followed by a flat sequence of chunks:
//!
//!         length   u32, big-endian, payload size only
//!         type     4 ASCII bytes, not null terminated
//!         payload  `length` bytes
//!         crc      4 bytes
//!
//!     We only ever need one chunk (the `tEXt` chunk carrying the generation parameters),
//!     so the scanner walks the headers and seeks over everything else. CRCs are neither
//!     read nor verified.
//!
//! Cursor Contract
//!
//!     [find_chunk] leaves the stream positioned at the first payload byte of the match.
//!     When it fails, for whatever reason, the stream is put back where the scan started
//!     so the caller can retry with another chunk type.

pub mod byte_order;

use std::fmt;
use std::io::{self, ErrorKind, Read, Seek, SeekFrom};
use thiserror::Error;
use tracing::{debug, warn};

/// The fixed leading bytes of every PNG file.
pub const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

const CHUNK_TRAILER_LEN: i64 = 4;

/// A 4 byte chunk type tag.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkType([u8; 4]);

impl ChunkType {
    pub const IHDR: ChunkType = ChunkType(*b"IHDR");
    pub const TEXT: ChunkType = ChunkType(*b"tEXt");
    pub const IEND: ChunkType = ChunkType(*b"IEND");

    pub const fn new(tag: [u8; 4]) -> Self {
        ChunkType(tag)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkType({})", self)
    }
}

/// Errors raised while checking the file signature
#[derive(Debug, Error)]
pub enum PngError {
    #[error("not a valid PNG file")]
    InvalidSignature,

    #[error("unable to read PNG signature: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised while looking for a chunk
#[derive(Debug, Error)]
pub enum ScanError {
    /// The stream ran out before a matching chunk showed up.
    #[error("unable to find {0} chunk")]
    NotFound(ChunkType),

    #[error("chunk scan failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy)]
struct ChunkHeader {
    length: u32,
    kind: ChunkType,
}

/// Read and check the 8 byte signature.
///
/// A file shorter than the signature is reported as invalid, not as an I/O failure.
pub fn validate_signature<R: Read>(stream: &mut R) -> Result<(), PngError> {
    let mut found = [0u8; SIGNATURE.len()];

    match stream.read_exact(&mut found) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::UnexpectedEof => {
            return Err(PngError::InvalidSignature)
        }
        Err(err) => return Err(err.into()),
    }

    if found != SIGNATURE {
        return Err(PngError::InvalidSignature);
    }

    Ok(())
}

/// Find the first chunk of type `target` and return its payload length.
///
/// The stream must be positioned right after the signature (or at any chunk
/// boundary). On success it is left at the start of the payload.
pub fn find_chunk<R: Read + Seek>(stream: &mut R, target: ChunkType) -> Result<u32, ScanError> {
    let initial = stream.stream_position()?;

    scan(stream, target).map_err(|err| {
        if let Err(restore) = stream.seek(SeekFrom::Start(initial)) {
            warn!(%restore, "unable to restore stream position after failed scan");
        }
        err
    })
}

fn scan<R: Read + Seek>(stream: &mut R, target: ChunkType) -> Result<u32, ScanError> {
    while let Some(header) = read_header(stream)? {
        if header.kind == target {
            debug!(chunk = %header.kind, length = header.length, "found chunk");
            return Ok(header.length);
        }

        debug!(chunk = %header.kind, length = header.length, "skipping chunk");
        stream.seek(SeekFrom::Current(
            i64::from(header.length) + CHUNK_TRAILER_LEN,
        ))?;
    }

    Err(ScanError::NotFound(target))
}

/// Returns `None` when the stream cannot fill a whole header, which is how the walk ends.
fn read_header<R: Read>(stream: &mut R) -> io::Result<Option<ChunkHeader>> {
    let mut raw = [0u8; 8];

    match stream.read_exact(&mut raw) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(err) => return Err(err),
    }

    let [l0, l1, l2, l3, t0, t1, t2, t3] = raw;
    Ok(Some(ChunkHeader {
        length: byte_order::be_u32([l0, l1, l2, l3]),
        kind: ChunkType::new([t0, t1, t2, t3]),
    }))
}
