//! Error types for frame encoding and decoding.

use std::io;

use thiserror::Error;

/// Every failure is fatal for the encode/decode call that raised it. A stream
/// that produced an error is unusable from that point on.
#[derive(Error, Debug)]
pub enum Error {
    /// A per-channel vector does not have one entry per channel.
    #[error("structural mismatch: `{field}` has {actual} entries, expected {expected}")]
    StructuralMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A tag read from the stream is outside its family's registered range.
    #[error("unknown {family} tag {tag}")]
    UnknownVariantTag { family: &'static str, tag: u8 },

    /// The index block names a codec the resolver does not know.
    #[error("unknown codec id {0}")]
    UnknownCodec(u8),

    /// The compressor never fit its output into the scratch buffer.
    #[error("compression ineffective after {attempts} attempts (scratch capacity {capacity} bytes)")]
    CompressionExhausted { attempts: usize, capacity: usize },

    /// The stream ended before a complete frame was read.
    #[error("truncated stream: unexpected end of input")]
    Truncated,

    /// Lengths, counts, or payload bytes that cannot describe a valid frame.
    #[error("invalid frame structure: {0}")]
    InvalidStructure(String),

    /// Write options that cannot be honoured.
    #[error("invalid write options: {0}")]
    InvalidOptions(String),

    /// The block compressor reported a failure.
    #[error("codec error: {0}")]
    Codec(#[source] anyhow::Error),

    #[error("I/O error: {0}")]
    Io(#[source] io::Error),
}

impl Error {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Self::Truncated
        } else {
            Self::Io(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
