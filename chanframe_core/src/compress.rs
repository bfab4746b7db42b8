//! Sample-array compression: mode selection, the grow-and-retry compress
//! loop, and typed decompression.

use std::fmt;
use std::io::Read;
use std::sync::Arc;

use tracing::warn;

use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::format::COMPRESSION_NONE;
use crate::primitives::{read_len, MAX_ARRAY_LEN};
use crate::samples::Samples;
use crate::scratch::Scratch;

/// Default per-array size above which `Compression::Auto` kicks in: 4 MiB.
pub const DEFAULT_COMPRESSION_THRESHOLD: usize = 4 << 20;

/// Compress attempts per array before giving up. Each failed attempt doubles
/// (at least) the scratch buffer.
pub const MAX_COMPRESSION_ATTEMPTS: usize = 8;

/// Smallest scratch buffer offered to the compressor, so tiny arrays don't
/// walk the growth ladder from zero.
const MIN_COMPRESS_CAPACITY: usize = 64;

/// Largest raw-to-compressed size ratio accepted when reading a block.
/// Bundled codecs stay well below it (zstd RLE blocks peak near 2^15).
pub const MAX_EXPANSION_RATIO: usize = 1 << 16;

/// Whether sample arrays are compressed for one write call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compression {
    /// Store every array raw.
    #[default]
    Off,
    /// Compress every array if any array exceeds `threshold_bytes`.
    Auto { threshold_bytes: usize },
    /// Compress every array.
    Forced,
}

impl Compression {
    pub fn auto() -> Self {
        Self::Auto {
            threshold_bytes: DEFAULT_COMPRESSION_THRESHOLD,
        }
    }

    /// Decide for a whole container.
    pub fn applies_to(&self, samples: &[Samples]) -> bool {
        match *self {
            Self::Off => false,
            Self::Auto { threshold_bytes } => samples
                .iter()
                .any(|s| s.as_bytes().len() > threshold_bytes),
            Self::Forced => true,
        }
    }
}

/// Options for one encode call.
#[derive(Clone, Default)]
pub struct WriteOptions {
    pub compression: Compression,
    /// Required whenever `compression` ends up compressing.
    pub codec: Option<Arc<dyn Codec>>,
}

impl WriteOptions {
    /// Never compress.
    pub fn uncompressed() -> Self {
        Self::default()
    }

    pub fn new(compression: Compression, codec: Arc<dyn Codec>) -> Self {
        Self {
            compression,
            codec: Some(codec),
        }
    }

    /// The codec to use for `samples`, or `None` when they stay raw.
    pub(crate) fn select_codec(&self, samples: &[Samples]) -> Result<Option<&dyn Codec>> {
        if !self.compression.applies_to(samples) {
            return Ok(None);
        }
        let codec = self.codec.as_deref().ok_or_else(|| {
            Error::InvalidOptions(format!("{:?} compression requires a codec", self.compression))
        })?;
        if codec.id() == COMPRESSION_NONE {
            return Err(Error::InvalidOptions(format!(
                "codec '{}' uses reserved id {COMPRESSION_NONE}",
                codec.name()
            )));
        }
        Ok(Some(codec))
    }
}

impl fmt::Debug for WriteOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteOptions")
            .field("compression", &self.compression)
            .field("codec", &self.codec.as_ref().map(|c| c.name()))
            .finish()
    }
}

/// Compress one array into `scratch`, growing it until the output fits.
///
/// Returns the compressed length; the bytes are `scratch.bytes()[..len]`.
/// Empty arrays bypass the codec and store a zero-length block.
pub(crate) fn compress_samples(
    codec: &dyn Codec,
    samples: &Samples,
    scratch: &mut Scratch,
) -> Result<usize> {
    let raw = samples.as_bytes();
    if raw.is_empty() {
        return Ok(0);
    }
    scratch.ensure_aligned(raw.len().max(MIN_COMPRESS_CAPACITY));

    for attempt in 1..=MAX_COMPRESSION_ATTEMPTS {
        let written = codec
            .compress_into(raw, scratch.bytes_mut())
            .map_err(Error::Codec)?;
        if written > 0 {
            return Ok(written);
        }
        let previous = scratch.capacity();
        let capacity = scratch.grow_pow2();
        warn!(
            codec = codec.name(),
            attempt,
            raw_bytes = raw.len(),
            previous,
            capacity,
            "compressed samples did not fit scratch buffer, growing and retrying"
        );
    }
    Err(Error::CompressionExhausted {
        attempts: MAX_COMPRESSION_ATTEMPTS,
        capacity: scratch.capacity(),
    })
}

/// Read one compressed block: `[count: i64][compressed_len bytes]`.
pub(crate) fn read_compressed_samples<R: Read>(
    r: &mut R,
    codec: &dyn Codec,
    tag: u8,
    compressed_len: usize,
    scratch: &mut Scratch,
) -> Result<Samples> {
    let count = read_len(r, "sample count", MAX_ARRAY_LEN)?;
    let src = scratch.fill_from(r, compressed_len)?;

    let raw_len = count
        .checked_mul(Samples::element_size(tag)?)
        .filter(|&n| n <= compressed_len.saturating_add(1).saturating_mul(MAX_EXPANSION_RATIO))
        .ok_or_else(|| {
            Error::invalid(format!(
                "{} block of {compressed_len} bytes claims {count} elements",
                codec.name()
            ))
        })?;
    let mut out = Samples::zeroed(tag, count)?;
    if raw_len == 0 {
        return Ok(out);
    }
    let dst = out.as_bytes_mut();
    let expected = dst.len();
    let written = codec.decompress_into(src, dst).map_err(Error::Codec)?;
    if written != expected {
        return Err(Error::invalid(format!(
            "{} block decompressed to {written} bytes, expected {expected}",
            codec.name()
        )));
    }
    Ok(out)
}
