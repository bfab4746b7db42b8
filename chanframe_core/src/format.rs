//! Frame header and index block layout.
//!
//! ```text
//! [channel_count: i64]
//! [INDEX: 3N tag bytes | compression flag: u8 | N gap rows: i64 | N sample lengths: i64]
//! [ids][names][locations][fs][gains][responses][units][sources]
//! [metadata][notes][gap tables][samples]
//! ```
//!
//! The index block is reserved before the field groups are written and
//! patched in afterwards, once every tag and sample length is known.

use std::io::Read;

use byteorder::{ByteOrder, NativeEndian};

use crate::error::{Error, Result};
use crate::position::Position;
use crate::primitives::MAX_ARRAY_LEN;
use crate::response::Response;
use crate::samples::Samples;

/// Size of the channel-count header in bytes.
pub const HEADER_SIZE: u64 = 8;

/// Largest channel count a frame may declare.
pub const MAX_CHANNELS: usize = 1 << 24;

/// Compression flag value for frames whose samples are stored raw.
/// Any other value is the id of the codec that compressed them.
pub const COMPRESSION_NONE: u8 = 0;

// ── Codec IDs ──────────────────────────────────────────────────────────────

pub const CODEC_PASSTHROUGH: u8 = 1;
pub const CODEC_ZSTD: u8 = 2;
pub const CODEC_LZ4: u8 = 3;
pub const CODEC_ZLIB: u8 = 4;

/// Bytes per channel in the index: three tags plus two `i64` lengths.
const ENTRY_TAG_BYTES: usize = 3;
const ENTRY_LEN_BYTES: usize = 16;

/// Size of the index block for `n` channels.
pub const fn index_len(n: usize) -> usize {
    ENTRY_TAG_BYTES * n + 1 + ENTRY_LEN_BYTES * n
}

/// Index data for one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelEntry {
    pub position_tag: u8,
    pub response_tag: u8,
    pub sample_tag: u8,
    /// Rows in the channel's gap table.
    pub gap_rows: u64,
    /// Compressed byte length when the frame is compressed, element count otherwise.
    pub sample_len: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexBlock {
    pub entries: Vec<ChannelEntry>,
    pub compression: u8,
}

impl IndexBlock {
    pub fn new(n: usize, compression: u8) -> Self {
        Self {
            entries: vec![ChannelEntry::default(); n],
            compression,
        }
    }

    #[inline]
    pub fn is_compressed(&self) -> bool {
        self.compression != COMPRESSION_NONE
    }

    /// Serialize to exactly `index_len(entries.len())` bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let n = self.entries.len();
        let mut buf = vec![0u8; index_len(n)];
        for (i, e) in self.entries.iter().enumerate() {
            buf[3 * i] = e.position_tag;
            buf[3 * i + 1] = e.response_tag;
            buf[3 * i + 2] = e.sample_tag;
        }
        let flag_at = ENTRY_TAG_BYTES * n;
        buf[flag_at] = self.compression;

        let (gap_rows, sample_lens) = buf[flag_at + 1..].split_at_mut(8 * n);
        for (i, e) in self.entries.iter().enumerate() {
            NativeEndian::write_i64(&mut gap_rows[8 * i..8 * i + 8], e.gap_rows as i64);
            NativeEndian::write_i64(&mut sample_lens[8 * i..8 * i + 8], e.sample_len as i64);
        }
        buf
    }

    /// Read the index block of an `n`-channel frame and check every tag
    /// against its registry.
    pub fn read_from<R: Read>(r: &mut R, n: usize) -> Result<Self> {
        let mut buf = vec![0u8; index_len(n)];
        r.read_exact(&mut buf)?;

        let flag_at = ENTRY_TAG_BYTES * n;
        let compression = buf[flag_at];
        let (gap_rows, sample_lens) = buf[flag_at + 1..].split_at(8 * n);

        let mut entries = Vec::with_capacity(n);
        for i in 0..n {
            let entry = ChannelEntry {
                position_tag: buf[3 * i],
                response_tag: buf[3 * i + 1],
                sample_tag: buf[3 * i + 2],
                gap_rows: checked_len(NativeEndian::read_i64(&gap_rows[8 * i..8 * i + 8]), i, "gap rows")?,
                sample_len: checked_len(
                    NativeEndian::read_i64(&sample_lens[8 * i..8 * i + 8]),
                    i,
                    "sample length",
                )?,
            };
            Position::check_tag(entry.position_tag)?;
            Response::check_tag(entry.response_tag)?;
            Samples::element_size(entry.sample_tag)?;
            entries.push(entry);
        }
        Ok(Self {
            entries,
            compression,
        })
    }
}

fn checked_len(v: i64, channel: usize, what: &str) -> Result<u64> {
    if v < 0 || v as u64 > MAX_ARRAY_LEN as u64 {
        return Err(Error::invalid(format!("channel {channel}: {what} {v} out of range")));
    }
    Ok(v as u64)
}

/// Header and index of a frame, without its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSummary {
    pub channels: usize,
    pub index: IndexBlock,
}
