use std::fs::File;
use std::io::{BufWriter, Cursor, Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{NativeEndian, WriteBytesExt};
use tracing::debug;

use crate::channel::{ChannelSet, Gap};
use crate::compress::{compress_samples, WriteOptions};
use crate::error::Result;
use crate::format::{index_len, IndexBlock, COMPRESSION_NONE, HEADER_SIZE};
use crate::metadata::encode_metadata;
use crate::primitives::{write_i64, write_pod_slice, write_strings};
use crate::scratch::Scratch;

/// Frame encoder over a seekable sink.
///
/// # Write contract
/// Call [`write`] once per channel set. The set is validated before any byte
/// is written; on any later error the sink holds a partial frame that must be
/// discarded.
///
/// # Format layout written
/// ```text
/// [channel_count: i64]
/// [INDEX: placeholder, skipped]             ← tags and lengths not known yet
/// [ids][names][locations][fs][gains][responses]
/// [units][sources][metadata][notes][gaps][samples]
/// ← seek back, write the real index, seek forward to the end
/// ```
///
/// [`write`]: FrameWriter::write
pub struct FrameWriter<W: Write + Seek> {
    out: W,
    options: WriteOptions,
}

impl<W: Write + Seek> FrameWriter<W> {
    pub fn new(out: W, options: WriteOptions) -> Self {
        Self { out, options }
    }

    /// Encode `set` at the current stream position. Returns the frame length
    /// in bytes; the stream is left positioned at the end of the frame.
    pub fn write(&mut self, set: &ChannelSet, scratch: &mut Scratch) -> Result<u64> {
        set.validate()?;
        let n = set.len();
        let codec = self.options.select_codec(&set.samples)?;
        let out = &mut self.out;

        // ── Header ──────────────────────────────────────────────────────────
        let start = out.stream_position()?;
        out.write_i64::<NativeEndian>(n as i64)?;

        // ── Reserve the index block ─────────────────────────────────────────
        let index_offset = start + HEADER_SIZE;
        out.seek(SeekFrom::Start(index_offset + index_len(n) as u64))?;
        let mut index = IndexBlock::new(n, codec.map_or(COMPRESSION_NONE, |c| c.id()));

        // ── Field groups, fixed order ───────────────────────────────────────
        write_strings(out, &set.id)?;
        write_strings(out, &set.name)?;
        for (entry, loc) in index.entries.iter_mut().zip(&set.location) {
            entry.position_tag = loc.tag();
            loc.encode(out)?;
        }
        write_pod_slice(out, &set.fs)?;
        write_pod_slice(out, &set.gain)?;
        for (entry, resp) in index.entries.iter_mut().zip(&set.response) {
            entry.response_tag = resp.tag();
            resp.encode(out)?;
        }
        write_strings(out, &set.units)?;
        write_strings(out, &set.source)?;
        for m in &set.metadata {
            encode_metadata(out, m)?;
        }
        for notes in &set.notes {
            write_strings(out, notes)?;
        }
        for (entry, gaps) in index.entries.iter_mut().zip(&set.gaps) {
            entry.gap_rows = gaps.len() as u64;
            write_gap_table(out, gaps, scratch)?;
        }
        for (entry, samples) in index.entries.iter_mut().zip(&set.samples) {
            entry.sample_tag = samples.tag();
            match codec {
                Some(codec) => {
                    let len = compress_samples(codec, samples, scratch)?;
                    write_i64(out, samples.len() as i64)?;
                    out.write_all(&scratch.bytes()[..len])?;
                    entry.sample_len = len as u64;
                }
                None => {
                    out.write_all(samples.as_bytes())?;
                    entry.sample_len = samples.len() as u64;
                }
            }
        }

        // ── Patch the index, return to the end ──────────────────────────────
        let end = out.stream_position()?;
        out.seek(SeekFrom::Start(index_offset))?;
        out.write_all(&index.to_bytes())?;
        out.seek(SeekFrom::Start(end))?;

        debug!(
            channels = n,
            compression = index.compression,
            bytes = end - start,
            "wrote channel frame"
        );
        Ok(end - start)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Column-major `rows × 2` matrix: every index, then every length.
fn write_gap_table<W: Write>(out: &mut W, gaps: &[Gap], scratch: &mut Scratch) -> Result<()> {
    let rows = gaps.len();
    let table = scratch.ints(2 * rows);
    for (i, g) in gaps.iter().enumerate() {
        table[i] = g.index;
        table[rows + i] = g.length_us;
    }
    write_pod_slice(out, &*table)
}

/// Encode into memory, for sinks that cannot seek.
pub fn encode_to_vec(set: &ChannelSet, options: &WriteOptions, scratch: &mut Scratch) -> Result<Vec<u8>> {
    let mut writer = FrameWriter::new(Cursor::new(Vec::new()), options.clone());
    writer.write(set, scratch)?;
    Ok(writer.into_inner().into_inner())
}

/// Encode into memory, then copy the finished frame to `sink`.
pub fn write_to<W: Write>(
    sink: &mut W,
    set: &ChannelSet,
    options: &WriteOptions,
    scratch: &mut Scratch,
) -> Result<u64> {
    let bytes = encode_to_vec(set, options, scratch)?;
    sink.write_all(&bytes)?;
    Ok(bytes.len() as u64)
}

/// Create (or truncate) `path` and write one frame to it.
pub fn write_file(
    path: impl AsRef<Path>,
    set: &ChannelSet,
    options: &WriteOptions,
    scratch: &mut Scratch,
) -> Result<u64> {
    let file = File::create(path)?;
    let mut writer = FrameWriter::new(BufWriter::new(file), options.clone());
    let len = writer.write(set, scratch)?;
    writer.flush()?;
    Ok(len)
}
