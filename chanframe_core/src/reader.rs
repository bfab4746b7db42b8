use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;
use std::sync::Arc;

use byteorder::{NativeEndian, ReadBytesExt};
use tracing::debug;

use crate::channel::{ChannelSet, Gap};
use crate::codec::{Codec, CodecResolver};
use crate::compress::read_compressed_samples;
use crate::error::{Error, Result};
use crate::format::{FrameSummary, IndexBlock, MAX_CHANNELS};
use crate::metadata::decode_metadata;
use crate::position::Position;
use crate::primitives::{read_channel_strings, read_pod_vec, read_strings};
use crate::response::Response;
use crate::samples::Samples;
use crate::scratch::Scratch;

/// Single-pass frame decoder.
///
/// # Read sequence
/// 1. Read the channel count.
/// 2. Read the whole index block: every tag, the compression flag, and the
///    length table. Tags are checked against their registries here, before
///    any payload is touched.
/// 3. Read the field groups in the order they were written, sizing every
///    variable-length read from the count or the index.
///
/// Any error aborts the decode; no partially built set is returned.
pub struct FrameReader<R: Read> {
    input: R,
}

impl<R: Read> FrameReader<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }

    /// Read only the header and index block.
    pub fn read_summary(&mut self) -> Result<FrameSummary> {
        let raw = self.input.read_i64::<NativeEndian>()?;
        if raw < 0 || raw as u64 > MAX_CHANNELS as u64 {
            return Err(Error::invalid(format!("channel count {raw} out of range")));
        }
        let channels = raw as usize;
        let index = IndexBlock::read_from(&mut self.input, channels)?;
        Ok(FrameSummary { channels, index })
    }

    /// Decode one full frame.
    ///
    /// `resolve` is consulted only if the frame's samples are compressed.
    pub fn read(&mut self, scratch: &mut Scratch, resolve: &CodecResolver) -> Result<ChannelSet> {
        let FrameSummary { channels: n, index } = self.read_summary()?;
        let codec = if index.is_compressed() {
            let codec = resolve(index.compression).map_err(|e| {
                debug!(id = index.compression, error = %e, "codec resolver failed");
                Error::UnknownCodec(index.compression)
            })?;
            Some(codec)
        } else {
            None
        };
        let r = &mut self.input;

        let id = read_channel_strings(r, scratch, "id", n)?;
        let name = read_channel_strings(r, scratch, "name", n)?;
        let mut location = Vec::with_capacity(n);
        for e in &index.entries {
            location.push(Position::decode(e.position_tag, r, scratch)?);
        }
        let fs: Vec<f64> = read_pod_vec(r, n)?;
        let gain: Vec<f64> = read_pod_vec(r, n)?;
        let mut response = Vec::with_capacity(n);
        for e in &index.entries {
            response.push(Response::decode(e.response_tag, r, scratch)?);
        }
        let units = read_channel_strings(r, scratch, "units", n)?;
        let source = read_channel_strings(r, scratch, "source", n)?;
        let mut metadata = Vec::with_capacity(n);
        for _ in 0..n {
            metadata.push(decode_metadata(r, scratch)?);
        }
        let mut notes = Vec::with_capacity(n);
        for _ in 0..n {
            notes.push(read_strings(r, scratch)?);
        }
        let mut gaps = Vec::with_capacity(n);
        for e in &index.entries {
            gaps.push(read_gap_table(r, e.gap_rows as usize)?);
        }
        let mut samples = Vec::with_capacity(n);
        for e in &index.entries {
            let s = match codec.as_deref() {
                Some(codec) => read_compressed_samples(r, codec, e.sample_tag, e.sample_len as usize, scratch)?,
                None => Samples::read_raw(r, e.sample_tag, e.sample_len as usize)?,
            };
            samples.push(s);
        }

        debug!(channels = n, compression = index.compression, "read channel frame");
        Ok(ChannelSet {
            n,
            id,
            name,
            location,
            fs,
            gain,
            response,
            units,
            source,
            metadata,
            notes,
            gaps,
            samples,
        })
    }

    pub fn into_inner(self) -> R {
        self.input
    }
}

fn read_gap_table<R: Read>(r: &mut R, rows: usize) -> Result<Vec<Gap>> {
    let index: Vec<i64> = read_pod_vec(r, rows)?;
    let length: Vec<i64> = read_pod_vec(r, rows)?;
    Ok(index
        .into_iter()
        .zip(length)
        .map(|(index, length_us)| Gap { index, length_us })
        .collect())
}

/// Decode a frame held in memory.
pub fn decode_from_slice(bytes: &[u8], scratch: &mut Scratch, resolve: &CodecResolver) -> Result<ChannelSet> {
    FrameReader::new(Cursor::new(bytes)).read(scratch, resolve)
}

/// Open `path` and decode the frame at its start.
pub fn read_file(path: impl AsRef<Path>, scratch: &mut Scratch, resolve: &CodecResolver) -> Result<ChannelSet> {
    let file = File::open(path)?;
    FrameReader::new(BufReader::new(file)).read(scratch, resolve)
}

/// Resolver for frames that are known to be uncompressed.
pub fn no_codecs(id: u8) -> anyhow::Result<Arc<dyn Codec>> {
    anyhow::bail!("no codec available for id {id}")
}
