use chanframe_core::format::CODEC_ZLIB;
use chanframe_core::Codec;
use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

/// zlib (deflate) codec via `flate2`.
///
/// Slower than zstd at similar ratios; kept for interchange with tools that
/// only speak deflate.
pub struct ZlibCodec {
    pub level: Compression,
}

impl Default for ZlibCodec {
    fn default() -> Self {
        Self {
            level: Compression::default(),
        }
    }
}

impl Codec for ZlibCodec {
    fn id(&self) -> u8 {
        CODEC_ZLIB
    }

    fn name(&self) -> &'static str {
        "zlib"
    }

    fn compress_into(&self, raw: &[u8], dst: &mut [u8]) -> anyhow::Result<usize> {
        let mut z = Compress::new(self.level, true);
        match z.compress(raw, dst, FlushCompress::Finish)? {
            Status::StreamEnd => Ok(z.total_out() as usize),
            // Output filled up before the stream could be finished.
            Status::Ok | Status::BufError => Ok(0),
        }
    }

    fn decompress_into(&self, compressed: &[u8], dst: &mut [u8]) -> anyhow::Result<usize> {
        let mut z = Decompress::new(true);
        match z.decompress(compressed, dst, FlushDecompress::Finish)? {
            Status::StreamEnd => Ok(z.total_out() as usize),
            status => anyhow::bail!(
                "zlib stream incomplete ({:?}) after {} of {} input bytes",
                status,
                z.total_in(),
                compressed.len()
            ),
        }
    }
}
