use chanframe_core::format::CODEC_ZSTD;
use chanframe_core::Codec;

/// Zstandard codec.
///
/// Each sample array is compressed as one independent zstd frame at the
/// configured level (default: 3).
///
/// Best for: smooth or slowly varying signals, integer counts.
pub struct ZstdCodec {
    /// Compression level (1 = fast / larger, 22 = slow / smallest).
    pub level: i32,
}

impl Default for ZstdCodec {
    fn default() -> Self {
        Self { level: 3 }
    }
}

impl ZstdCodec {
    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

impl Codec for ZstdCodec {
    fn id(&self) -> u8 {
        CODEC_ZSTD
    }

    fn name(&self) -> &'static str {
        "zstd"
    }

    fn compress_into(&self, raw: &[u8], dst: &mut [u8]) -> anyhow::Result<usize> {
        // Too-small destinations are the only failure zstd reports for
        // in-memory input; report them as "did not fit".
        if dst.len() < zstd::zstd_safe::compress_bound(raw.len()) {
            return Ok(0);
        }
        let n = zstd::bulk::compress_to_buffer(raw, dst, self.level)?;
        Ok(n)
    }

    fn decompress_into(&self, compressed: &[u8], dst: &mut [u8]) -> anyhow::Result<usize> {
        let n = zstd::bulk::decompress_to_buffer(compressed, dst)?;
        Ok(n)
    }
}
