use chanframe_core::format::CODEC_LZ4;
use chanframe_core::Codec;
use lz4_flex::block::{compress_into, decompress_into, CompressError};

/// LZ4 block codec.
///
/// Fastest decompression of all bundled codecs. Raw LZ4 blocks carry no size
/// header; the frame already records the element count, so the destination
/// is always sized exactly.
///
/// Best for: large, moderately redundant arrays read back often.
pub struct Lz4Codec;

impl Codec for Lz4Codec {
    fn id(&self) -> u8 {
        CODEC_LZ4
    }

    fn name(&self) -> &'static str {
        "lz4"
    }

    fn compress_into(&self, raw: &[u8], dst: &mut [u8]) -> anyhow::Result<usize> {
        match compress_into(raw, dst) {
            Ok(n) => Ok(n),
            Err(CompressError::OutputTooSmall) => Ok(0),
            Err(e) => Err(anyhow::anyhow!("lz4 compress error: {}", e)),
        }
    }

    fn decompress_into(&self, compressed: &[u8], dst: &mut [u8]) -> anyhow::Result<usize> {
        let n = decompress_into(compressed, dst)
            .map_err(|e| anyhow::anyhow!("lz4 decompress error: {}", e))?;
        Ok(n)
    }
}
