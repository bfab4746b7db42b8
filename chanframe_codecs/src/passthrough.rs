use chanframe_core::format::CODEC_PASSTHROUGH;
use chanframe_core::Codec;

/// No-op codec: stores sample bytes verbatim behind the compressed-block
/// header.
///
/// Useful for:
/// - Exercising the compressed read/write path independently of any real
///   compressor.
/// - Samples that are already high-entropy, where compression would expand them.
pub struct PassThroughCodec;

impl Codec for PassThroughCodec {
    fn id(&self) -> u8 {
        CODEC_PASSTHROUGH
    }

    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn compress_into(&self, raw: &[u8], dst: &mut [u8]) -> anyhow::Result<usize> {
        if dst.len() < raw.len() {
            return Ok(0);
        }
        dst[..raw.len()].copy_from_slice(raw);
        Ok(raw.len())
    }

    fn decompress_into(&self, compressed: &[u8], dst: &mut [u8]) -> anyhow::Result<usize> {
        if dst.len() != compressed.len() {
            anyhow::bail!(
                "passthrough block is {} bytes but destination holds {}",
                compressed.len(),
                dst.len()
            );
        }
        dst.copy_from_slice(compressed);
        Ok(compressed.len())
    }
}
