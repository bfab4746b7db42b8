use std::sync::Arc;

/// Block compressor used for sample arrays.
///
/// Each `Codec` implementation:
/// - Is identified by a stable non-zero `id()` stored in the frame's index
///   block. Id 0 is reserved for "uncompressed".
/// - Compresses one sample array at a time into a caller-provided buffer, so
///   the frame writer can reuse its scratch memory across channels.
/// - Decompresses straight into a pre-sized destination whose length is the
///   exact raw byte size recorded in the frame.
pub trait Codec: Send + Sync {
    /// Stable codec ID stored in the index block's compression flag.
    fn id(&self) -> u8;

    /// Human-readable codec name for CLI display.
    fn name(&self) -> &'static str;

    /// Compress `raw` into `dst` and return the number of bytes written.
    ///
    /// Returns `Ok(0)` when the output does not fit in `dst`; the caller grows
    /// the buffer and retries. Errors are reserved for genuine codec failures.
    /// The frame writer never passes an empty `raw`.
    fn compress_into(&self, raw: &[u8], dst: &mut [u8]) -> anyhow::Result<usize>;

    /// Decompress `compressed` into `dst` and return the number of bytes written.
    fn decompress_into(&self, compressed: &[u8], dst: &mut [u8]) -> anyhow::Result<usize>;
}

/// Maps a codec id read from a frame back to a codec instance.
///
/// `chanframe_codecs::codec_by_id` has exactly this shape.
pub type CodecResolver = dyn Fn(u8) -> anyhow::Result<Arc<dyn Codec>>;
