mod lz4_codec;
mod passthrough;
mod zlib_codec;
mod zstd_codec;

pub use lz4_codec::Lz4Codec;
pub use passthrough::PassThroughCodec;
pub use zlib_codec::ZlibCodec;
pub use zstd_codec::ZstdCodec;

use chanframe_core::format::{CODEC_LZ4, CODEC_PASSTHROUGH, CODEC_ZLIB, CODEC_ZSTD};
use chanframe_core::{Codec, Compression, WriteOptions};
use std::sync::Arc;

/// Resolve a codec from the compression flag stored in a frame's index block.
///
/// Pass this to `FrameReader::read` / `read_file` so compressed frames are
/// decoded with the codec that wrote them.
pub fn codec_by_id(id: u8) -> anyhow::Result<Arc<dyn Codec>> {
    match id {
        CODEC_PASSTHROUGH => Ok(Arc::new(PassThroughCodec)),
        CODEC_ZSTD => Ok(Arc::new(ZstdCodec::default())),
        CODEC_LZ4 => Ok(Arc::new(Lz4Codec)),
        CODEC_ZLIB => Ok(Arc::new(ZlibCodec::default())),
        _ => anyhow::bail!(
            "unknown codec id {}; supported: 1 (passthrough), 2 (zstd), 3 (lz4), 4 (zlib)",
            id
        ),
    }
}

/// Resolve a codec from its CLI name.
pub fn codec_by_name(name: &str, zstd_level: i32) -> anyhow::Result<Arc<dyn Codec>> {
    match name {
        "passthrough" | "pass" | "none" => Ok(Arc::new(PassThroughCodec)),
        "zstd" | "z" => Ok(Arc::new(ZstdCodec::new(zstd_level))),
        "lz4" | "l" => Ok(Arc::new(Lz4Codec)),
        "zlib" | "deflate" => Ok(Arc::new(ZlibCodec::default())),
        other => anyhow::bail!(
            "unknown codec '{}'. Valid options: passthrough, zstd, lz4, zlib",
            other
        ),
    }
}

/// Compress arrays above the default threshold with zstd.
pub fn default_write_options() -> WriteOptions {
    WriteOptions::new(Compression::auto(), Arc::new(ZstdCodec::default()))
}
