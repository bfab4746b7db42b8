pub mod channel;
pub mod codec;
pub mod compress;
pub mod error;
pub mod format;
pub mod metadata;
pub mod position;
mod primitives;
pub mod reader;
pub mod response;
pub mod samples;
pub mod scratch;
pub mod writer;

pub use channel::{Channel, ChannelSet, Gap};
pub use codec::{Codec, CodecResolver};
pub use compress::{Compression, WriteOptions, DEFAULT_COMPRESSION_THRESHOLD};
pub use error::{Error, Result};
pub use format::{FrameSummary, IndexBlock, COMPRESSION_NONE};
pub use metadata::{MetaValue, Metadata};
pub use position::Position;
pub use primitives::{MAX_ARRAY_LEN, MAX_STRING_LEN};
pub use reader::{decode_from_slice, no_codecs, read_file, FrameReader};
pub use response::Response;
pub use samples::Samples;
pub use scratch::Scratch;
pub use writer::{encode_to_vec, write_file, write_to, FrameWriter};
