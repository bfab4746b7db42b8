//! Per-channel metadata maps with type-tagged values.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::mem::size_of;

use byteorder::{ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};
use crate::primitives::{
    read_counted_pod_vec, read_f64, read_i64, read_len, read_string, read_strings, write_f64,
    write_i64, write_len, write_pod_vec, write_string, write_strings, MAX_ARRAY_LEN,
};
use crate::scratch::Scratch;

pub type Metadata = BTreeMap<String, MetaValue>;

/// Deepest nesting of [`MetaValue::Map`] accepted on encode and decode.
pub const MAX_METADATA_DEPTH: usize = 16;

pub const META_BOOL: u8 = 0;
pub const META_INT: u8 = 1;
pub const META_FLOAT: u8 = 2;
pub const META_STR: u8 = 3;
pub const META_STR_ARRAY: u8 = 4;
pub const META_INT_ARRAY: u8 = 5;
pub const META_FLOAT_ARRAY: u8 = 6;
pub const META_BYTES: u8 = 7;
pub const META_MAP: u8 = 8;

/// Fixed cost charged per map entry and per heap allocation by
/// [`MetaValue::approx_size`].
const ENTRY_OVERHEAD: usize = 48;

#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    StrArray(Vec<String>),
    IntArray(Vec<i64>),
    FloatArray(Vec<f64>),
    Bytes(Vec<u8>),
    Map(Metadata),
}

impl MetaValue {
    pub fn kind(&self) -> u8 {
        match self {
            Self::Bool(_) => META_BOOL,
            Self::Int(_) => META_INT,
            Self::Float(_) => META_FLOAT,
            Self::Str(_) => META_STR,
            Self::StrArray(_) => META_STR_ARRAY,
            Self::IntArray(_) => META_INT_ARRAY,
            Self::FloatArray(_) => META_FLOAT_ARRAY,
            Self::Bytes(_) => META_BYTES,
            Self::Map(_) => META_MAP,
        }
    }

    /// Conservative in-memory size estimate in bytes.
    pub fn approx_size(&self) -> usize {
        let payload = match self {
            Self::Bool(_) | Self::Int(_) | Self::Float(_) => 0,
            Self::Str(s) => s.len(),
            Self::StrArray(v) => v.iter().map(|s| s.len() + size_of::<String>()).sum(),
            Self::IntArray(v) => v.len() * size_of::<i64>(),
            Self::FloatArray(v) => v.len() * size_of::<f64>(),
            Self::Bytes(v) => v.len(),
            Self::Map(m) => metadata_size(m),
        };
        size_of::<Self>() + payload
    }
}

impl From<bool> for MetaValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for MetaValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for MetaValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for MetaValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// Conservative in-memory size of a whole map, nested maps included.
pub fn metadata_size(m: &Metadata) -> usize {
    m.iter()
        .map(|(k, v)| ENTRY_OVERHEAD + k.len() + v.approx_size())
        .sum()
}

pub fn encode_metadata<W: Write>(w: &mut W, m: &Metadata) -> Result<()> {
    encode_map(w, m, 0)
}

pub fn decode_metadata<R: Read>(r: &mut R, scratch: &mut Scratch) -> Result<Metadata> {
    decode_map(r, scratch, 0)
}

fn encode_map<W: Write>(w: &mut W, m: &Metadata, depth: usize) -> Result<()> {
    if depth > MAX_METADATA_DEPTH {
        return Err(Error::invalid(format!(
            "metadata nested deeper than {MAX_METADATA_DEPTH} levels"
        )));
    }
    write_len(w, m.len())?;
    for (key, value) in m {
        write_string(w, key)?;
        w.write_u8(value.kind())?;
        match value {
            MetaValue::Bool(b) => w.write_u8(u8::from(*b))?,
            MetaValue::Int(i) => write_i64(w, *i)?,
            MetaValue::Float(f) => write_f64(w, *f)?,
            MetaValue::Str(s) => write_string(w, s)?,
            MetaValue::StrArray(v) => write_strings(w, v)?,
            MetaValue::IntArray(v) => write_pod_vec(w, v)?,
            MetaValue::FloatArray(v) => write_pod_vec(w, v)?,
            MetaValue::Bytes(v) => write_pod_vec(w, v)?,
            MetaValue::Map(inner) => encode_map(w, inner, depth + 1)?,
        }
    }
    Ok(())
}

fn decode_map<R: Read>(r: &mut R, scratch: &mut Scratch, depth: usize) -> Result<Metadata> {
    if depth > MAX_METADATA_DEPTH {
        return Err(Error::invalid(format!(
            "metadata nested deeper than {MAX_METADATA_DEPTH} levels"
        )));
    }
    let n = read_len(r, "metadata map", MAX_ARRAY_LEN)?;
    let mut m = Metadata::new();
    for _ in 0..n {
        let key = read_string(r, scratch)?;
        let value = match r.read_u8()? {
            META_BOOL => MetaValue::Bool(r.read_u8()? != 0),
            META_INT => MetaValue::Int(read_i64(r)?),
            META_FLOAT => MetaValue::Float(read_f64(r)?),
            META_STR => MetaValue::Str(read_string(r, scratch)?),
            META_STR_ARRAY => MetaValue::StrArray(read_strings(r, scratch)?),
            META_INT_ARRAY => MetaValue::IntArray(read_counted_pod_vec(r, "int array")?),
            META_FLOAT_ARRAY => MetaValue::FloatArray(read_counted_pod_vec(r, "float array")?),
            META_BYTES => MetaValue::Bytes(read_counted_pod_vec(r, "byte array")?),
            META_MAP => MetaValue::Map(decode_map(r, scratch, depth + 1)?),
            tag => {
                return Err(Error::UnknownVariantTag {
                    family: "metadata value",
                    tag,
                })
            }
        };
        m.insert(key, value);
    }
    Ok(m)
}
