//! Per-channel sample arrays.

use std::io::Read;

use crate::error::{Error, Result};
use crate::primitives::read_pod_vec;

pub const SAMPLE_F32: u8 = 0;
pub const SAMPLE_F64: u8 = 1;
pub const SAMPLE_I32: u8 = 2;
pub const SAMPLE_I64: u8 = 3;

/// One channel's samples. `F32` is the canonical type.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    F32(Vec<f32>),
    F64(Vec<f64>),
    I32(Vec<i32>),
    I64(Vec<i64>),
}

impl Default for Samples {
    fn default() -> Self {
        Self::F32(Vec::new())
    }
}

impl Samples {
    pub const FAMILY: &'static str = "sample type";

    pub fn tag(&self) -> u8 {
        match self {
            Self::F32(_) => SAMPLE_F32,
            Self::F64(_) => SAMPLE_F64,
            Self::I32(_) => SAMPLE_I32,
            Self::I64(_) => SAMPLE_I64,
        }
    }

    /// Bytes per element for a sample type tag.
    pub fn element_size(tag: u8) -> Result<usize> {
        match tag {
            SAMPLE_F32 | SAMPLE_I32 => Ok(4),
            SAMPLE_F64 | SAMPLE_I64 => Ok(8),
            _ => Err(Error::UnknownVariantTag {
                family: Self::FAMILY,
                tag,
            }),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::F32(v) => v.len(),
            Self::F64(v) => v.len(),
            Self::I32(v) => v.len(),
            Self::I64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The array's in-memory bytes, native byte order.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::F32(v) => bytemuck::cast_slice(v),
            Self::F64(v) => bytemuck::cast_slice(v),
            Self::I32(v) => bytemuck::cast_slice(v),
            Self::I64(v) => bytemuck::cast_slice(v),
        }
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        match self {
            Self::F32(v) => bytemuck::cast_slice_mut(v),
            Self::F64(v) => bytemuck::cast_slice_mut(v),
            Self::I32(v) => bytemuck::cast_slice_mut(v),
            Self::I64(v) => bytemuck::cast_slice_mut(v),
        }
    }

    /// A zero-filled array of `count` elements of type `tag`.
    pub fn zeroed(tag: u8, count: usize) -> Result<Self> {
        Ok(match tag {
            SAMPLE_F32 => Self::F32(vec![0.0; count]),
            SAMPLE_F64 => Self::F64(vec![0.0; count]),
            SAMPLE_I32 => Self::I32(vec![0; count]),
            SAMPLE_I64 => Self::I64(vec![0; count]),
            _ => {
                return Err(Error::UnknownVariantTag {
                    family: Self::FAMILY,
                    tag,
                })
            }
        })
    }

    /// Read `count` uncompressed elements of type `tag`.
    pub(crate) fn read_raw<R: Read>(r: &mut R, tag: u8, count: usize) -> Result<Self> {
        Ok(match tag {
            SAMPLE_F32 => Self::F32(read_pod_vec(r, count)?),
            SAMPLE_F64 => Self::F64(read_pod_vec(r, count)?),
            SAMPLE_I32 => Self::I32(read_pod_vec(r, count)?),
            SAMPLE_I64 => Self::I64(read_pod_vec(r, count)?),
            _ => {
                return Err(Error::UnknownVariantTag {
                    family: Self::FAMILY,
                    tag,
                })
            }
        })
    }
}

impl From<Vec<f32>> for Samples {
    fn from(v: Vec<f32>) -> Self {
        Self::F32(v)
    }
}

impl From<Vec<f64>> for Samples {
    fn from(v: Vec<f64>) -> Self {
        Self::F64(v)
    }
}

impl From<Vec<i32>> for Samples {
    fn from(v: Vec<i32>) -> Self {
        Self::I32(v)
    }
}

impl From<Vec<i64>> for Samples {
    fn from(v: Vec<i64>) -> Self {
        Self::I64(v)
    }
}
