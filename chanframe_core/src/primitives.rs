//! Fixed-width and length-prefixed primitive codecs.
//!
//! Scalars go through `byteorder` in native byte order; contiguous arrays are
//! written as their in-memory bytes via `bytemuck`, which is the same order.
//! Lengths and counts are `i64`.

use std::io::{Read, Write};

use byteorder::{NativeEndian, ReadBytesExt, WriteBytesExt};
use bytemuck::Pod;

use crate::error::{Error, Result};
use crate::scratch::Scratch;

/// Largest string a frame may declare.
pub const MAX_STRING_LEN: usize = 1 << 30;

/// Largest element count a frame may declare for a single array.
pub const MAX_ARRAY_LEN: usize = 1 << 34;

pub(crate) fn write_len<W: Write>(w: &mut W, n: usize) -> Result<()> {
    w.write_i64::<NativeEndian>(n as i64)?;
    Ok(())
}

/// Read an `i64` count and check it is usable as a length.
pub(crate) fn read_len<R: Read>(r: &mut R, what: &str, max: usize) -> Result<usize> {
    let n = r.read_i64::<NativeEndian>()?;
    if n < 0 || n as u64 > max as u64 {
        return Err(Error::invalid(format!("{what} length {n} out of range")));
    }
    Ok(n as usize)
}

pub(crate) fn write_f64<W: Write>(w: &mut W, v: f64) -> Result<()> {
    w.write_f64::<NativeEndian>(v)?;
    Ok(())
}

pub(crate) fn read_f64<R: Read>(r: &mut R) -> Result<f64> {
    Ok(r.read_f64::<NativeEndian>()?)
}

pub(crate) fn write_f32<W: Write>(w: &mut W, v: f32) -> Result<()> {
    w.write_f32::<NativeEndian>(v)?;
    Ok(())
}

pub(crate) fn read_f32<R: Read>(r: &mut R) -> Result<f32> {
    Ok(r.read_f32::<NativeEndian>()?)
}

pub(crate) fn write_i64<W: Write>(w: &mut W, v: i64) -> Result<()> {
    w.write_i64::<NativeEndian>(v)?;
    Ok(())
}

pub(crate) fn read_i64<R: Read>(r: &mut R) -> Result<i64> {
    Ok(r.read_i64::<NativeEndian>()?)
}

/// Write a contiguous block of plain values, no prefix.
pub(crate) fn write_pod_slice<W: Write, T: Pod>(w: &mut W, v: &[T]) -> Result<()> {
    w.write_all(bytemuck::cast_slice(v))?;
    Ok(())
}

/// Read exactly `n` plain values written by [`write_pod_slice`].
///
/// Grows the vector in bounded steps so a corrupt count hits a short read
/// before it can force a huge allocation.
pub(crate) fn read_pod_vec<R: Read, T: Pod>(r: &mut R, n: usize) -> Result<Vec<T>> {
    const STEP: usize = 1 << 16;
    let mut v: Vec<T> = Vec::with_capacity(n.min(STEP));
    while v.len() < n {
        let start = v.len();
        v.resize(start + (n - start).min(STEP), T::zeroed());
        r.read_exact(bytemuck::cast_slice_mut(&mut v[start..]))?;
    }
    Ok(v)
}

/// Count-prefixed array of plain values.
pub(crate) fn write_pod_vec<W: Write, T: Pod>(w: &mut W, v: &[T]) -> Result<()> {
    write_len(w, v.len())?;
    write_pod_slice(w, v)
}

pub(crate) fn read_counted_pod_vec<R: Read, T: Pod>(r: &mut R, what: &str) -> Result<Vec<T>> {
    let n = read_len(r, what, MAX_ARRAY_LEN)?;
    read_pod_vec(r, n)
}

pub(crate) fn write_string<W: Write>(w: &mut W, s: &str) -> Result<()> {
    write_len(w, s.len())?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

/// Read a length-prefixed string through the scratch buffer.
pub(crate) fn read_string<R: Read>(r: &mut R, scratch: &mut Scratch) -> Result<String> {
    let n = read_len(r, "string", MAX_STRING_LEN)?;
    let buf = scratch.fill_from(r, n)?;
    String::from_utf8(buf.to_vec()).map_err(|e| Error::invalid(format!("string is not UTF-8: {e}")))
}

pub(crate) fn write_strings<W: Write>(w: &mut W, v: &[String]) -> Result<()> {
    write_len(w, v.len())?;
    for s in v {
        write_string(w, s)?;
    }
    Ok(())
}

pub(crate) fn read_strings<R: Read>(r: &mut R, scratch: &mut Scratch) -> Result<Vec<String>> {
    let n = read_len(r, "string vector", MAX_ARRAY_LEN)?;
    let mut out = Vec::with_capacity(n.min(1024));
    for _ in 0..n {
        out.push(read_string(r, scratch)?);
    }
    Ok(out)
}

/// Read a string vector whose count must equal the frame's channel count.
pub(crate) fn read_channel_strings<R: Read>(
    r: &mut R,
    scratch: &mut Scratch,
    field: &'static str,
    expected: usize,
) -> Result<Vec<String>> {
    let v = read_strings(r, scratch)?;
    if v.len() != expected {
        return Err(Error::StructuralMismatch {
            field,
            expected,
            actual: v.len(),
        });
    }
    Ok(v)
}
