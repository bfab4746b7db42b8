//! Reusable scratch buffers shared across encode/decode calls.
//!
//! A [`Scratch`] is owned by the caller and lent to each call as
//! `&mut Scratch`, so one encode or decode holds it exclusively for its whole
//! duration. Contents are meaningless between calls.

use std::io::Read;

use crate::error::Result;

/// Alignment applied by [`Scratch::ensure_aligned`].
pub const SCRATCH_ALIGN: usize = 8;

#[derive(Debug, Default)]
pub struct Scratch {
    bytes: Vec<u8>,
    ints: Vec<i64>,
}

impl Scratch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current length of the byte buffer.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Grow the byte buffer to at least `n` bytes and return it.
    pub fn ensure(&mut self, n: usize) -> &mut [u8] {
        if self.bytes.len() < n {
            self.bytes.resize(n, 0);
        }
        &mut self.bytes[..]
    }

    /// Like [`ensure`](Self::ensure), with `n` rounded up to [`SCRATCH_ALIGN`].
    pub fn ensure_aligned(&mut self, n: usize) -> &mut [u8] {
        let rounded = n.div_ceil(SCRATCH_ALIGN) * SCRATCH_ALIGN;
        self.ensure(rounded)
    }

    /// Grow the byte buffer to the next power of two strictly above its
    /// current length. Returns the new length.
    pub fn grow_pow2(&mut self) -> usize {
        let next = (self.bytes.len() + 1).next_power_of_two();
        self.bytes.resize(next, 0);
        next
    }

    /// Read exactly `n` bytes from `r` into the byte buffer and return them.
    ///
    /// The buffer grows in bounded steps as data arrives, so a corrupt length
    /// fails with a short read before it can force a huge allocation.
    pub fn fill_from<R: Read>(&mut self, r: &mut R, n: usize) -> Result<&[u8]> {
        const STEP: usize = 1 << 20;
        let mut filled = 0;
        while filled < n {
            let upto = filled + (n - filled).min(STEP.max(filled));
            r.read_exact(&mut self.ensure(upto)[filled..upto])?;
            filled = upto;
        }
        Ok(&self.bytes[..n])
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Grow the integer buffer to at least `n` values and return its first `n`.
    pub fn ints(&mut self, n: usize) -> &mut [i64] {
        if self.ints.len() < n {
            self.ints.resize(n, 0);
        }
        &mut self.ints[..n]
    }
}
