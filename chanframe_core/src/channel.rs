//! The channel-set container and its single-row view.

use std::mem::size_of;

use bytemuck::{Pod, Zeroable};

use crate::error::{Error, Result};
use crate::metadata::{metadata_size, Metadata};
use crate::position::Position;
use crate::response::Response;
use crate::samples::Samples;

/// A time discontinuity: `length_us` microseconds are missing before sample
/// `index`. Indices are expected to be non-decreasing within a channel.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Gap {
    pub index: i64,
    pub length_us: i64,
}

impl Gap {
    pub const fn new(index: i64, length_us: i64) -> Self {
        Self { index, length_us }
    }
}

/// One channel: metadata plus samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub location: Position,
    /// Sample rate in Hz; `0.0` marks irregular sampling.
    pub fs: f64,
    pub gain: f64,
    pub response: Response,
    pub units: String,
    pub source: String,
    pub metadata: Metadata,
    pub notes: Vec<String>,
    pub gaps: Vec<Gap>,
    pub samples: Samples,
}

impl Default for Channel {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            location: Position::default(),
            fs: 0.0,
            gain: 1.0,
            response: Response::default(),
            units: String::new(),
            source: String::new(),
            metadata: Metadata::new(),
            notes: Vec::new(),
            gaps: Vec::new(),
            samples: Samples::default(),
        }
    }
}

impl Channel {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// N channels stored as parallel per-field vectors.
///
/// Every vector must hold exactly [`len`](Self::len) entries. The fields are
/// public for direct replacement; [`validate`](Self::validate) reports the
/// first vector that drifted out of step, and the encoder refuses to write a
/// set that fails it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelSet {
    pub(crate) n: usize,
    pub id: Vec<String>,
    pub name: Vec<String>,
    pub location: Vec<Position>,
    pub fs: Vec<f64>,
    pub gain: Vec<f64>,
    pub response: Vec<Response>,
    pub units: Vec<String>,
    pub source: Vec<String>,
    pub metadata: Vec<Metadata>,
    pub notes: Vec<Vec<String>>,
    pub gaps: Vec<Vec<Gap>>,
    pub samples: Vec<Samples>,
}

impl ChannelSet {
    /// An empty set (N = 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// `n` channels, every field filled with its default.
    pub fn with_len(n: usize) -> Self {
        Self {
            n,
            id: vec![String::new(); n],
            name: vec![String::new(); n],
            location: vec![Position::default(); n],
            fs: vec![0.0; n],
            gain: vec![1.0; n],
            response: vec![Response::default(); n],
            units: vec![String::new(); n],
            source: vec![String::new(); n],
            metadata: vec![Metadata::new(); n],
            notes: vec![Vec::new(); n],
            gaps: vec![Vec::new(); n],
            samples: vec![Samples::default(); n],
        }
    }

    /// Declared channel count.
    #[inline]
    pub fn len(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Check that every per-channel vector has exactly `len()` entries.
    pub fn validate(&self) -> Result<()> {
        let lengths = [
            ("id", self.id.len()),
            ("name", self.name.len()),
            ("location", self.location.len()),
            ("fs", self.fs.len()),
            ("gain", self.gain.len()),
            ("response", self.response.len()),
            ("units", self.units.len()),
            ("source", self.source.len()),
            ("metadata", self.metadata.len()),
            ("notes", self.notes.len()),
            ("gaps", self.gaps.len()),
            ("samples", self.samples.len()),
        ];
        for (field, actual) in lengths {
            if actual != self.n {
                return Err(Error::StructuralMismatch {
                    field,
                    expected: self.n,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Append one channel.
    pub fn push(&mut self, ch: Channel) {
        self.id.push(ch.id);
        self.name.push(ch.name);
        self.location.push(ch.location);
        self.fs.push(ch.fs);
        self.gain.push(ch.gain);
        self.response.push(ch.response);
        self.units.push(ch.units);
        self.source.push(ch.source);
        self.metadata.push(ch.metadata);
        self.notes.push(ch.notes);
        self.gaps.push(ch.gaps);
        self.samples.push(ch.samples);
        self.n += 1;
    }

    /// Remove and return channel `i`, shifting later channels down.
    ///
    /// # Panics
    /// If `i >= len()` or a field vector is shorter than `len()`.
    pub fn remove(&mut self, i: usize) -> Channel {
        let ch = Channel {
            id: self.id.remove(i),
            name: self.name.remove(i),
            location: self.location.remove(i),
            fs: self.fs.remove(i),
            gain: self.gain.remove(i),
            response: self.response.remove(i),
            units: self.units.remove(i),
            source: self.source.remove(i),
            metadata: self.metadata.remove(i),
            notes: self.notes.remove(i),
            gaps: self.gaps.remove(i),
            samples: self.samples.remove(i),
        };
        self.n -= 1;
        ch
    }

    /// A copy of channel `i`, or `None` if out of range.
    pub fn channel(&self, i: usize) -> Option<Channel> {
        if i >= self.n {
            return None;
        }
        Some(Channel {
            id: self.id.get(i)?.clone(),
            name: self.name.get(i)?.clone(),
            location: self.location.get(i)?.clone(),
            fs: *self.fs.get(i)?,
            gain: *self.gain.get(i)?,
            response: self.response.get(i)?.clone(),
            units: self.units.get(i)?.clone(),
            source: self.source.get(i)?.clone(),
            metadata: self.metadata.get(i)?.clone(),
            notes: self.notes.get(i)?.clone(),
            gaps: self.gaps.get(i)?.clone(),
            samples: self.samples.get(i)?.clone(),
        })
    }

    /// Keep the first `n` channels.
    pub fn truncate(&mut self, n: usize) {
        if n >= self.n {
            return;
        }
        self.id.truncate(n);
        self.name.truncate(n);
        self.location.truncate(n);
        self.fs.truncate(n);
        self.gain.truncate(n);
        self.response.truncate(n);
        self.units.truncate(n);
        self.source.truncate(n);
        self.metadata.truncate(n);
        self.notes.truncate(n);
        self.gaps.truncate(n);
        self.samples.truncate(n);
        self.n = n;
    }

    /// Conservative in-memory size of the whole set in bytes.
    pub fn approx_size(&self) -> usize {
        fn strings(v: &[String]) -> usize {
            v.iter().map(|s| s.len() + size_of::<String>()).sum()
        }

        let mut total = size_of::<Self>();
        total += strings(&self.id) + strings(&self.name) + strings(&self.units) + strings(&self.source);
        total += self.location.len() * size_of::<Position>();
        total += (self.fs.len() + self.gain.len()) * size_of::<f64>();
        total += self.response.len() * size_of::<Response>();
        total += self.metadata.iter().map(metadata_size).sum::<usize>();
        total += self.notes.iter().map(|v| strings(v) + size_of::<Vec<String>>()).sum::<usize>();
        total += self
            .gaps
            .iter()
            .map(|g| g.len() * size_of::<Gap>() + size_of::<Vec<Gap>>())
            .sum::<usize>();
        total += self
            .samples
            .iter()
            .map(|s| s.as_bytes().len() + size_of::<Samples>())
            .sum::<usize>();
        total
    }
}

impl FromIterator<Channel> for ChannelSet {
    fn from_iter<I: IntoIterator<Item = Channel>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl Extend<Channel> for ChannelSet {
    fn extend<I: IntoIterator<Item = Channel>>(&mut self, iter: I) {
        for ch in iter {
            self.push(ch);
        }
    }
}
