//! The frequency buffer a render produces, and its on-disk form: a raw
//! run of native-endian `u32` counts, row-major, with no header.  A
//! reader must already know the width and height (they come from the
//! genome).

use crate::error::{FlameError, Result};
use itertools::{Itertools, MinMaxResult};
use std::io::{self, Read, Write};

/// Dense per-pixel visit counts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Histogram {
    width: usize,
    height: usize,
    counts: Vec<u32>,
}

/// Summary of a histogram, for logging and for the tone mapper.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HistogramStats {
    /// Sum of all counts.
    pub total: u64,
    /// Smallest count.
    pub min: u32,
    /// Largest count.
    pub max: u32,
}

impl Histogram {
    /// An all-zero histogram.
    pub fn new(width: usize, height: usize) -> Histogram {
        Histogram {
            width,
            height,
            counts: vec![0u32; width * height],
        }
    }

    /// Wrap existing counts, which must number exactly `width * height`.
    pub fn from_counts(width: usize, height: usize, counts: Vec<u32>) -> Result<Histogram> {
        if counts.len() != width * height {
            return Err(FlameError::InvalidArgument(format!(
                "{} counts cannot fill a {}x{} histogram",
                counts.len(),
                width,
                height
            )));
        }
        Ok(Histogram {
            width,
            height,
            counts,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The counts, row-major, row 0 first.
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Give up the counts.
    pub fn into_counts(self) -> Vec<u32> {
        self.counts
    }

    /// The count at column `x`, row `y`.
    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x < self.width && y < self.height {
            Some(self.counts[y * self.width + x])
        } else {
            None
        }
    }

    /// Count one visit.  Saturates rather than wrapping.
    #[inline]
    pub(crate) fn increment(&mut self, offset: usize) {
        let cell = &mut self.counts[offset];
        *cell = cell.saturating_add(1);
    }

    /// Add another histogram of the same shape into this one.
    pub fn merge(&mut self, other: &Histogram) -> Result<()> {
        if (self.width, self.height) != (other.width, other.height) {
            return Err(FlameError::InvalidArgument(format!(
                "cannot merge a {}x{} histogram into a {}x{} one",
                other.width, other.height, self.width, self.height
            )));
        }
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts.iter()) {
            *mine = mine.saturating_add(*theirs);
        }
        Ok(())
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }

    /// Total, minimum and maximum count.
    pub fn stats(&self) -> HistogramStats {
        let (min, max) = match self.counts.iter().minmax() {
            MinMaxResult::NoElements => (0, 0),
            MinMaxResult::OneElement(&c) => (c, c),
            MinMaxResult::MinMax(&lo, &hi) => (lo, hi),
        };
        HistogramStats {
            total: self.total(),
            min,
            max,
        }
    }

    /// Write the raw buffer format.
    pub fn write_raw<W: Write>(&self, mut out: W) -> io::Result<()> {
        let mut bytes = Vec::with_capacity(self.counts.len() * 4);
        for c in &self.counts {
            bytes.extend_from_slice(&c.to_ne_bytes());
        }
        out.write_all(&bytes)?;
        out.flush()
    }

    /// Read `width * height` counts in the raw buffer format.  Anything
    /// after them is left unread.
    pub fn read_raw<R: Read>(mut input: R, width: usize, height: usize) -> io::Result<Histogram> {
        let mut bytes = vec![0u8; width * height * 4];
        input.read_exact(&mut bytes)?;
        let counts = bytes
            .chunks_exact(4)
            .map(|b| u32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        Ok(Histogram {
            width,
            height,
            counts,
        })
    }
}
