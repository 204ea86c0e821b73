//! Two-dimensional histograms over normalized coordinates.
//!
//! Both axes span `[0, 1]` with `bins` equal-width bins. Each bin is
//! half-open `[lo, hi)` except the last, which also takes `1.0`. Points
//! outside the unit square, or with NaN coordinates, are not counted.

use crate::error::BodymapError;
use crate::models::TouchPoint;

/// Bin counts over the unit square, indexed `[x_bin][y_bin]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram2d {
    bins: usize,
    counts: Vec<u32>,
}

impl Histogram2d {
    /// Bin the coordinates of `points`.
    pub fn compute<'a, I>(points: I, bins: usize) -> Result<Self, BodymapError>
    where
        I: IntoIterator<Item = &'a TouchPoint>,
    {
        Self::from_coords(points.into_iter().map(|p| (p.x_norm, p.y_norm)), bins)
    }

    /// Bin raw `(x, y)` pairs.
    pub fn from_coords<I>(coords: I, bins: usize) -> Result<Self, BodymapError>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        if bins == 0 {
            return Err(BodymapError::InvalidBinCount);
        }

        let edges = bin_edges(bins);
        let mut counts = vec![0u32; bins * bins];

        for (x, y) in coords {
            if let (Some(ix), Some(iy)) = (bin_index(&edges, x), bin_index(&edges, y)) {
                counts[ix * bins + iy] += 1;
            }
        }

        Ok(Self { bins, counts })
    }

    /// Bins per axis.
    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Count in bin `(ix, iy)`.
    pub fn get(&self, ix: usize, iy: usize) -> u32 {
        self.counts[ix * self.bins + iy]
    }

    /// Largest bin count, 0 for an empty histogram.
    pub fn max(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Number of points that landed in a bin.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }
}

/// Edges `i / bins` for `i` in `0..=bins`, last edge pinned to exactly 1.0.
fn bin_edges(bins: usize) -> Vec<f64> {
    let step = 1.0 / bins as f64;
    let mut edges: Vec<f64> = (0..=bins).map(|i| i as f64 * step).collect();
    edges[bins] = 1.0;
    edges
}

fn bin_index(edges: &[f64], value: f64) -> Option<usize> {
    let last = edges.len() - 1;
    if !(edges[0]..=edges[last]).contains(&value) {
        return None;
    }
    if value == edges[last] {
        return Some(last - 1);
    }
    // Number of edges <= value, minus one.
    Some(edges.partition_point(|&edge| edge <= value) - 1)
}
