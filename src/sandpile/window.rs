//! Dense rectangular window over the unbounded sandpile lattice

use super::coord::{Bounds, Coord};
use super::error::{Result, SandpileError};
use super::rules::SandpileRules;
use itertools::{Itertools, MinMaxResult};
use serde::Serialize;

/// Finite view of the lattice; every cell outside `bounds` holds zero grains
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LatticeWindow {
    bounds: Bounds,
    cells: Vec<u64>,
}

impl LatticeWindow {
    /// Create an all-zero window covering `bounds`
    pub fn zeroed(bounds: Bounds) -> Self {
        Self {
            bounds,
            cells: vec![0; bounds.area()],
        }
    }

    /// Build the tightest window containing every supplied coordinate.
    ///
    /// Zero-valued entries still widen the bounds. If a coordinate appears
    /// more than once the last entry wins.
    pub fn from_counts<I>(counts: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Coord, u64)>,
    {
        let counts: Vec<(Coord, u64)> = counts.into_iter().collect();

        let (min_x, max_x) = match counts.iter().map(|(c, _)| c.x).minmax() {
            MinMaxResult::NoElements => return Err(SandpileError::EmptyWindow),
            MinMaxResult::OneElement(x) => (x, x),
            MinMaxResult::MinMax(lo, hi) => (lo, hi),
        };
        let (min_y, max_y) = match counts.iter().map(|(c, _)| c.y).minmax() {
            MinMaxResult::NoElements => return Err(SandpileError::EmptyWindow),
            MinMaxResult::OneElement(y) => (y, y),
            MinMaxResult::MinMax(lo, hi) => (lo, hi),
        };

        let mut window = Self::zeroed(Bounds::new(min_x, max_x, min_y, max_y));
        for (coord, grains) in counts {
            let idx = window.index(coord);
            window.cells[idx] = grains;
        }
        Ok(window)
    }

    /// Build the starting window `(0,0)-(width-1,length-1)` from layout triples
    pub fn from_layout(width: usize, length: usize, entries: &[(i64, i64, u64)]) -> Result<Self> {
        if width == 0 || length == 0 {
            return Err(SandpileError::InvalidDimensions { width, length });
        }

        let mut window = Self::zeroed(Bounds::new(0, width as i64 - 1, 0, length as i64 - 1));
        for &(x, y, grains) in entries {
            let offset = window
                .bounds
                .offset(Coord::new(x, y))
                .ok_or(SandpileError::OutOfBounds { x, y, width, length })?;
            window.cells[offset] = grains;
        }
        Ok(window)
    }

    #[inline]
    fn index(&self, coord: Coord) -> usize {
        let row = (coord.y - self.bounds.min_y) as usize;
        let col = (coord.x - self.bounds.min_x) as usize;
        row * self.bounds.width() + col
    }

    /// Grain count at `(x, y)`; zero outside the window
    pub fn get(&self, x: i64, y: i64) -> u64 {
        self.bounds
            .offset(Coord::new(x, y))
            .map_or(0, |offset| self.cells[offset])
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn width(&self) -> usize {
        self.bounds.width()
    }

    pub fn height(&self) -> usize {
        self.bounds.height()
    }

    /// Raw row-major cell store
    pub fn cells(&self) -> &[u64] {
        &self.cells
    }

    /// Cells of one row, `row` counted from `min_y`
    pub fn row(&self, row: usize) -> &[u64] {
        let width = self.width();
        &self.cells[row * width..(row + 1) * width]
    }

    /// Iterate `(coord, grains)` in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (Coord, u64)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(offset, &grains)| (self.bounds.coord_at(offset), grains))
    }

    /// Sum of all grains; `u128` so the total itself cannot overflow
    pub fn total_grains(&self) -> u128 {
        self.cells.iter().map(|&g| g as u128).sum()
    }

    pub fn max_grains(&self) -> u64 {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    /// Number of cells at or above the toppling threshold
    pub fn unstable_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|&&g| SandpileRules::is_unstable(g))
            .count()
    }

    pub fn is_stable(&self) -> bool {
        self.unstable_count() == 0
    }
}
