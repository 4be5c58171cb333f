//! Lattice coordinates and rectangular bounds

use serde::{Deserialize, Serialize};
use std::fmt;

/// A cell on the unbounded lattice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: i64,
    pub y: i64,
}

impl Coord {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// North, south, west and east neighbors (no diagonals)
    pub fn neighbors(self) -> [Coord; 4] {
        [
            Coord::new(self.x, self.y - 1),
            Coord::new(self.x, self.y + 1),
            Coord::new(self.x - 1, self.y),
            Coord::new(self.x + 1, self.y),
        ]
    }
}

/// Inclusive rectangle on the lattice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: i64,
    pub max_x: i64,
    pub min_y: i64,
    pub max_y: i64,
}

impl Bounds {
    pub fn new(min_x: i64, max_x: i64, min_y: i64, max_y: i64) -> Self {
        debug_assert!(min_x <= max_x && min_y <= max_y);
        Self { min_x, max_x, min_y, max_y }
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        (self.max_x - self.min_x + 1) as usize
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        (self.max_y - self.min_y + 1) as usize
    }

    pub fn area(&self) -> usize {
        self.width() * self.height()
    }

    pub fn contains(&self, coord: Coord) -> bool {
        (self.min_x..=self.max_x).contains(&coord.x) && (self.min_y..=self.max_y).contains(&coord.y)
    }

    /// Whether `other` lies entirely inside this rectangle
    pub fn encloses(&self, other: &Bounds) -> bool {
        self.min_x <= other.min_x
            && self.max_x >= other.max_x
            && self.min_y <= other.min_y
            && self.max_y >= other.max_y
    }

    /// Row-major offset of an in-bounds coordinate
    #[inline]
    pub fn offset(&self, coord: Coord) -> Option<usize> {
        if !self.contains(coord) {
            return None;
        }
        let row = (coord.y - self.min_y) as usize;
        let col = (coord.x - self.min_x) as usize;
        Some(row * self.width() + col)
    }

    /// Coordinate at a row-major offset
    #[inline]
    pub fn coord_at(&self, offset: usize) -> Coord {
        let width = self.width();
        Coord::new(
            self.min_x + (offset % width) as i64,
            self.min_y + (offset / width) as i64,
        )
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {})-({}, {})",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}
