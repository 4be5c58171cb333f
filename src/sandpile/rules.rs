//! Toppling rule for the Abelian sandpile

use super::coord::Coord;
use super::error::{Result, SandpileError};
use super::window::LatticeWindow;
use rayon::prelude::*;
use std::collections::HashMap;

/// Result of one synchronous update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToppleOutcome {
    pub window: LatticeWindow,
    /// Whether any cell of the input window was at or above threshold
    pub toppled: bool,
}

/// Grains accumulated per coordinate during a single step
#[derive(Debug, Default)]
struct Contributions {
    grains: HashMap<Coord, u64>,
    toppled: bool,
}

impl Contributions {
    fn add(&mut self, coord: Coord, amount: u64) -> Result<()> {
        let slot = self.grains.entry(coord).or_insert(0);
        *slot = slot
            .checked_add(amount)
            .ok_or(SandpileError::GrainOverflow { x: coord.x, y: coord.y })?;
        Ok(())
    }

    /// Fold the contributions of one cell
    fn push_cell(&mut self, coord: Coord, grains: u64) -> Result<()> {
        if SandpileRules::is_unstable(grains) {
            self.toppled = true;
            self.add(coord, grains - SandpileRules::THRESHOLD)?;
            for neighbor in coord.neighbors() {
                self.add(neighbor, 1)?;
            }
        } else {
            self.add(coord, grains)?;
        }
        Ok(())
    }

    fn merge(self, other: Self) -> Result<Self> {
        let (mut larger, smaller) = if self.grains.len() >= other.grains.len() {
            (self, other)
        } else {
            (other, self)
        };
        larger.toppled |= smaller.toppled;
        for (coord, grains) in smaller.grains {
            larger.add(coord, grains)?;
        }
        Ok(larger)
    }

    fn into_outcome(self) -> Result<ToppleOutcome> {
        Ok(ToppleOutcome {
            toppled: self.toppled,
            window: LatticeWindow::from_counts(self.grains)?,
        })
    }
}

/// Sandpile rules engine
pub struct SandpileRules;

impl SandpileRules {
    /// Grains at which a cell topples; also the number of neighbors it feeds
    pub const THRESHOLD: u64 = 4;

    pub fn is_unstable(grains: u64) -> bool {
        grains >= Self::THRESHOLD
    }

    /// Apply one synchronous toppling step to the whole window.
    ///
    /// Every cell reads the previous window only. Rows are scanned in
    /// parallel and their contributions merged by addition, which commutes,
    /// so the result matches [`SandpileRules::topple_sequential`] exactly.
    pub fn topple(current: &LatticeWindow) -> Result<ToppleOutcome> {
        let bounds = current.bounds();
        let fold_row = |mut acc: Contributions, row: usize| -> Result<Contributions> {
            let y = bounds.min_y + row as i64;
            for (col, &grains) in current.row(row).iter().enumerate() {
                acc.push_cell(Coord::new(bounds.min_x + col as i64, y), grains)?;
            }
            Ok(acc)
        };

        (0..current.height())
            .into_par_iter()
            .try_fold(Contributions::default, fold_row)
            .try_reduce(Contributions::default, Contributions::merge)?
            .into_outcome()
    }

    /// Single-threaded reference implementation of [`SandpileRules::topple`]
    pub fn topple_sequential(current: &LatticeWindow) -> Result<ToppleOutcome> {
        let mut contributions = Contributions::default();
        for (coord, grains) in current.iter() {
            contributions.push_cell(coord, grains)?;
        }
        contributions.into_outcome()
    }
}
