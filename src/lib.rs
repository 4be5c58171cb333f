//! Abelian Sandpile Simulator
//!
//! This library grows and topples sandpiles on an unbounded square lattice
//! and hands selected snapshots of the tracked window to a sink.

pub mod config;
pub mod output;
pub mod sandpile;
pub mod utils;

pub use config::Settings;
pub use sandpile::{DriverState, LatticeWindow, RunOutcome, SandpileRules, StabilizationDriver};

use anyhow::{Context, Result};
use output::DirectorySink;

/// Main entry point: load the layout named by `settings` and run it to completion,
/// writing snapshots into the configured output directory
pub fn run_simulation(settings: &Settings) -> Result<RunOutcome> {
    let params = settings.run_parameters();
    let layout = sandpile::load_layout_from_file(&settings.input.layout_file, params.width, params.length)?;
    let driver = StabilizationDriver::from_layout(&params, &layout.entries)
        .context("Failed to build the initial window")?;

    let mut sink = DirectorySink::new(&settings.output.output_directory, settings.output.format)?;
    driver.run(&mut sink).context("Simulation failed")
}
