//! Abelian sandpile core

pub mod coord;
pub mod driver;
pub mod error;
pub mod io;
pub mod rules;
pub mod window;

pub use coord::{Bounds, Coord};
pub use driver::{should_emit, DriverState, RunOutcome, RunParameters, SnapshotSink, StabilizationDriver};
pub use error::{Result, SandpileError};
pub use io::{create_example_layouts, load_layout_from_file, parse_layout, save_window_to_file, window_to_string, Layout};
pub use rules::{SandpileRules, ToppleOutcome};
pub use window::LatticeWindow;
