//! Configuration management for the sandpile simulator

pub mod settings;

pub use settings::{CliOverrides, InputConfig, OutputConfig, OutputFormat, Settings, SimulationConfig};
