//! Configuration settings for the sandpile simulator

use crate::sandpile::RunParameters;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub simulation: SimulationConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Height of the starting rectangle
    pub length: usize,
    /// Width of the starting rectangle
    pub width: usize,
    pub max_iterations: u64,
    /// Snapshot every `freq` iterations; 0 writes only the final window
    pub freq: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub layout_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub output_directory: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig {
                length: 5,
                width: 5,
                max_iterations: 10_000,
                freq: 0,
            },
            input: InputConfig {
                layout_file: PathBuf::from("input/layouts/center_pile.txt"),
            },
            output: OutputConfig {
                format: OutputFormat::Text,
                output_directory: PathBuf::from("output/snapshots"),
            },
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Settings = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(settings)
    }

    /// Save settings to a YAML file
    pub fn to_file(&self, path: &PathBuf) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .context("Failed to serialize settings")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if self.simulation.length == 0 {
            anyhow::bail!("Initial length must be positive");
        }

        if self.simulation.width == 0 {
            anyhow::bail!("Initial width must be positive");
        }

        if !self.input.layout_file.exists() {
            anyhow::bail!("Layout file does not exist: {}", self.input.layout_file.display());
        }

        Ok(())
    }

    /// Merge settings with command line overrides
    pub fn merge_with_cli(&mut self, cli_overrides: &CliOverrides) {
        if let Some(length) = cli_overrides.length {
            self.simulation.length = length;
        }
        if let Some(width) = cli_overrides.width {
            self.simulation.width = width;
        }
        if let Some(max_iterations) = cli_overrides.max_iterations {
            self.simulation.max_iterations = max_iterations;
        }
        if let Some(freq) = cli_overrides.freq {
            self.simulation.freq = freq;
        }
        if let Some(ref layout_file) = cli_overrides.layout_file {
            self.input.layout_file = layout_file.clone();
        }
        if let Some(ref output_dir) = cli_overrides.output_dir {
            self.output.output_directory = output_dir.clone();
        }
        if let Some(format) = cli_overrides.format {
            self.output.format = format;
        }
    }

    /// Parameters handed to the stabilization driver
    pub fn run_parameters(&self) -> RunParameters {
        RunParameters {
            length: self.simulation.length,
            width: self.simulation.width,
            max_iterations: self.simulation.max_iterations,
            freq: self.simulation.freq,
        }
    }
}

/// Command line overrides for settings
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub length: Option<usize>,
    pub width: Option<usize>,
    pub max_iterations: Option<u64>,
    pub freq: Option<u64>,
    pub layout_file: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub format: Option<OutputFormat>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_yaml_round_trip_through_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config/default.yaml");

        let mut settings = Settings::default();
        settings.simulation.freq = 25;
        settings.output.format = OutputFormat::Json;
        settings.to_file(&path).unwrap();

        let loaded = Settings::from_file(&path).unwrap();
        assert_eq!(loaded.simulation.freq, 25);
        assert_eq!(loaded.output.format, OutputFormat::Json);
        assert_eq!(loaded.simulation.length, 5);
    }

    #[test]
    fn test_parse_yaml_snippet() {
        let yaml = r#"
simulation:
  length: 3
  width: 4
  max_iterations: 50
  freq: 10
input:
  layout_file: seeds/one.txt
output:
  format: text
  output_directory: out
"#;
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        let params = settings.run_parameters();
        assert_eq!(params.length, 3);
        assert_eq!(params.width, 4);
        assert_eq!(params.max_iterations, 50);
        assert_eq!(params.freq, 10);
    }

    #[test]
    fn test_validate() {
        let temp_dir = tempdir().unwrap();
        let layout = temp_dir.path().join("layout.txt");
        std::fs::write(&layout, "0 0 4\n").unwrap();

        let mut settings = Settings::default();
        settings.input.layout_file = layout;
        assert!(settings.validate().is_ok());

        settings.simulation.width = 0;
        assert!(settings.validate().is_err());

        settings.simulation.width = 5;
        settings.input.layout_file = temp_dir.path().join("missing.txt");
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_merge_with_cli() {
        let mut settings = Settings::default();
        settings.merge_with_cli(&CliOverrides {
            length: Some(9),
            freq: Some(2),
            output_dir: Some(PathBuf::from("elsewhere")),
            ..Default::default()
        });

        assert_eq!(settings.simulation.length, 9);
        assert_eq!(settings.simulation.width, 5);
        assert_eq!(settings.simulation.freq, 2);
        assert_eq!(settings.output.output_directory, PathBuf::from("elsewhere"));
        assert_eq!(settings.output.format, OutputFormat::Text);
    }
}
