//! Snapshot sinks for the stabilization driver

use crate::config::OutputFormat;
use crate::sandpile::{window_to_string, LatticeWindow, SnapshotSink};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes each snapshot as `iter_<n>.<ext>` into a directory
#[derive(Debug, Clone)]
pub struct DirectorySink {
    output_dir: PathBuf,
    format: OutputFormat,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    /// Create the sink, creating the output directory if needed
    pub fn new<P: AsRef<Path>>(output_dir: P, format: OutputFormat) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;

        Ok(Self {
            output_dir,
            format,
            written: Vec::new(),
        })
    }

    pub fn snapshot_path(&self, iteration: u64) -> PathBuf {
        self.output_dir
            .join(format!("iter_{}.{}", iteration, self.format.extension()))
    }

    /// Files written so far, in emission order
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl SnapshotSink for DirectorySink {
    fn emit(&mut self, iteration: u64, window: &LatticeWindow) -> Result<()> {
        let path = self.snapshot_path(iteration);
        let content = match self.format {
            OutputFormat::Text => window_to_string(window),
            OutputFormat::Json => serde_json::to_string_pretty(window)
                .context("Failed to serialize window")?,
        };

        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write snapshot: {}", path.display()))?;

        debug!(iteration, path = %path.display(), "snapshot written");
        self.written.push(path);
        Ok(())
    }
}

/// Keeps every emitted snapshot in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub snapshots: Vec<(u64, LatticeWindow)>,
}

impl MemorySink {
    pub fn iterations(&self) -> Vec<u64> {
        self.snapshots.iter().map(|(iteration, _)| *iteration).collect()
    }
}

impl SnapshotSink for MemorySink {
    fn emit(&mut self, iteration: u64, window: &LatticeWindow) -> Result<()> {
        self.snapshots.push((iteration, window.clone()));
        Ok(())
    }
}

/// Discards snapshots
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl SnapshotSink for NullSink {
    fn emit(&mut self, _iteration: u64, _window: &LatticeWindow) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandpile::{DriverState, StabilizationDriver};
    use tempfile::tempdir;

    #[test]
    fn test_directory_sink_text() {
        let temp_dir = tempdir().unwrap();
        let out = temp_dir.path().join("snapshots");
        let mut sink = DirectorySink::new(&out, OutputFormat::Text).unwrap();

        let window = LatticeWindow::from_layout(3, 3, &[(1, 1, 4)]).unwrap();
        let outcome = StabilizationDriver::new(window, 10, 1).run(&mut sink).unwrap();
        assert_eq!(outcome.state, DriverState::Stable);

        assert_eq!(sink.written(), &[out.join("iter_0.txt"), out.join("iter_1.txt")]);
        let last = std::fs::read_to_string(out.join("iter_1.txt")).unwrap();
        assert_eq!(last, "# bounds 0 0 2 2\n0 1 0\n1 0 1\n0 1 0\n");
    }

    #[test]
    fn test_directory_sink_json() {
        let temp_dir = tempdir().unwrap();
        let mut sink = DirectorySink::new(temp_dir.path(), OutputFormat::Json).unwrap();

        let window = LatticeWindow::from_layout(1, 1, &[(0, 0, 4)]).unwrap();
        sink.emit(7, &window).unwrap();

        let json = std::fs::read_to_string(temp_dir.path().join("iter_7.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["bounds"]["min_x"], 0);
        assert_eq!(value["cells"][0], 4);
    }

    #[test]
    fn test_memory_sink_final_only() {
        let mut sink = MemorySink::default();
        let window = LatticeWindow::from_layout(1, 1, &[(0, 0, 30)]).unwrap();
        let outcome = StabilizationDriver::new(window, 1_000, 0).run(&mut sink).unwrap();

        assert_eq!(sink.iterations(), vec![outcome.iterations]);
        assert_eq!(sink.snapshots[0].1, outcome.window);
    }

    #[test]
    fn test_null_sink() {
        let window = LatticeWindow::from_layout(2, 2, &[(0, 0, 9)]).unwrap();
        let outcome = StabilizationDriver::new(window, 3, 1).run(&mut NullSink).unwrap();
        assert_eq!(outcome.sink_failures, 0);
        assert!(outcome.snapshots_emitted > 0);
    }
}
