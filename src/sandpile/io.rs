//! Layout files and plain-text window dumps

use super::error::{Result, SandpileError};
use super::window::LatticeWindow;
use anyhow::Context;
use std::path::Path;

/// Initial grain layout: `(x, y, grains)` triples inside a declared rectangle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub width: usize,
    pub length: usize,
    pub entries: Vec<(i64, i64, u64)>,
}

impl Layout {
    /// Materialize the starting window
    pub fn to_window(&self) -> Result<LatticeWindow> {
        LatticeWindow::from_layout(self.width, self.length, &self.entries)
    }
}

/// Parse a layout.
/// Format: one `x y grains` triple per line, whitespace separated.
/// Blank lines and lines starting with `#` are skipped.
pub fn parse_layout(content: &str, width: usize, length: usize) -> Result<Layout> {
    if width == 0 || length == 0 {
        return Err(SandpileError::InvalidDimensions { width, length });
    }

    let mut entries = Vec::new();
    for (line_idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let malformed = || SandpileError::MalformedEntry {
            line: line_idx + 1,
            content: line.to_string(),
        };

        let fields: Vec<&str> = line.split_whitespace().collect();
        let [x, y, grains] = fields.as_slice() else {
            return Err(malformed());
        };
        let x: i64 = x.parse().map_err(|_| malformed())?;
        let y: i64 = y.parse().map_err(|_| malformed())?;
        let grains: u64 = grains.parse().map_err(|_| malformed())?;

        if x < 0 || y < 0 || x >= width as i64 || y >= length as i64 {
            return Err(SandpileError::OutOfBounds { x, y, width, length });
        }
        entries.push((x, y, grains));
    }

    Ok(Layout { width, length, entries })
}

/// Load a layout from a text file
pub fn load_layout_from_file<P: AsRef<Path>>(path: P, width: usize, length: usize) -> anyhow::Result<Layout> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read layout file: {}", path.as_ref().display()))?;

    parse_layout(&content, width, length)
        .with_context(|| format!("Failed to parse layout from file: {}", path.as_ref().display()))
}

/// Render a window as text: a bounds header, then one row per line with
/// space-separated grain counts
pub fn window_to_string(window: &LatticeWindow) -> String {
    let bounds = window.bounds();
    let mut result = format!(
        "# bounds {} {} {} {}\n",
        bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y
    );

    for row in 0..window.height() {
        let line: Vec<String> = window.row(row).iter().map(u64::to_string).collect();
        result.push_str(&line.join(" "));
        result.push('\n');
    }

    result
}

/// Save a window to a text file
pub fn save_window_to_file<P: AsRef<Path>>(window: &LatticeWindow, path: P) -> anyhow::Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    std::fs::write(&path, window_to_string(window))
        .with_context(|| format!("Failed to write window to file: {}", path.as_ref().display()))?;

    Ok(())
}

/// Create example layout files for a 5x5 starting rectangle
pub fn create_example_layouts<P: AsRef<Path>>(output_dir: P) -> anyhow::Result<()> {
    let dir = output_dir.as_ref();
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    // Single large pile in the middle
    std::fs::write(dir.join("center_pile.txt"), "# x y grains\n2 2 1000\n")
        .context("Failed to write center_pile.txt")?;

    // Exactly one toppling
    std::fs::write(dir.join("single_topple.txt"), "2 2 4\n")
        .context("Failed to write single_topple.txt")?;

    // Four corners
    std::fs::write(dir.join("corners.txt"), "0 0 64\n4 0 64\n0 4 64\n4 4 64\n")
        .context("Failed to write corners.txt")?;

    // Already stable checkerboard
    let mut checker = String::new();
    for y in 0..5 {
        for x in 0..5 {
            if (x + y) % 2 == 0 {
                checker.push_str(&format!("{} {} 3\n", x, y));
            }
        }
    }
    std::fs::write(dir.join("stable_checker.txt"), checker)
        .context("Failed to write stable_checker.txt")?;

    Ok(())
}
