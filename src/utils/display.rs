//! Display and output formatting utilities

use crate::sandpile::{LatticeWindow, RunOutcome};

/// Format windows and run results for the console
pub struct WindowFormatter;

impl WindowFormatter {
    /// Shade for a grain count; everything at or above threshold is solid
    pub fn glyph(grains: u64) -> char {
        match grains {
            0 => '·',
            1 => '░',
            2 => '▒',
            3 => '▓',
            _ => '█',
        }
    }

    /// Format a window in compact form
    pub fn format_window_compact(window: &LatticeWindow) -> String {
        let mut output = String::with_capacity(window.height() * (window.width() + 1));
        for row in 0..window.height() {
            output.extend(window.row(row).iter().map(|&g| Self::glyph(g)));
            output.push('\n');
        }
        output
    }

    /// Format a window with lattice coordinates along the edges
    pub fn format_window_with_coords(window: &LatticeWindow) -> String {
        let bounds = window.bounds();
        let mut output = String::new();

        // Header with column numbers
        output.push_str("     ");
        for x in bounds.min_x..=bounds.max_x {
            output.push_str(&format!("{:2}", x.rem_euclid(10)));
        }
        output.push('\n');

        // Rows with row numbers
        for (row, y) in (bounds.min_y..=bounds.max_y).enumerate() {
            output.push_str(&format!("{:4} ", y));
            for &grains in window.row(row) {
                let glyph = Self::glyph(grains);
                output.push(glyph);
                output.push(glyph);
            }
            output.push('\n');
        }

        output
    }

    /// Statistics block for a window
    pub fn format_window_stats(window: &LatticeWindow) -> String {
        let mut output = String::new();
        output.push_str(&format!("Bounds: {}\n", window.bounds()));
        output.push_str(&format!("Size: {}x{}\n", window.width(), window.height()));
        output.push_str(&format!("Total grains: {}\n", window.total_grains()));
        output.push_str(&format!("Tallest pile: {}\n", window.max_grains()));
        output.push_str(&format!("Unstable cells: {}\n", window.unstable_count()));
        output
    }

    /// Summary of a finished run
    pub fn format_outcome(outcome: &RunOutcome) -> String {
        let mut output = String::new();
        output.push_str(&format!("Terminal state: {}\n", outcome.state));
        output.push_str(&format!("Iterations: {}\n", outcome.iterations));
        output.push_str(&format!("Snapshots written: {}\n", outcome.snapshots_emitted));
        if outcome.sink_failures > 0 {
            output.push_str(&format!("Snapshot failures: {}\n", outcome.sink_failures));
        }
        output.push_str(&Self::format_window_stats(&outcome.window));
        output
    }
}

/// Color output utilities
pub struct ColorOutput;

impl ColorOutput {
    /// Format text with color (if terminal supports it)
    pub fn colored(text: &str, color: Color) -> String {
        if Self::supports_color() {
            format!("\x1b[{}m{}\x1b[0m", color.code(), text)
        } else {
            text.to_string()
        }
    }

    /// Check if terminal supports color
    fn supports_color() -> bool {
        std::env::var("NO_COLOR").is_err() &&
        (std::env::var("TERM").unwrap_or_default() != "dumb")
    }

    /// Format success message
    pub fn success(text: &str) -> String {
        Self::colored(text, Color::Green)
    }

    /// Format error message
    pub fn error(text: &str) -> String {
        Self::colored(text, Color::Red)
    }

    /// Format warning message
    pub fn warning(text: &str) -> String {
        Self::colored(text, Color::Yellow)
    }

    /// Format info message
    pub fn info(text: &str) -> String {
        Self::colored(text, Color::Blue)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
}

impl Color {
    fn code(self) -> u8 {
        match self {
            Color::Red => 31,
            Color::Green => 32,
            Color::Yellow => 33,
            Color::Blue => 34,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandpile::SandpileRules;

    #[test]
    fn test_window_formatting() {
        let window = LatticeWindow::from_layout(3, 2, &[(0, 0, 1), (2, 1, 7)]).unwrap();

        let compact = WindowFormatter::format_window_compact(&window);
        assert_eq!(compact, "░··\n··█\n");

        let with_coords = WindowFormatter::format_window_with_coords(&window);
        assert!(with_coords.contains(" 0 1 2"));
        assert!(with_coords.contains("░░····"));
    }

    #[test]
    fn test_coords_after_growth() {
        let window = LatticeWindow::from_layout(1, 1, &[(0, 0, 4)]).unwrap();
        let grown = SandpileRules::topple(&window).unwrap().window;

        let with_coords = WindowFormatter::format_window_with_coords(&grown);
        assert!(with_coords.contains(" 9 0 1"));
        assert!(with_coords.lines().nth(1).unwrap().starts_with("  -1 "));
    }

    #[test]
    fn test_window_stats() {
        let window = LatticeWindow::from_layout(2, 2, &[(0, 0, 5), (1, 1, 2)]).unwrap();
        let stats = WindowFormatter::format_window_stats(&window);
        assert!(stats.contains("Total grains: 7"));
        assert!(stats.contains("Tallest pile: 5"));
        assert!(stats.contains("Unstable cells: 1"));
    }

    #[test]
    fn test_color_output() {
        let colored = ColorOutput::colored("test", Color::Red);
        // Should either be colored or plain text
        assert!(colored.contains("test"));

        let success = ColorOutput::success("OK");
        assert!(success.contains("OK"));
    }
}
