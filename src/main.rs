//! Main CLI application for the sandpile simulator

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sandpile_sim::{
    config::{CliOverrides, OutputFormat, Settings},
    run_simulation,
    sandpile::{create_example_layouts, load_layout_from_file, save_window_to_file, DriverState},
    utils::{ColorOutput, WindowFormatter},
};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sandpile_sim")]
#[command(about = "Abelian Sandpile Simulator")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Topple a layout until it is stable or the iteration budget runs out
    Run {
        /// Configuration file path
        #[arg(short, long, default_value = "config/default.yaml")]
        config: PathBuf,

        /// Initial height (overrides config)
        #[arg(short, long)]
        length: Option<usize>,

        /// Initial width (overrides config)
        #[arg(short, long)]
        width: Option<usize>,

        /// Layout file with `x y grains` lines (overrides config)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Snapshot directory (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Iteration budget (overrides config)
        #[arg(short, long = "max-iter")]
        max_iter: Option<u64>,

        /// Snapshot every N iterations, 0 for final only (overrides config)
        #[arg(short, long)]
        freq: Option<u64>,

        /// Snapshot file format (overrides config)
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Create example configuration and layout files
    Setup {
        /// Directory to create files in
        #[arg(short, long, default_value = ".")]
        directory: PathBuf,

        /// Force overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Show a layout's starting window and statistics
    Inspect {
        /// Configuration file path
        #[arg(short, long, default_value = "config/default.yaml")]
        config: PathBuf,

        /// Layout file (overrides config)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Also write the starting window as a text grid to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Run { verbose: true, .. });
    init_tracing(verbose);

    match cli.command {
        Commands::Run {
            config, length, width, input, output,
            max_iter, freq, format, verbose
        } => {
            let overrides = CliOverrides {
                length,
                width,
                max_iterations: max_iter,
                freq,
                layout_file: input,
                output_dir: output,
                format,
            };
            run_command(config, overrides, verbose)
        }
        Commands::Setup { directory, force } => {
            setup_command(directory, force)
        }
        Commands::Inspect { config, input, output } => {
            inspect_command(config, input, output)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_settings(config_path: &PathBuf) -> Result<Settings> {
    if config_path.exists() {
        Settings::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))
    } else {
        println!("{}", ColorOutput::warning(&format!(
            "Config file {} not found, using defaults", config_path.display()
        )));
        Ok(Settings::default())
    }
}

fn run_command(config_path: PathBuf, overrides: CliOverrides, verbose: bool) -> Result<()> {
    println!("{}", ColorOutput::info("⏳ Starting sandpile simulation"));

    let mut settings = load_settings(&config_path)?;
    settings.merge_with_cli(&overrides);

    if verbose {
        println!("Configuration:");
        println!("  Initial size: {}x{}", settings.simulation.width, settings.simulation.length);
        println!("  Max iterations: {}", settings.simulation.max_iterations);
        println!("  Snapshot frequency: {}", settings.simulation.freq);
        println!("  Layout file: {}", settings.input.layout_file.display());
        println!("  Output dir: {}", settings.output.output_directory.display());
        println!();
    }

    settings.validate()
        .context("Configuration validation failed")?;

    let start_time = Instant::now();
    let outcome = run_simulation(&settings)?;
    let total_time = start_time.elapsed();

    match outcome.state {
        DriverState::Stable => println!("{}", ColorOutput::success(&format!(
            "✅ Stable after {} iteration(s) in {:.3}s",
            outcome.iterations,
            total_time.as_secs_f64()
        ))),
        _ => println!("{}", ColorOutput::warning(&format!(
            "⚠️  Iteration budget exhausted after {} iteration(s) in {:.3}s",
            outcome.iterations,
            total_time.as_secs_f64()
        ))),
    }

    println!("\n{}", WindowFormatter::format_outcome(&outcome));

    if outcome.sink_failures > 0 {
        println!("{}", ColorOutput::error(&format!(
            "❌ {} snapshot(s) could not be written", outcome.sink_failures
        )));
    }

    println!("{}", ColorOutput::success(&format!(
        "Snapshots saved to {}",
        settings.output.output_directory.display()
    )));

    Ok(())
}

fn setup_command(directory: PathBuf, force: bool) -> Result<()> {
    println!("{}", ColorOutput::info("🛠️  Setting up project structure..."));

    let config_dir = directory.join("config");
    let input_dir = directory.join("input/layouts");
    let output_dir = directory.join("output/snapshots");

    for dir in [&config_dir, &input_dir, &output_dir] {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    let config_path = config_dir.join("default.yaml");
    if !config_path.exists() || force {
        Settings::default().to_file(&config_path)
            .context("Failed to create default configuration")?;
        println!("Created: {}", config_path.display());
    } else {
        println!("Skipped: {} (already exists)", config_path.display());
    }

    create_example_layouts(&input_dir)
        .context("Failed to create example layouts")?;
    println!("Created example layouts in: {}", input_dir.display());

    let examples_dir = config_dir.join("examples");
    std::fs::create_dir_all(&examples_dir)?;

    // Snapshot every 50 iterations
    let mut periodic = Settings::default();
    periodic.simulation.freq = 50;
    periodic.to_file(&examples_dir.join("periodic.yaml"))?;

    // Four corner piles written as JSON
    let mut corners = Settings::default();
    corners.input.layout_file = PathBuf::from("input/layouts/corners.txt");
    corners.output.format = OutputFormat::Json;
    corners.to_file(&examples_dir.join("corners.yaml"))?;

    println!("Created example configurations in: {}", examples_dir.display());

    println!("\n{}", ColorOutput::success("✅ Setup complete!"));
    println!("\nNext steps:");
    println!("1. Edit configuration files in {}", config_dir.display());
    println!("2. Add your layouts to {}", input_dir.display());
    println!("3. Run: cargo run -- run --config config/default.yaml");

    Ok(())
}

fn inspect_command(config_path: PathBuf, input: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    println!("{}", ColorOutput::info("🔬 Inspecting layout..."));

    let mut settings = load_settings(&config_path)?;
    settings.merge_with_cli(&CliOverrides {
        layout_file: input,
        ..Default::default()
    });

    let layout = load_layout_from_file(
        &settings.input.layout_file,
        settings.simulation.width,
        settings.simulation.length,
    )?;
    let window = layout.to_window()
        .context("Failed to build the initial window")?;

    println!("Layout {} ({} entries):", settings.input.layout_file.display(), layout.entries.len());
    println!("{}", WindowFormatter::format_window_with_coords(&window));
    println!("{}", WindowFormatter::format_window_stats(&window));

    if window.is_stable() {
        println!("{}", ColorOutput::success("Layout is already stable"));
    }

    if let Some(path) = output {
        save_window_to_file(&window, &path)?;
        println!("Saved starting window to {}", path.display());
    }

    Ok(())
}
