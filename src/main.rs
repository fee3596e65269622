// src/main.rs - Command-line entry point
use std::path::PathBuf;

use autoacc_rs::config::{self, load_table_config, Settings};
use autoacc_rs::{AccelerationTable, FileManager};
use clap::Parser;

/// Limit G-code feed rates to what the printer's acceleration table allows.
#[derive(Parser, Debug)]
#[command(name = "autoacc", version)]
struct Cli {
    /// G-code file to rewrite
    input: PathBuf,

    /// Path to a TOML settings file
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Acceleration table file (overrides the settings file)
    #[arg(short, long)]
    table: Option<PathBuf>,

    /// Output file (default: input name with the configured suffix)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print run statistics as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => config::load_settings(path),
        None => Ok(Settings::default()),
    };
    let (max_level, level_error) = match &settings {
        Ok(s) => s.logging.effective_level(cli.verbose),
        Err(_) if cli.verbose => (tracing::Level::DEBUG, None),
        Err(_) => (tracing::Level::INFO, None),
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(max_level)
        .with_writer(std::io::stderr)
        .init();

    if let Some(e) = level_error {
        tracing::warn!("{}, logging at {}", e, max_level);
    }

    let settings = settings.map_err(|e| {
        tracing::error!("Failed to load settings: {}", e);
        Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>
    })?;

    let table_path = cli.table.clone().unwrap_or_else(|| settings.table.path.clone());
    tracing::info!("Loading acceleration table from: {}", table_path.display());

    // The table must be usable before the input is touched.
    let table = load_table_config(&table_path)
        .and_then(|table_config| AccelerationTable::from_config(&table_config))
        .map_err(|e| {
            tracing::error!("Speed-acceleration pairs could not be read from '{}': {}", table_path.display(), e);
            Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>
        })?;
    tracing::info!(
        "{} samples, {} mode",
        table.samples().len(),
        if table.per_axis_mode() { "per-axis" } else { "joint" }
    );

    let file_manager = FileManager::new(&settings.output.suffix);
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| file_manager.output_path_for(&cli.input));

    let stats = file_manager
        .rewrite_file(&cli.input, &output, &table)
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>)?;

    tracing::info!("The G-code file was successfully created: {}", output.display());
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    }

    Ok(())
}
