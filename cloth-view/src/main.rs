//! Application entry point for the interactive cloth viewer.
//!
//! This binary parses the command line, loads the simulation config,
//! sets up logging and eframe/egui, and delegates all interactive logic
//! and rendering to [`Viewer`] from the `viewer` module.

mod render;
mod viewer;

use anyhow::{Context, anyhow};
use clap::Parser;
use cloth_core::config::SimConfig;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use viewer::Viewer;

/// Interactive grid cloth simulation.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// TOML file with `SimConfig` fields; missing fields use defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid resolution N (overrides the config file).
    #[arg(long)]
    resolution: Option<usize>,
}

fn load_config(path: Option<&Path>, resolution: Option<usize>) -> anyhow::Result<SimConfig> {
    let mut cfg = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            toml::from_str::<SimConfig>(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => SimConfig::default(),
    };
    if let Some(n) = resolution {
        cfg.resolution = n;
    }
    cfg.validate().context("invalid simulation config")?;
    Ok(cfg)
}

/// Starts the native eframe application.
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if the config is invalid or eframe fails to create the native
///   window or event loop.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_deref(), cli.resolution)?;
    tracing::info!(resolution = cfg.resolution, "starting cloth viewer");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1000.0, 750.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Cloth",
        options,
        Box::new(move |_cc| Ok(Box::new(Viewer::new(cfg)?))),
    )
    .map_err(|err| anyhow!("eframe failed: {err}"))
}
