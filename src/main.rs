//! Pandemic Dashboard - cumulative cases and deaths by country over time
//!
//! Loads a country-day dataset once, then answers every slider move with a fresh
//! per-location aggregation shown as a case map and two top-5 rankings.

mod charts;
mod cli;
mod config;
mod data;
mod gui;
mod logging;

use anyhow::{anyhow, Context, Result};
use charts::{format_count, StaticChartRenderer};
use clap::Parser;
use cli::Cli;
use config::DashboardConfig;
use data::{DataPipeline, DataSource};
use eframe::egui;
use gui::DashboardApp;
use std::path::Path;
use tracing::{info, warn};

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    let config = cli
        .resolve_config()
        .context("failed to load configuration")?;

    if let Some(path) = &cli.export {
        return export_snapshot(&config, path);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window_width, config.window_height])
            .with_min_inner_size([1000.0, 700.0])
            .with_title("Pandemic Dashboard"),
        ..Default::default()
    };

    eframe::run_native(
        "Pandemic Dashboard",
        options,
        Box::new(|cc| Ok(Box::new(DashboardApp::new(cc, config)))),
    )
    .map_err(|e| anyhow!("failed to start window: {e}"))
}

/// Headless mode: load, query at the configured cutoff, log the rankings, write a PNG.
fn export_snapshot(config: &DashboardConfig, path: &Path) -> Result<()> {
    let source = DataSource::parse(&config.source)?;
    let records = DataPipeline::load(&source, &config.load_options())
        .with_context(|| format!("failed to load {}", source))?;
    if records.timeline().is_empty() {
        warn!(source = %source, "dataset has no dated country records");
    }

    let cutoff = config.initial_cutoff.min(DataPipeline::max_time_key(&records));
    let result = DataPipeline::with_top_n(config.top_n).query(&records, i64::from(cutoff))?;
    let label = records.timeline().period_label(cutoff);

    info!(
        through = %label,
        cases = %format_count(result.total_cases()),
        deaths = %format_count(result.total_deaths()),
        "aggregated"
    );
    for (rank, totals) in result.top_cases.iter().enumerate() {
        info!(rank = rank + 1, location = %totals.location, cases = %format_count(totals.new_cases), "most cases");
    }
    for (rank, totals) in result.top_deaths.iter().enumerate() {
        info!(rank = rank + 1, location = %totals.location, deaths = %format_count(totals.new_deaths), "most deaths");
    }

    StaticChartRenderer::save_snapshot(&result, &label, config.color_scale_max, path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
