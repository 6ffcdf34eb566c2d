// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod aggregation;
mod config;
mod reconciliation;
mod report;
mod report_sink;
mod timecard;
mod timecard_loader;

use config::{Cli, EnvConfig, ReportConfig};
use report_sink::FileViewer;

/// Load -> aggregate -> reconcile -> format -> save. Returns the written path.
fn run_report(config: &ReportConfig, viewer: &dyn FileViewer) -> Result<PathBuf> {
    let entries = timecard_loader::load_timecards(&config.input, config.delimiter)
        .with_context(|| format!("Loading timecards from {}", config.input.display()))?;

    let aggregation = aggregation::aggregate(&entries, config.week_ending);
    let weekly = reconciliation::reconcile(&aggregation.weekly, config.weekly_threshold);
    let rows = report::build_report(&aggregation, &weekly);
    info!(
        "Report built: {} employee-week rows (week ends on {:?}, threshold {}h)",
        rows.len(),
        config.week_ending.0,
        config.weekly_threshold
    );

    report_sink::save_report(&config.output, &rows, config.delimiter)
        .with_context(|| format!("Writing report to {}", config.output.display()))?;

    report_sink::open_report(viewer, &config.output);
    Ok(config.output.clone())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let env_config = EnvConfig::from_env().context("Reading OVERTIME_* environment")?;
    let config = ReportConfig::resolve(cli, env_config).context("Invalid configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded: {:?}", config);

    let viewer = report_sink::viewer_for(config.open_report);
    match run_report(&config, viewer.as_ref()) {
        Ok(path) => {
            println!("Timecard report output to: {}", path.display());
            Ok(())
        }
        Err(e) => {
            error!("Report generation failed: {:#}", e);
            Err(e)
        }
    }
}
