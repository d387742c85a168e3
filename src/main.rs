mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Args;
use history_drill::driller::{AnalysisReport, DrillingEngine};
use history_drill::error::DrillError;
use history_drill::export::{Catalog, ParquetSink};
use history_drill::paths::PlatformPaths;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Exit code used when the run is interrupted with Ctrl-C
const EXIT_CANCELLED: i32 = 130;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.load_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli::log_directive(&config))),
        )
        .with_writer(std::io::stderr)
        .init();
    let capabilities = config.extraction.capabilities()?;
    let output_dir = config.export.output_dir.clone();
    let sink = ParquetSink::new(&output_dir).with_compression(config.export.compression);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(spinner_style());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message(format!("Cloning {}...", config.repository.url));

    let write_catalog = config.export.write_catalog;
    let mut engine = tokio::task::spawn_blocking(move || -> Result<DrillingEngine, DrillError> {
        let mut engine = DrillingEngine::init(&config)?;
        for capability in capabilities {
            engine.append_capability(capability);
        }
        Ok(engine)
    })
    .await
    .context("Repository acquisition task failed")??;

    let token = engine.cancellation_token();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling analysis");
            token.cancel();
        }
    });

    let progress = spinner.clone();
    let run = tokio::task::spawn_blocking(move || {
        let report = engine.analyze(&sink, &mut |event| progress.set_message(event.to_string()));
        let datasets = engine.meta_infos(&sink);
        report.map(|report| (report, datasets))
    })
    .await
    .context("Analysis task failed")?;
    ctrl_c.abort();

    let (report, datasets) = match run {
        Ok(result) => result,
        Err(DrillError::Cancelled) => {
            spinner.abandon_with_message("Analysis cancelled, no datasets were written");
            std::process::exit(EXIT_CANCELLED);
        }
        Err(e) => {
            spinner.abandon_with_message("Analysis failed");
            return Err(e.into());
        }
    };
    spinner.finish_and_clear();

    if write_catalog {
        let catalog_path = PlatformPaths::catalog_path(&output_dir);
        Catalog::new(report.repository_name.clone(), datasets)
            .save(&catalog_path)
            .context("Failed to write catalog")?;
    }

    print_summary(&report, &output_dir.display().to_string());
    Ok(())
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn print_summary(report: &AnalysisReport, output_dir: &str) {
    println!(
        "Analyzed '{}': {} commits in {:.2?}",
        report.repository_name,
        report.commits_walked,
        Duration::from_millis(report.duration_ms)
    );
    for extractor in &report.extractors {
        println!(
            "  {:<18} {:>8} commits {:>6} skipped {:>10} files {:>10} rows",
            extractor.name,
            extractor.commits_visited,
            extractor.commits_skipped,
            extractor.files_processed,
            extractor.rows_exported
        );
    }
    println!("Datasets written to {}", output_dir);
}
