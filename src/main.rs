//! CLI entry point for the wayback-mirror tool.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use wayback_mirror_core::MirrorEngine;

mod cli;
mod progress_ui;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Logs go to stderr so `--list` output stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let config = args.to_config()?;
    let engine = MirrorEngine::new(config);

    if args.list {
        let curated = engine.curate().await?;
        let json = serde_json::to_string_pretty(&curated.sorted())
            .context("failed to serialize curated entries")?;
        println!("{json}");
        return Ok(());
    }

    info!(
        site = %engine.config().target_site(),
        output = %engine.config().output_root().display(),
        "Downloading snapshots"
    );

    let (handle, progress) = engine.start();
    progress_ui::render(progress, args.quiet).await;
    let report = handle.wait().await?;

    if report.failed() > 0 {
        warn!(
            failed = report.failed(),
            total = report.total,
            "Some files could not be downloaded"
        );
    }
    info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        total = report.total,
        "Mirror complete"
    );

    Ok(())
}
