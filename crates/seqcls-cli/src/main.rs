//! seqcls
//!
//! Batch sequence classification over a JSON-lines file with a BERT model.

use anyhow::Result;
use clap::Parser;
use seqcls_cli::{logging, pipeline, Cli, RunConfig};
use seqcls_io::ProjectLayout;
use tracing::info;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration before logging: the log file lives in the run directory
    let config = RunConfig::load(&cli.config, &cli)?;
    let layout = ProjectLayout::init(
        &config.output_dir,
        &config.project_name,
        &config.group_name,
        &config.run_name,
    )?;

    let _guard = logging::init_tracing(cli.verbose, &config.log, &layout.cache_dir())?;

    info!("Starting seqcls {}", env!("CARGO_PKG_VERSION"));
    info!("Run directory: {}", layout.run_dir().display());
    info!("Task: {}", config.inference.task_type);
    info!("Device: {}", config.inference.device);
    info!("Batch size: {}", config.inference.batch_size);

    let summary = pipeline::run(&config, &layout)?;

    info!(
        "Done: {} items, predictions at {}, logits at {}",
        summary.items,
        summary.output_path.display(),
        summary.logits_path.display()
    );
    Ok(())
}
