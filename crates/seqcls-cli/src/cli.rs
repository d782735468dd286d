//! Command-line arguments

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "seqcls")]
#[command(about = "Batch sequence classification with BERT models", long_about = None)]
pub struct Cli {
    /// Run configuration file path
    #[arg(short, long, default_value = "config.yaml", env = "SEQCLS_CONFIG")]
    pub config: PathBuf,

    /// Input JSON-lines file (overrides data.input_path)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output JSON-lines file (overrides data.output_path)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Device to run on: cpu, cuda[:N], metal[:N]
    #[arg(short, long)]
    pub device: Option<String>,

    /// Number of items per forward pass
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
