//! Chatbot metrics CLI - main entry point
//!
//! Runs one daily snapshot: fetch sources, aggregate, build records, and
//! insert the batch into the `chatbot_metrics` table.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use dotenvy::dotenv;
use tracing::error;

use chatbot_metrics::config::Config;
use chatbot_metrics::snapshot::{self, RunMode};

#[derive(Parser, Debug)]
#[command(name = "chatbot_metrics")]
#[command(about = "Daily per-chatbot analytics snapshot generator")]
#[command(version)]
struct Args {
    /// Path to config.yml (default: ./config.yml, falling back to env vars)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit the batch as JSON instead of inserting into MySQL
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Output file for --dry-run JSON (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::new(),
    };

    let mode = if args.dry_run {
        RunMode::DryRun {
            output: args.output.clone(),
        }
    } else {
        RunMode::Insert
    };

    if let Err(e) = snapshot::run(&config, mode).await {
        error!("Snapshot run failed: {}", e);
        return Err(e.into());
    }

    Ok(())
}
