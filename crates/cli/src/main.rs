use clap::Parser;
use rebound_config::ConfigLoader;
use std::path::PathBuf;

mod commands;
mod simulate;

use commands::Commands;

#[derive(Parser)]
#[command(name = "rebound")]
#[command(about = "Retry and circuit breaker toolkit", long_about = None)]
#[command(version)]
struct Cli {
    /// Settings file (defaults to $REBOUND_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level override (error, warn, info, debug, trace, off)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.path(path);
    }
    let settings = loader.load()?;

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| settings.log_level().to_string());
    rebound_utils::tracing::init(&level)
        .map_err(|e| eyre::eyre!("failed to initialise logging: {e}"))?;

    cli.command.execute(&settings).await
}
