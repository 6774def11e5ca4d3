//! Narrative Forge CLI binary.
//!
//! - List the built-in story presets
//! - Generate panels from a photo and a narrative, with GIF, print sheet
//!   and narrated video exports

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use cli::{Cli, Commands, list_presets, run_generate};

    // Load API keys from .env
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Presets => list_presets(),
        Commands::Generate(args) => run_generate(args).await?,
    }

    Ok(())
}
