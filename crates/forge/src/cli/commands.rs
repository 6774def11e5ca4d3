//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Narrative Forge - turn a photo and a short story into a comic
#[derive(Parser, Debug)]
#[command(name = "forge")]
#[command(
    about = "Turn a photo and a short narrative into illustrated, narrated comics",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the built-in story presets
    Presets,

    /// Generate a story and its exports
    Generate(GenerateArgs),
}

/// Arguments of `forge generate`
#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    /// Reference photo of the main character
    #[arg(long)]
    pub image: PathBuf,

    /// Main character description (defaults to the preset's or the stock persona)
    #[arg(long)]
    pub persona: Option<String>,

    /// File with one story beat per line
    #[arg(long, conflicts_with = "preset")]
    pub narrative: Option<PathBuf>,

    /// Built-in story to use (see `forge presets`)
    #[arg(long)]
    pub preset: Option<String>,

    /// Output directory
    #[arg(long, default_value = "forge-out")]
    pub out: PathBuf,

    /// Export an animated GIF
    #[arg(long)]
    pub gif: bool,

    /// Export a captioned print sheet
    #[arg(long)]
    pub sheet: bool,

    /// Export a narrated MP4 (requires ffmpeg)
    #[arg(long)]
    pub video: bool,

    /// Configuration file replacing the default lookup
    #[arg(long)]
    pub config: Option<PathBuf>,
}
