//! CLI command handlers.

mod commands;
mod generate;

pub use commands::{Cli, Commands, GenerateArgs};
pub use generate::{list_presets, run_generate};
