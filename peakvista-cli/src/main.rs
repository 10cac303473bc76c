//! PeakVista CLI - Command-line interface
//!
//! Thin driver over the `peakvista` library: inspect tile selection, run a
//! one-shot view load, maintain the tile cache and edit the configuration
//! file.

mod commands;
mod error;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use peakvista::logging::{default_log_dir, init_logging};

use commands::cache::CacheAction;
use commands::config::ConfigCommands;
use commands::tiles::TilesArgs;
use commands::view::ViewArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "peakvista", author, version, about = "Progressive terrain from remote elevation tiles")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the tiles a viewpoint needs, in load order
    Tiles(TilesArgs),

    /// Load the terrain around a viewpoint once and report the result
    View(ViewArgs),

    /// Inspect and maintain the tile cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// View and modify configuration settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = match init_logging(&default_log_dir(), cli.verbose) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {}", e);
            None
        }
    };

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Tiles(args) => commands::tiles::run(args),
        Commands::View(args) => commands::view::run(args),
        Commands::Cache { action } => commands::cache::run(action),
        Commands::Config { command } => commands::config::run(command),
    }
}
