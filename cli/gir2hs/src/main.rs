//! gir2hs CLI — Haskell FFI binding generation from `.gir.toml` metadata.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gir2hs", version, about = "Haskell FFI binding generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate Haskell binding modules from declaration files
    Generate {
        /// Input .gir.toml declaration files
        inputs: Vec<PathBuf>,
        /// Output directory (default: current directory)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Validate declaration files without generating anything
    Check {
        /// Input .gir.toml declaration files
        inputs: Vec<PathBuf>,
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate { inputs, out_dir } => {
            commands::generate::run(&inputs, out_dir.as_deref())
        }
        Commands::Check { inputs, json } => commands::check::run(&inputs, json),
    }
}
