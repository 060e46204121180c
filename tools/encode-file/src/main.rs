//! encode-file - Game data encode tool
//!
//! Writes an XOR-obfuscated copy of each matched file next to it, with an `x`
//! appended to the file name (`world.pak` -> `world.pakx`).

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use encode_file::{encode_patterns, format_key, generate_key, ENCODE_KEY};

#[derive(Parser)]
#[command(name = "encode-file")]
#[command(about = "Game data encode tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode files matching the given patterns (wildcards match recursively)
    Encode {
        /// Path patterns, e.g. data/levels/*.dat
        #[arg(required = true)]
        patterns: Vec<PathBuf>,
    },

    /// Print a new random key
    Generate,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    println!("Game data encode tool");
    println!();

    match cli.command {
        Commands::Encode { patterns } => {
            let written = encode_patterns(&patterns, &ENCODE_KEY)?;
            tracing::info!("Encoded {} file(s)", written.len());
        }
        Commands::Generate => {
            let key = generate_key(&mut rand::rng());
            println!("{}", format_key(&key));
        }
    }

    Ok(())
}
