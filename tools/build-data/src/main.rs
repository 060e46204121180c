//! build-data - Game data build tool
//!
//! Runs a command script that stages raw assets from a source tree into an
//! output tree, copying files and transcoding audio to Ogg Vorbis. Files whose
//! outputs are already current are skipped.
//!
//! # Script
//!
//! ```text
//! # textures
//! copy tex/*.png tex
//! wave-to-ogg sfx/*.wav sfx
//! wave-to-ogg-mono "voice/intro lines/*.wav" voice   // down-mixed
//! mp3-to-ogg music/*.mp3 music
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use build_data::{validate_source, BuildConfig, Interpreter, SystemRunner, ToolSettings};

#[derive(Parser)]
#[command(name = "build-data")]
#[command(about = "Game data build tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a build script
    Build {
        /// Command script to run
        script: PathBuf,

        /// Source root that wildcards are resolved against
        source: PathBuf,

        /// Output root that built files are written below
        output: PathBuf,

        /// Directory containing the encoder binaries (defaults to this executable's directory)
        #[arg(short, long)]
        tools: Option<PathBuf>,

        /// TOML file overriding encoder names and quality
        #[arg(short, long)]
        settings: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate a script without building
    Check {
        /// Command script to check
        script: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Build { verbose: true, .. });
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match cli.command {
        Commands::Build {
            script,
            source,
            output,
            tools,
            settings,
            verbose: _,
        } => build(script, source, output, tools, settings.as_deref()),
        Commands::Check { script } => check(&script),
    }
}

fn build(
    script: PathBuf,
    source: PathBuf,
    output: PathBuf,
    tools: Option<PathBuf>,
    settings: Option<&Path>,
) -> Result<()> {
    println!("Game data build tool");
    println!();

    let tools_root = match tools {
        Some(dir) => dir,
        None => default_tools_root()?,
    };
    let tool_settings = match settings {
        Some(path) => ToolSettings::load(path)?,
        None => ToolSettings::default(),
    };

    if !output.is_dir() {
        std::fs::create_dir_all(&output)
            .with_context(|| format!("Failed to create output directory: {}", output.display()))?;
    }

    println!("ConfigFile: {}", script.display());
    println!("SourcePath: {}", source.display());
    println!("OutputPath: {}", output.display());
    println!();

    let config = BuildConfig::new(script, source, output, tools_root).with_tools(tool_settings);
    tracing::debug!("Tools directory: {}", config.tools_root.display());

    let interpreter = Interpreter::new(&config, SystemRunner);
    let report = interpreter.run_script()?;

    tracing::debug!(
        "{} rebuilt, {} up to date, {} failed command(s)",
        report.rebuilt_count(),
        report.up_to_date_count(),
        report.failed_count()
    );

    Ok(())
}

fn check(script: &Path) -> Result<()> {
    tracing::info!("Checking script {:?}", script);
    let text = std::fs::read_to_string(script)
        .with_context(|| format!("Failed to read script: {}", script.display()))?;

    let issues = validate_source(&text);
    if issues.is_empty() {
        tracing::info!("Script is valid!");
        return Ok(());
    }

    for issue in &issues {
        eprintln!("  line {}: {}", issue.line, issue.error);
    }
    anyhow::bail!("{} invalid command(s) in {}", issues.len(), script.display())
}

/// Directory holding the running executable, where bundled encoders live
fn default_tools_root() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to locate build-data executable")?;
    Ok(exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}
