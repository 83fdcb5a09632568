#![forbid(unsafe_code)]
//! ACP Engine Command Line Interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use acp_engine::commands::{
    execute_check, execute_expand, execute_parse, execute_vars, CheckOptions, ExpandOptions,
    ParseOptions, VarsOptions,
};
use acp_engine::Config;

#[derive(Parser)]
#[command(name = "acp-engine")]
#[command(about = "AI Context Protocol - Annotation parsing and variable resolution")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true, default_value = ".acp.config.json")]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse annotations in a single file
    Parse {
        /// File to parse
        file: PathBuf,

        /// Output as JSON (default: human-readable)
        #[arg(long)]
        json: bool,
    },

    /// Check annotations across a project
    Check {
        /// Root directory to check
        #[arg(default_value = ".")]
        root: PathBuf,
    },

    /// Expand variable references in text
    Expand {
        /// Text to expand (reads from stdin if not provided)
        text: Option<String>,

        /// Project root holding declaration sources
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },

    /// List available variables
    Vars {
        /// Project root holding declaration sources
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Output as JSON (default: human-readable)
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(&cli.config).unwrap_or_default();

    match cli.command {
        Commands::Parse { file, json } => execute_parse(ParseOptions { file, json }),
        Commands::Check { root } => execute_check(CheckOptions { root }, &config),
        Commands::Expand { text, root } => execute_expand(ExpandOptions { text, root }, &config),
        Commands::Vars { root, json } => execute_vars(VarsOptions { root, json }, &config),
    }
}
