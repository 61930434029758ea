//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// snapsmith - generate snap metadata from a primed build
#[derive(Parser)]
#[command(name = "snapsmith")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write prime/meta/ (snap.yaml, wrappers, hooks, GUI assets)
    Meta(MetaArgs),

    /// Show the metadata an extractor finds in a file
    Extract(ExtractArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct MetaArgs {
    /// Project directory (defaults to the current directory)
    #[arg(long, short = 'C')]
    pub project: Option<PathBuf>,

    /// Prime directory (defaults to <project>/prime)
    #[arg(long, env = "SNAPSMITH_PRIME_DIR")]
    pub prime: Option<PathBuf>,

    /// Stage directory (defaults to <project>/stage)
    #[arg(long)]
    pub stage: Option<PathBuf>,

    /// Parts directory (defaults to <project>/parts)
    #[arg(long)]
    pub parts: Option<PathBuf>,

    /// Runner policy: auto, always or never
    #[arg(long)]
    pub runner: Option<String>,

    /// Architecture used when the project declares none
    #[arg(long)]
    pub arch: Option<String>,

    /// Version set by the adopted part
    #[arg(long)]
    pub set_version: Option<String>,

    /// Grade set by the adopted part
    #[arg(long)]
    pub set_grade: Option<String>,

    /// Runtime environment line for wrappers (repeatable)
    #[arg(long = "env", value_name = "LINE")]
    pub environment: Vec<String>,
}

#[derive(Args)]
pub struct ExtractArgs {
    /// File to extract metadata from
    pub file: PathBuf,

    /// Directory extracted paths are made relative to (defaults to the file's directory)
    #[arg(long)]
    pub workdir: Option<PathBuf>,

    /// Print JSON instead of YAML
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
