//! snapsmith CLI - snap metadata and packaging synthesis

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use snapsmith::meta::MetaError;
use snapsmith::util::diagnostic::emit;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        match e.downcast_ref::<MetaError>() {
            Some(meta) => emit(&meta.to_diagnostic(), std::io::stderr().is_terminal()),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("snapsmith=debug")
    } else {
        EnvFilter::new("snapsmith=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        Commands::Meta(args) => commands::meta::execute(args),
        Commands::Extract(args) => commands::extract::execute(args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
