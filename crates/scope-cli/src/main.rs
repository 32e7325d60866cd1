//! # scope CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use scope_cli::resolve::{run_resolve, ResolveArgs};
use scope_cli::tree::{run_tree, TreeArgs};

/// Targeting selector CLI.
///
/// Browses the ORIGINAL, EXPATRIATE and SECTOR taxonomies and resolves pick
/// sequences into the targeting descriptor consumers receive.
#[derive(Parser, Debug)]
#[command(name = "scope", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a taxonomy as an indented tree.
    Tree(TreeArgs),

    /// Apply picks and print the confirmed targeting descriptor as JSON.
    Resolve(ResolveArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("scope CLI starting");

    let result = match cli.command {
        Commands::Tree(args) => run_tree(&args),
        Commands::Resolve(args) => run_resolve(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
