//! chronoroute CLI - Online planning on graphs with time-dependent durations
//!
//! This CLI provides a unified interface for:
//! - Running single simulation episodes under a configured policy
//! - Batching repeated episodes with aggregate statistics
//! - Generating random duration matrices for experiments

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chronoroute")]
#[command(version, about = "Online MCTS planning on time-dependent graphs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a single episode
    Run(chronoroute::cli::commands::run::RunArgs),

    /// Simulate repeated episodes and aggregate outcomes
    Batch(chronoroute::cli::commands::batch::BatchArgs),

    /// Generate a random duration matrix
    Generate(chronoroute::cli::commands::generate::GenerateArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => chronoroute::cli::commands::run::execute(args),
        Commands::Batch(args) => chronoroute::cli::commands::batch::execute(args),
        Commands::Generate(args) => chronoroute::cli::commands::generate::execute(args),
    }
}
