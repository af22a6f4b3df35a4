//! Generate command - Produce a random duration matrix CSV

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::{
    cli::output,
    environment::generator::{GeneratorConfig, MatrixGenerator},
};

#[derive(Debug, Parser)]
pub struct GenerateArgs {
    /// Output CSV path
    #[arg(short, long)]
    pub output: PathBuf,

    /// Number of locations
    #[arg(long, default_value_t = 10)]
    pub locations: usize,

    /// Minimum outgoing edges per location
    #[arg(long, default_value_t = 2)]
    pub min_edges: usize,

    /// Number of time steps after the initial breakpoint
    #[arg(long, default_value_t = 10)]
    pub time_steps: usize,

    /// Spacing between breakpoints
    #[arg(long, default_value_t = 10.0)]
    pub step_width: f64,

    /// Initial duration lower bound
    #[arg(long, default_value_t = 1.0)]
    pub duration_min: f64,

    /// Initial duration upper bound
    #[arg(long, default_value_t = 10.0)]
    pub duration_max: f64,

    /// Maximum per-breakpoint duration variation
    #[arg(long, default_value_t = 2.0)]
    pub variation: f64,

    /// CSV separator
    #[arg(long, default_value_t = ';')]
    pub separator: char,

    /// Random seed
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn execute(args: GenerateArgs) -> Result<()> {
    let config = GeneratorConfig {
        nb_time_steps: args.time_steps,
        time_step_width: args.step_width,
        nb_locations: args.locations,
        min_edges_per_location: args.min_edges,
        initial_duration_min: args.duration_min,
        initial_duration_max: args.duration_max,
        duration_variation_max: args.variation,
    };
    let mut generator = MatrixGenerator::new(config, args.seed)?;
    let matrix = generator.generate()?;
    matrix.to_csv_path(&args.output, args.separator as u8)?;

    output::print_section("chronoroute generate");
    output::print_kv("locations", &args.locations.to_string());
    output::print_kv("edges", &matrix.rows().len().to_string());
    output::print_kv("breakpoints", &matrix.time_scale().len().to_string());
    output::print_kv("written to", &args.output.display().to_string());
    Ok(())
}
