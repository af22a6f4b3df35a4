//! Run command - Simulate a single episode from a configuration file

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    cli::output,
    config::Config,
    environment::{Environment, matrix::DurationMatrix},
    policy::build_policy,
    simulation::{Agent, backup::write_backup, run_episode},
    state::State,
};

#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Path to a JSON configuration file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Suppress per-step output
    #[arg(long)]
    pub quiet: bool,

    /// Override the configured policy kind
    #[arg(long, value_enum)]
    pub policy: Option<crate::policy::PolicyKind>,
}

pub fn execute(args: RunArgs) -> Result<()> {
    let config = Config::from_json_path(&args.config)
        .with_context(|| format!("loading configuration {}", args.config.display()))?;
    let matrix = DurationMatrix::from_csv_path(
        &config.simulation.duration_matrix,
        config.simulation.separator_byte(),
    )
    .with_context(|| {
        format!(
            "loading duration matrix {}",
            config.simulation.duration_matrix.display()
        )
    })?;
    let env = Arc::new(Environment::from_matrix(&matrix, &config.environment)?);
    let mut policy_config = config.policy.clone();
    if let Some(kind) = args.policy {
        policy_config.kind = kind;
    }
    let policy = build_policy(Arc::clone(&env), &policy_config)?;
    let initial = State::new(0.0, env.find_location(&config.simulation.initial_location)?);
    let mut agent = Agent::new(initial, policy);

    output::print_section(&format!("chronoroute run ({})", agent.policy_name()));
    match run_episode(&env, &mut agent, config.simulation.max_steps) {
        Ok(summary) => {
            if !args.quiet {
                for record in &summary.steps {
                    output::print_step(
                        record.step,
                        record.time,
                        &record.location,
                        &record.action,
                        record.reward,
                    );
                }
            }
            output::print_kv("elapsed time", &format!("{:.3}", summary.elapsed_time));
            output::print_kv("total return", &format!("{:.4}", summary.total_return));
            output::print_kv("reached goal", &summary.reached_goal.to_string());
            if let Some(path) = &config.simulation.backup_path {
                write_backup(path, config.simulation.separator_byte(), &[summary])?;
                output::print_kv("backup", &path.display().to_string());
            }
        }
        // The agent reached an unmodeled situation: terminate the episode,
        // not the process.
        Err(error) => {
            output::print_kv("episode terminated", &error.to_string());
        }
    }
    Ok(())
}
