//! Batch command - Run repeated episodes and aggregate their outcomes

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use statrs::statistics::Statistics;

use crate::{
    cli::output,
    config::Config,
    environment::{Environment, matrix::DurationMatrix},
    policy::build_policy,
    simulation::{Agent, EpisodeSummary, backup::write_backup, run_episode},
    state::State,
};

#[derive(Debug, Parser)]
pub struct BatchArgs {
    /// Path to a JSON configuration file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Number of episodes to simulate
    #[arg(short, long, default_value_t = 100)]
    pub episodes: usize,

    /// Print the aggregate summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Override the configured policy kind
    #[arg(long, value_enum)]
    pub policy: Option<crate::policy::PolicyKind>,
}

#[derive(Debug, Serialize)]
struct BatchSummary {
    episodes: usize,
    completed: usize,
    terminated_early: usize,
    goal_rate: f64,
    mean_return: f64,
    std_dev_return: f64,
    mean_elapsed_time: f64,
}

impl BatchSummary {
    fn from_outcomes(requested: usize, summaries: &[EpisodeSummary]) -> Self {
        let returns: Vec<f64> = summaries.iter().map(|s| s.total_return).collect();
        let times: Vec<f64> = summaries.iter().map(|s| s.elapsed_time).collect();
        let goals = summaries.iter().filter(|s| s.reached_goal).count();
        if summaries.is_empty() {
            return Self {
                episodes: requested,
                completed: 0,
                terminated_early: requested,
                goal_rate: 0.0,
                mean_return: 0.0,
                std_dev_return: 0.0,
                mean_elapsed_time: 0.0,
            };
        }
        Self {
            episodes: requested,
            completed: summaries.len(),
            terminated_early: requested - summaries.len(),
            goal_rate: goals as f64 / summaries.len() as f64,
            mean_return: returns.iter().mean(),
            std_dev_return: if returns.len() > 1 {
                returns.iter().std_dev()
            } else {
                0.0
            },
            mean_elapsed_time: times.iter().mean(),
        }
    }
}

pub fn execute(args: BatchArgs) -> Result<()> {
    let config = Config::from_json_path(&args.config)
        .with_context(|| format!("loading configuration {}", args.config.display()))?;
    let matrix = DurationMatrix::from_csv_path(
        &config.simulation.duration_matrix,
        config.simulation.separator_byte(),
    )?;
    let env = Arc::new(Environment::from_matrix(&matrix, &config.environment)?);
    let initial = State::new(0.0, env.find_location(&config.simulation.initial_location)?);

    let progress = output::create_batch_progress(args.episodes as u64);
    let mut summaries: Vec<EpisodeSummary> = Vec::with_capacity(args.episodes);
    let mut terminated = 0usize;
    let mut base_policy_config = config.policy.clone();
    if let Some(kind) = args.policy {
        base_policy_config.kind = kind;
    }
    for episode in 0..args.episodes {
        // Fresh policy per episode; derived seeds keep the batch reproducible.
        let mut policy_config = base_policy_config.clone();
        if let Some(seed) = base_policy_config.seed {
            policy_config.seed = Some(seed.wrapping_add(episode as u64));
        }
        let policy = build_policy(Arc::clone(&env), &policy_config)?;
        let mut agent = Agent::new(initial, policy);
        match run_episode(&env, &mut agent, config.simulation.max_steps) {
            Ok(summary) => summaries.push(summary),
            Err(error) => {
                terminated += 1;
                progress.println(format!("episode {episode} terminated: {error}"));
            }
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    if let Some(path) = &config.simulation.backup_path {
        write_backup(path, config.simulation.separator_byte(), &summaries)?;
    }

    let summary = BatchSummary::from_outcomes(args.episodes, &summaries);
    debug_assert_eq!(summary.terminated_early, terminated);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        output::print_section(&format!(
            "chronoroute batch ({} x {} episodes)",
            base_policy_config.kind, args.episodes
        ));
        output::print_kv("completed", &summary.completed.to_string());
        output::print_kv("terminated early", &summary.terminated_early.to_string());
        output::print_kv("goal rate", &format!("{:.3}", summary.goal_rate));
        output::print_kv("mean return", &format!("{:.4}", summary.mean_return));
        output::print_kv("std dev return", &format!("{:.4}", summary.std_dev_return));
        output::print_kv("mean elapsed", &format!("{:.3}", summary.mean_elapsed_time));
    }
    Ok(())
}
