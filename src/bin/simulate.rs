use std::error::Error;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use tabular_dp::{
    Environment, MdpModel, ModelEnv, ModelError, PolicyCheckpoint, check_policy_shape,
    render_policy_grid, run_episodes,
};

const DEFAULT_SEED: u64 = 0xDEC0_1DED_5EED_F00D;

#[derive(Parser, Debug)]
#[command(about = "Roll out a trained policy checkpoint", version, author)]
struct SimulateArgs {
    /// Checkpoint (.bin) written by `train --output`.
    checkpoint: PathBuf,
    /// Number of episodes to roll out.
    #[arg(long, default_value_t = 10)]
    episodes: usize,
    /// Seed for sampling transitions.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
    /// Step limit per episode (defaults to the environment's own limit).
    #[arg(long)]
    max_steps: Option<usize>,
    /// Print every state and chosen action of the first episode.
    #[arg(long)]
    visualize: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let args = SimulateArgs::parse();
    if args.max_steps == Some(0) {
        return Err("max-steps must be positive".into());
    }
    let checkpoint = PolicyCheckpoint::load(&args.checkpoint)?;
    let metadata = &checkpoint.metadata;
    let env = Environment::from_spec(&metadata.environment)?;
    if env.state_count() != metadata.state_count || env.action_count() != metadata.action_count {
        return Err(format!(
            "checkpoint was trained on {} states and {} actions, but {} has {} and {}",
            metadata.state_count,
            metadata.action_count,
            metadata.environment,
            env.state_count(),
            env.action_count()
        )
        .into());
    }

    println!(
        "Loaded {} policy for {} ({} iterations, {} sweeps, discount {}).",
        metadata.algorithm.label(),
        metadata.environment,
        metadata.iterations,
        metadata.total_sweeps,
        metadata.config.discount_factor
    );

    if args.visualize {
        if let Some(grid) = env.grid() {
            println!("{}", render_policy_grid(grid, &checkpoint.policy));
        }
        visualize_episode(&env, &checkpoint, &args)?;
    }

    let stats = run_episodes(
        &env,
        &checkpoint.policy,
        args.episodes,
        args.max_steps,
        args.seed,
    )?;
    println!(
        "{} episodes: {} terminated ({:.1}%), mean return {:.3}, mean length {:.1}",
        stats.episodes,
        stats.terminated,
        stats.success_rate() * 100.0,
        stats.mean_return,
        stats.mean_length
    );
    Ok(())
}

fn visualize_episode(
    env: &Environment,
    checkpoint: &PolicyCheckpoint,
    args: &SimulateArgs,
) -> Result<(), ModelError> {
    check_policy_shape(env, &checkpoint.policy)?;
    let limit = args
        .max_steps
        .or_else(|| env.max_episode_steps())
        .unwrap_or(env.state_count());
    let mut rollout = ModelEnv::new(env, args.seed)?;
    let mut state = rollout.reset();
    println!("Start: {}", env.describe_state(state));
    while rollout.step_count() < limit {
        let action = checkpoint.policy.greedy_action(state);
        let step = rollout.step(action);
        println!(
            "  {:>3}. {:<8} -> {} (reward {})",
            rollout.step_count(),
            env.action_name(action),
            env.describe_state(step.next_state),
            step.reward
        );
        state = step.next_state;
        if step.terminal {
            println!("Episode finished after {} steps.\n", rollout.step_count());
            return Ok(());
        }
    }
    println!("Step limit {limit} reached.\n");
    Ok(())
}
