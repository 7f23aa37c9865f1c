use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use tracing::{Level, info};

use tabular_dp::logging::{experiment_dir, setup_logging};
use tabular_dp::metrics::{POLICY_EVALUATION_DELTA, VALUE_ITERATION_DELTA};
use tabular_dp::solver::{DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_SWEEPS};
use tabular_dp::{
    Algorithm, Environment, FileMetricSink, MdpModel, MemorySink, PolicyCheckpoint,
    SolverConfig, TrainingMetadata, plot_convergence, render_policy_grid, render_policy_table,
    render_value_grid, run_episodes,
};

#[derive(Parser, Debug)]
#[command(
    about = "Solve a tabular environment with dynamic programming",
    version,
    author
)]
struct TrainArgs {
    /// Environment spec, e.g. taxi, cliff-walking, frozen-lake:deterministic.
    #[arg(long, default_value = "taxi")]
    env: String,
    /// Control algorithm.
    #[arg(long, value_enum, default_value_t = AlgorithmKind::PolicyIteration)]
    algorithm: AlgorithmKind,
    /// Discount factor applied to future rewards, in [0, 1].
    #[arg(long, default_value_t = 0.99)]
    discount_factor: f64,
    /// Evaluation stops once a sweep moves no state by this much.
    #[arg(long, default_value_t = 1.0e-6)]
    theta: f64,
    /// Sweep budget for a single evaluation.
    #[arg(long, default_value_t = DEFAULT_MAX_SWEEPS)]
    max_sweeps: usize,
    /// Evaluate/improve rounds before giving up.
    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,
    /// Directory for the log file and per-run metrics.
    #[arg(long, default_value = "./logs")]
    log_dir: PathBuf,
    /// Log file name inside the log directory.
    #[arg(long, default_value = "policy_iteration.log")]
    log_file: String,
    /// Prefix of the per-run metrics directory.
    #[arg(long, default_value = "policy_iter")]
    experiment: String,
    /// Where to write the trained policy checkpoint (.bin).
    #[arg(long)]
    output: Option<PathBuf>,
    /// Where to write a PNG chart of the delta per sweep.
    #[arg(long)]
    chart: Option<PathBuf>,
    /// Greedy rollouts used to score the trained policy.
    #[arg(long, default_value_t = 100)]
    episodes: usize,
    /// Seed for the rollouts.
    #[arg(long, default_value_t = 0x5EED_0F_D9u64)]
    seed: u64,
    /// Print the final policy and value function.
    #[arg(long)]
    show_policy: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum AlgorithmKind {
    PolicyIteration,
    ValueIteration,
}

impl From<AlgorithmKind> for Algorithm {
    fn from(kind: AlgorithmKind) -> Self {
        match kind {
            AlgorithmKind::PolicyIteration => Algorithm::PolicyIteration,
            AlgorithmKind::ValueIteration => Algorithm::ValueIteration,
        }
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let args = TrainArgs::parse();
    validate_args(&args)?;
    setup_logging(&args.log_dir, &args.log_file, Level::INFO)?;

    let env = Environment::from_spec(&args.env)?;
    let algorithm = Algorithm::from(args.algorithm);
    let config = SolverConfig::new(args.discount_factor, args.theta)?
        .with_max_sweeps(args.max_sweeps)
        .with_max_iterations(args.max_iterations);
    info!(
        "Solving {} ({} states, {} actions) with {}.",
        env.spec(),
        env.state_count(),
        env.action_count(),
        algorithm.label()
    );

    let metrics_dir = experiment_dir(&args.log_dir, &args.experiment);
    let mut file_sink = FileMetricSink::new(&metrics_dir)?;
    let mut memory = MemorySink::new();
    let (report, policy, values) = {
        let mut solver = algorithm.build(&env, (&mut file_sink, &mut memory), config)?;
        let report = solver.train()?;
        (
            report,
            solver.policy().clone(),
            solver.value_function().clone(),
        )
    };

    println!("Training finished for {}:", env.spec());
    for summary in &report.iterations {
        println!(
            "  iteration {:>3}: {:>6} sweeps, delta {:.2e}, {:>4} policy changes, mean value {:.4}",
            summary.iteration,
            summary.sweeps,
            summary.delta,
            summary.policy_changes,
            summary.mean_value
        );
    }
    println!("  total sweeps: {}", report.total_sweeps());
    println!("  metrics -> {}", display_path(file_sink.directory()));

    if args.episodes > 0 {
        let stats = run_episodes(&env, &policy, args.episodes, None, args.seed)?;
        println!(
            "Greedy rollouts: {}/{} episodes terminated, mean return {:.3}, mean length {:.1}",
            stats.terminated, stats.episodes, stats.mean_return, stats.mean_length
        );
    }

    if args.show_policy {
        match env.grid() {
            Some(grid) => {
                println!("{}", render_policy_grid(grid, &policy));
                println!("{}", render_value_grid(grid, &values));
            }
            None => println!(
                "{}",
                render_policy_table(&policy, &values, |action| env.action_name(action))
            ),
        }
    }

    if let Some(ref path) = args.chart {
        let tag = match algorithm {
            Algorithm::PolicyIteration => POLICY_EVALUATION_DELTA,
            Algorithm::ValueIteration => VALUE_ITERATION_DELTA,
        };
        plot_convergence(path, &memory.values(tag))?;
        println!("  chart saved -> {}", display_path(path));
    }

    if let Some(ref path) = args.output {
        let metadata = TrainingMetadata::new(env.spec(), algorithm, config, &policy, &report);
        let checkpoint = PolicyCheckpoint {
            metadata,
            policy,
            values,
        };
        checkpoint.save(path)?;
        println!("  checkpoint saved -> {}", display_path(path));
    }
    Ok(())
}

fn validate_args(args: &TrainArgs) -> Result<(), Box<dyn Error>> {
    if args.log_file.trim().is_empty() {
        return Err("log file name must not be empty".into());
    }
    if args.experiment.trim().is_empty() {
        return Err("experiment name must not be empty".into());
    }
    if args.max_sweeps == 0 {
        return Err("max sweeps must be positive".into());
    }
    if args.max_iterations == 0 {
        return Err("max iterations must be positive".into());
    }
    Ok(())
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
