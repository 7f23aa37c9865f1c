use std::error::Error;
use std::fs;

use tabular_dp::envs::TaxiState;
use tabular_dp::envs::cliff_walking::START;
use tabular_dp::metrics::POLICY_EVALUATION_DELTA;
use tabular_dp::{
    Algorithm, CliffWalking, Environment, FileMetricSink, FrozenLake, MdpModel, MemorySink,
    ModelError, PolicyCheckpoint, PolicyIteration, SolverConfig, Taxi, TabularSolver,
    TrainingMetadata, render_policy_grid, run_episodes,
};

#[test]
fn deterministic_lake_takes_the_shortest_path() -> Result<(), Box<dyn Error>> {
    let lake = FrozenLake::four_by_four(false);
    let mut solver = PolicyIteration::without_metrics(&lake, SolverConfig::new(0.9, 1e-10)?)?;
    solver.train()?;
    assert!((solver.value_function()[0] - 0.9_f64.powi(5)).abs() < 1e-6);

    let stats = run_episodes(&lake, solver.policy(), 10, None, 11)?;
    assert_eq!(stats.terminated, 10);
    assert_eq!(stats.mean_length, 6.0);
    assert_eq!(stats.mean_return, 1.0);
    Ok(())
}

#[test]
fn cliff_walker_hugs_the_edge() -> Result<(), Box<dyn Error>> {
    let cliff = CliffWalking::new();
    let mut solver = PolicyIteration::without_metrics(&cliff, SolverConfig::new(0.9, 1e-10)?)?;
    solver.train()?;
    let expected = -(1.0 - 0.9_f64.powi(13)) / (1.0 - 0.9);
    assert!((solver.value_function()[START] - expected).abs() < 1e-6);

    let stats = run_episodes(&cliff, solver.policy(), 3, None, 0)?;
    assert_eq!(stats.terminated, 3);
    assert_eq!(stats.mean_length, 13.0);
    Ok(())
}

#[test]
fn taxi_always_delivers() -> Result<(), Box<dyn Error>> {
    let taxi = Taxi::new();
    let mut solver = PolicyIteration::without_metrics(&taxi, SolverConfig::new(0.99, 1e-6)?)?;
    let report = solver.train()?;
    assert!(report.iterations.len() > 1);

    let stats = run_episodes(&taxi, solver.policy(), 50, None, 5)?;
    assert_eq!(stats.terminated, 50);
    assert!(stats.mean_return > 0.0);
    // Delivered states are absorbing and worth nothing.
    let delivered = TaxiState {
        row: 0,
        col: 0,
        passenger: 0,
        destination: 0,
    };
    assert_eq!(solver.value_function()[delivered.encode()], 0.0);
    Ok(())
}

#[test]
fn registry_builds_every_environment() -> Result<(), ModelError> {
    let cases = [
        ("frozen-lake", 16, 4),
        ("FrozenLake-v1:deterministic", 16, 4),
        ("frozen-lake-8x8", 64, 4),
        ("CliffWalking-v0", 48, 4),
        ("Taxi-v3", 500, 6),
    ];
    for (spec, states, actions) in cases {
        let env = Environment::from_spec(spec)?;
        assert_eq!(env.state_count(), states, "{spec}");
        assert_eq!(env.action_count(), actions, "{spec}");
    }
    let err = Environment::from_spec("blackjack").unwrap_err();
    assert!(err.to_string().contains("cliff-walking"));
    Ok(())
}

#[test]
fn checkpoint_round_trip() -> Result<(), Box<dyn Error>> {
    let env = Environment::from_spec("frozen-lake:deterministic")?;
    let config = SolverConfig::new(0.9, 1e-8)?;
    let mut solver = Algorithm::PolicyIteration.build(&env, MemorySink::new(), config)?;
    let report = solver.train()?;
    let checkpoint = PolicyCheckpoint {
        metadata: TrainingMetadata::new(
            env.spec(),
            Algorithm::PolicyIteration,
            config,
            solver.policy(),
            &report,
        ),
        policy: solver.policy().clone(),
        values: solver.value_function().clone(),
    };

    let path = std::env::temp_dir()
        .join(format!("tabular-dp-{}", std::process::id()))
        .join("policy.bin");
    checkpoint.save(&path)?;
    let loaded = PolicyCheckpoint::load(&path)?;
    let _ = fs::remove_file(&path);
    assert_eq!(loaded, checkpoint);
    assert_eq!(loaded.metadata.state_count, 16);
    assert_eq!(loaded.metadata.total_sweeps, report.total_sweeps());

    let rebuilt = Environment::from_spec(&loaded.metadata.environment)?;
    let grid = rebuilt.grid().ok_or("frozen lake has a grid")?;
    let rendered = render_policy_grid(grid, &loaded.policy);
    assert_eq!(rendered.lines().count(), 4);
    assert!(rendered.ends_with("G\n"));
    Ok(())
}

#[test]
fn file_sink_writes_delta_logs_per_iteration() -> Result<(), Box<dyn Error>> {
    let dir = std::env::temp_dir().join(format!("tabular-dp-metrics-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    let mut file_sink = FileMetricSink::new(&dir)?;
    let mut memory = MemorySink::new();
    {
        let lake = FrozenLake::four_by_four(false);
        let config = SolverConfig::new(0.9, 1e-6)?;
        let mut solver = PolicyIteration::new(&lake, (&mut file_sink, &mut memory), config)?;
        solver.train()?;
    }
    assert_eq!(file_sink.directory(), dir.as_path());
    drop(file_sink);
    assert!(!memory.is_empty());
    let last_step = memory.records().last().map(|record| record.step).unwrap_or(0);
    assert!(last_step >= 1);
    for epoch in 1..=last_step + 1 {
        let log = dir
            .join(format!("epoch-{epoch}"))
            .join(format!("{POLICY_EVALUATION_DELTA}.log"));
        assert!(log.is_file(), "missing {}", log.display());
    }
    let first = fs::read_to_string(dir.join("epoch-1").join("policy_evaluation.delta.log"))?;
    assert!(first.lines().count() >= 1);
    let _ = fs::remove_dir_all(&dir);
    Ok(())
}
