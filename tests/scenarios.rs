use tabular_dp::{
    MdpModel, MemorySink, ModelError, Outcome, PolicyIteration, SolverConfig, SolverError,
    TabularMdp, TabularSolver,
};

fn loop_or_quit() -> Result<TabularMdp, ModelError> {
    // Action 0 at state 0 pays 1 and loops; action 1 ends the episode.
    TabularMdp::builder(2, 2)
        .deterministic(0, 0, 0, 1.0, false)
        .deterministic(0, 1, 1, 0.0, true)
        .deterministic(1, 0, 1, 0.0, true)
        .deterministic(1, 1, 1, 0.0, true)
        .build()
}

fn self_loop(reward: f64) -> Result<TabularMdp, ModelError> {
    TabularMdp::builder(1, 1)
        .deterministic(0, 0, 0, reward, false)
        .build()
}

#[test]
fn looping_reward_beats_quitting() -> Result<(), SolverError> {
    let config = SolverConfig::new(0.9, 1e-10)?;
    let mut solver = PolicyIteration::without_metrics(loop_or_quit()?, config)?;
    let report = solver.train()?;
    assert_eq!(solver.policy().greedy_action(0), 0);
    assert_eq!(solver.policy().row(0), &[1.0, 0.0]);
    assert!((solver.value_function()[0] - 10.0).abs() < 1e-6);
    assert_eq!(solver.value_function()[1], 0.0);
    // The first round replaces the uniform rows; the second confirms them.
    assert_eq!(report.iterations.len(), 2);
    assert_eq!(report.iterations[1].policy_changes, 0);
    Ok(())
}

#[test]
fn zero_reward_self_loop_needs_one_sweep() -> Result<(), SolverError> {
    let config = SolverConfig::new(0.9, 1e-6)?;
    let mut solver = PolicyIteration::without_metrics(self_loop(0.0)?, config)?;
    let report = solver.train()?;
    assert_eq!(report.iterations.len(), 1);
    assert_eq!(report.iterations[0].sweeps, 1);
    assert_eq!(report.iterations[0].policy_changes, 0);
    assert_eq!(solver.value_function()[0], 0.0);
    Ok(())
}

#[test]
fn rewarding_self_loop_converges_to_geometric_sum() -> Result<(), SolverError> {
    let config = SolverConfig::new(0.5, 1e-10)?;
    let mut solver = PolicyIteration::without_metrics(self_loop(2.0)?, config)?;
    let report = solver.train()?;
    assert_eq!(report.iterations.len(), 1);
    assert_eq!(report.iterations[0].policy_changes, 0);
    assert!((solver.value_function()[0] - 4.0).abs() < 1e-8);
    Ok(())
}

#[test]
fn initial_policy_is_uniform() -> Result<(), SolverError> {
    let mdp = TabularMdp::builder(3, 4)
        .deterministic(0, 0, 1, 0.0, false)
        .deterministic(0, 1, 1, 0.0, false)
        .deterministic(0, 2, 2, 0.0, false)
        .deterministic(0, 3, 0, 0.0, false)
        .deterministic(1, 0, 2, 1.0, true)
        .deterministic(1, 1, 0, 0.0, false)
        .deterministic(1, 2, 1, 0.0, false)
        .deterministic(1, 3, 1, 0.0, false)
        .deterministic(2, 0, 2, 0.0, true)
        .deterministic(2, 1, 2, 0.0, true)
        .deterministic(2, 2, 2, 0.0, true)
        .deterministic(2, 3, 2, 0.0, true)
        .build()?;
    let solver = PolicyIteration::new(mdp, MemorySink::new(), SolverConfig::default())?;
    let policy = solver.policy();
    assert_eq!(policy.state_count(), 3);
    for state in 0..3 {
        assert_eq!(policy.row(state), &[0.25; 4]);
    }
    assert!(solver.value_function().iter().all(|&value| value == 0.0));
    Ok(())
}

/// Hand-written model that skips the builder's checks.
struct LeakyModel {
    outcomes: Vec<Outcome>,
}

impl MdpModel for LeakyModel {
    fn state_count(&self) -> usize {
        1
    }

    fn action_count(&self) -> usize {
        1
    }

    fn transitions(&self, _state: usize, _action: usize) -> &[Outcome] {
        &self.outcomes
    }
}

#[test]
fn probability_mass_is_checked_at_construction() {
    let model = LeakyModel {
        outcomes: vec![
            Outcome::new(0.6, 0, 1.0, false),
            Outcome::new(0.3, 0, 0.0, false),
        ],
    };
    let result = PolicyIteration::without_metrics(model, SolverConfig::default());
    match result {
        Err(SolverError::InvalidModel(ModelError::ProbabilityMass { state, action, sum })) => {
            assert_eq!((state, action), (0, 0));
            assert!((sum - 0.9).abs() < 1e-12);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("leaky model was accepted"),
    }
}

#[test]
fn zero_discount_values_are_expected_immediate_rewards() -> Result<(), SolverError> {
    let mdp = TabularMdp::builder(2, 2)
        .transition(0, 0, Outcome::new(0.25, 0, 4.0, false))
        .transition(0, 0, Outcome::new(0.75, 1, 0.0, false))
        .deterministic(0, 1, 1, 3.0, false)
        .deterministic(1, 0, 0, -2.0, false)
        .deterministic(1, 1, 1, -1.0, false)
        .build()?;
    let config = SolverConfig::new(0.0, 1e-9)?;
    let mut solver = PolicyIteration::without_metrics(&mdp, config)?;
    solver.train()?;
    // Greedy on immediate reward: state 0 takes the sure 3, state 1 the smaller loss.
    assert_eq!(solver.policy().actions(), vec![1, 1]);
    assert_eq!(solver.value_function().as_slice(), &[3.0, -1.0]);
    Ok(())
}
