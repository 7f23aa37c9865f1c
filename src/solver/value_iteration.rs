use tracing::{info, warn};

use super::improvement::improve;
use super::{IterationSummary, SolverConfig, TabularSolver, TrainingReport, action_value};
use crate::error::SolverError;
use crate::mdp::{MdpModel, validate_model};
use crate::metrics::{MetricsSink, NoopSink, VALUE_ITERATION_DELTA};
use crate::table::{PolicyTable, ValueFunction};

/// Bellman optimality sweeps followed by a single greedy policy extraction.
///
/// The whole run counts as one iteration, so every metric is recorded at step 0.
pub struct ValueIteration<M, S = NoopSink> {
    model: M,
    sink: S,
    config: SolverConfig,
    policy: PolicyTable,
    values: ValueFunction,
}

impl<M: MdpModel, S: MetricsSink> ValueIteration<M, S> {
    pub fn new(model: M, sink: S, config: SolverConfig) -> Result<Self, SolverError> {
        config.validate()?;
        validate_model(&model)?;
        let policy = PolicyTable::uniform(model.state_count(), model.action_count());
        let values = ValueFunction::zeros(model.state_count());
        Ok(Self {
            model,
            sink,
            config,
            policy,
            values,
        })
    }

    pub fn into_parts(self) -> (M, S, PolicyTable, ValueFunction) {
        (self.model, self.sink, self.policy, self.values)
    }

    /// One in-place sweep of `V[s] = max_a q(s, a)`. Returns the sweep delta.
    fn sweep(&mut self) -> f64 {
        let discount_factor = self.config.discount_factor;
        let mut delta = 0.0_f64;
        for state in 0..self.model.state_count() {
            let best = (0..self.model.action_count())
                .map(|action| {
                    action_value(&self.model, &self.values, state, action, discount_factor)
                })
                .fold(f64::NEG_INFINITY, f64::max);
            delta = delta.max((best - self.values[state]).abs());
            self.values[state] = best;
        }
        delta
    }
}

impl<M: MdpModel, S: MetricsSink> TabularSolver for ValueIteration<M, S> {
    fn train(&mut self) -> Result<TrainingReport, SolverError> {
        info!("Starting value iteration...");
        let mut delta = f64::INFINITY;
        let mut sweeps = 0usize;
        while sweeps < self.config.max_sweeps {
            delta = self.sweep();
            self.sink.record(VALUE_ITERATION_DELTA, delta, 0);
            sweeps += 1;
            if delta < self.config.theta {
                break;
            }
        }
        self.sink.flush();
        if delta >= self.config.theta {
            warn!(sweeps, delta, "value iteration exhausted its sweep budget");
            return Err(SolverError::EvaluationDidNotConverge { sweeps, delta });
        }
        info!("Value iteration converged after {sweeps} sweeps with delta {delta:.4e}.");
        let mean_value = self.values.mean();
        let improvement = improve(
            &self.model,
            &self.values,
            &mut self.policy,
            self.config.discount_factor,
        );
        Ok(TrainingReport {
            iterations: vec![IterationSummary {
                iteration: 0,
                sweeps,
                delta,
                policy_changes: improvement.changed_states.len(),
                mean_value,
            }],
        })
    }

    fn policy(&self) -> &PolicyTable {
        &self.policy
    }

    fn value_function(&self) -> &ValueFunction {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdp::TabularMdp;
    use crate::metrics::MemorySink;

    #[test]
    fn matches_closed_form_on_a_loop() {
        // Action 1 loops with reward 1; action 0 ends the episode with reward 2.
        let mdp = TabularMdp::builder(2, 2)
            .deterministic(0, 0, 1, 2.0, true)
            .deterministic(0, 1, 0, 1.0, false)
            .deterministic(1, 0, 1, 0.0, true)
            .deterministic(1, 1, 1, 0.0, true)
            .build()
            .expect("model");
        let config = SolverConfig::new(0.9, 1e-10).expect("config");
        let mut solver = ValueIteration::new(mdp, MemorySink::new(), config).expect("solver");
        let report = solver.train().expect("converges");
        assert!((solver.value_function()[0] - 10.0).abs() < 1e-8);
        assert_eq!(solver.policy().actions(), vec![1, 0]);
        assert!(solver.policy().is_deterministic());
        let (_, sink, _, _) = solver.into_parts();
        assert_eq!(
            sink.values(VALUE_ITERATION_DELTA).len(),
            report.iterations[0].sweeps
        );
    }

    #[test]
    fn sweep_budget_is_enforced() {
        let mdp = TabularMdp::builder(1, 1)
            .deterministic(0, 0, 0, 1.0, false)
            .build()
            .expect("model");
        let config = SolverConfig::new(1.0, 1e-6)
            .expect("config")
            .with_max_sweeps(25);
        let mut solver = ValueIteration::new(mdp, NoopSink, config).expect("solver");
        assert!(matches!(
            solver.train(),
            Err(SolverError::EvaluationDidNotConverge { sweeps: 25, .. })
        ));
    }
}
