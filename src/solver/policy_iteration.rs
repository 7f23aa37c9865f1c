use tracing::{info, warn};

use super::evaluation::{EvaluationOutcome, evaluate};
use super::improvement::{ImprovementOutcome, improve};
use super::{IterationSummary, SolverConfig, TabularSolver, TrainingReport};
use crate::error::SolverError;
use crate::mdp::{MdpModel, validate_model};
use crate::metrics::{MetricsSink, NoopSink};
use crate::table::{PolicyTable, ValueFunction};

/// Alternates policy evaluation and greedy improvement until the policy stops
/// changing.
///
/// The policy starts uniform and the value function starts at zero. Both are
/// owned by the solver for its whole lifetime. Training ends with a round that
/// evaluated a one-hot policy and left it unchanged, so the returned values
/// belong to the returned policy.
pub struct PolicyIteration<M, S = NoopSink> {
    model: M,
    sink: S,
    config: SolverConfig,
    policy: PolicyTable,
    values: ValueFunction,
}

impl<M: MdpModel> PolicyIteration<M, NoopSink> {
    /// Solver that discards its metrics.
    pub fn without_metrics(model: M, config: SolverConfig) -> Result<Self, SolverError> {
        Self::new(model, NoopSink, config)
    }
}

impl<M: MdpModel, S: MetricsSink> PolicyIteration<M, S> {
    /// Validates `config` and every transition of `model` before anything runs.
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

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_parts(self) -> (M, S, PolicyTable, ValueFunction) {
        (self.model, self.sink, self.policy, self.values)
    }

    /// Runs one evaluation of the current policy, recording metrics at `step`.
    pub fn evaluate_policy(&mut self, step: u64) -> Result<EvaluationOutcome, SolverError> {
        evaluate(
            &self.model,
            &self.policy,
            &mut self.values,
            &self.config,
            &mut self.sink,
            step,
        )
    }

    /// Runs one greedy improvement against the current value function.
    pub fn improve_policy(&mut self) -> ImprovementOutcome {
        improve(
            &self.model,
            &self.values,
            &mut self.policy,
            self.config.discount_factor,
        )
    }
}

impl<M: MdpModel, S: MetricsSink> TabularSolver for PolicyIteration<M, S> {
    fn train(&mut self) -> Result<TrainingReport, SolverError> {
        let mut report = TrainingReport::default();
        for iteration in 0..self.config.max_iterations {
            info!("Training iteration {iteration} started.");
            // A stochastic row can be replaced without its argmax moving, so
            // only a round that started from one-hot rows can end training.
            let evaluated_deterministic = self.policy.is_deterministic();
            let evaluation = self.evaluate_policy(iteration as u64)?;
            let mean_value = self.values.mean();
            let improvement = self.improve_policy();
            report.iterations.push(IterationSummary {
                iteration,
                sweeps: evaluation.sweeps,
                delta: evaluation.delta,
                policy_changes: improvement.changed_states.len(),
                mean_value,
            });
            if evaluated_deterministic && !improvement.changed() {
                info!("Training iteration {iteration}: policy stabilized.");
                self.sink.flush();
                info!("Training completed.");
                return Ok(report);
            }
        }
        self.sink.flush();
        warn!(
            iterations = self.config.max_iterations,
            "policy iteration exhausted its iteration budget"
        );
        Err(SolverError::PolicyDidNotStabilize {
            iterations: self.config.max_iterations,
        })
    }

    fn policy(&self) -> &PolicyTable {
        &self.policy
    }

    fn value_function(&self) -> &ValueFunction {
        &self.values
    }
}
