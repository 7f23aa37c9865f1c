//! Tabular dynamic-programming solvers.

pub mod evaluation;
pub mod improvement;
pub mod policy_iteration;
pub mod value_iteration;

use serde::{Deserialize, Serialize};

use crate::error::SolverError;
use crate::mdp::MdpModel;
use crate::metrics::MetricsSink;
use crate::table::{PolicyTable, ValueFunction};

pub use evaluation::{EvaluationOutcome, evaluate};
pub use improvement::{ImprovementOutcome, improve};
pub use policy_iteration::PolicyIteration;
pub use value_iteration::ValueIteration;

pub const DEFAULT_DISCOUNT_FACTOR: f64 = 0.99;
pub const DEFAULT_THETA: f64 = 1.0e-6;
pub const DEFAULT_MAX_SWEEPS: usize = 100_000;
pub const DEFAULT_MAX_ITERATIONS: usize = 1_000;

/// Hyperparameters shared by every solver.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct SolverConfig {
    pub discount_factor: f64,
    /// Evaluation stops once a sweep changes no state by `theta` or more.
    pub theta: f64,
    /// Sweep budget for a single evaluation (or for all of value iteration).
    pub max_sweeps: usize,
    /// Evaluate/improve rounds before policy iteration gives up.
    pub max_iterations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            discount_factor: DEFAULT_DISCOUNT_FACTOR,
            theta: DEFAULT_THETA,
            max_sweeps: DEFAULT_MAX_SWEEPS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl SolverConfig {
    pub fn new(discount_factor: f64, theta: f64) -> Result<Self, SolverError> {
        let config = Self {
            discount_factor,
            theta,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_max_sweeps(mut self, max_sweeps: usize) -> Self {
        self.max_sweeps = max_sweeps;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn validate(&self) -> Result<(), SolverError> {
        if !(0.0..=1.0).contains(&self.discount_factor) {
            return Err(SolverError::DiscountFactor(self.discount_factor));
        }
        if !self.theta.is_finite() || self.theta <= 0.0 {
            return Err(SolverError::Theta(self.theta));
        }
        if self.max_sweeps == 0 {
            return Err(SolverError::ZeroBudget("max sweeps"));
        }
        if self.max_iterations == 0 {
            return Err(SolverError::ZeroBudget("max iterations"));
        }
        Ok(())
    }
}

/// Summary of one evaluate/improve round.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IterationSummary {
    pub iteration: usize,
    pub sweeps: usize,
    pub delta: f64,
    pub policy_changes: usize,
    /// Mean state value of the policy evaluated in this round.
    pub mean_value: f64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct TrainingReport {
    pub iterations: Vec<IterationSummary>,
}

impl TrainingReport {
    pub fn total_sweeps(&self) -> usize {
        self.iterations.iter().map(|it| it.sweeps).sum()
    }
}

/// Capability shared by the tabular control algorithms.
pub trait TabularSolver {
    /// Runs the algorithm until its policy is stable.
    fn train(&mut self) -> Result<TrainingReport, SolverError>;

    fn policy(&self) -> &PolicyTable;

    fn value_function(&self) -> &ValueFunction;
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Algorithm {
    PolicyIteration,
    ValueIteration,
}

impl Algorithm {
    pub fn label(self) -> &'static str {
        match self {
            Algorithm::PolicyIteration => "policy-iteration",
            Algorithm::ValueIteration => "value-iteration",
        }
    }

    pub fn build<'a, M, S>(
        self,
        model: M,
        sink: S,
        config: SolverConfig,
    ) -> Result<Box<dyn TabularSolver + 'a>, SolverError>
    where
        M: MdpModel + 'a,
        S: MetricsSink + 'a,
    {
        Ok(match self {
            Algorithm::PolicyIteration => Box::new(PolicyIteration::new(model, sink, config)?),
            Algorithm::ValueIteration => Box::new(ValueIteration::new(model, sink, config)?),
        })
    }
}

/// Expected return of taking `action` in `state` and following `values` afterwards.
pub fn action_value<M: MdpModel + ?Sized>(
    model: &M,
    values: &ValueFunction,
    state: usize,
    action: usize,
    discount_factor: f64,
) -> f64 {
    model
        .transitions(state, action)
        .iter()
        .map(|outcome| {
            outcome.probability * (outcome.reward + discount_factor * values[outcome.next_state])
        })
        .sum()
}
