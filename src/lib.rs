//! Dynamic-programming control for finite MDPs with known transition models.
//!
//! The core is [`PolicyIteration`]: Gauss-Seidel policy evaluation alternated
//! with greedy improvement until the policy is stable. Models implement
//! [`MdpModel`], metrics flow through a [`MetricsSink`], and a few classic
//! Gymnasium grid worlds ship in [`envs`].

pub mod checkpoint;
pub mod envs;
pub mod error;
pub mod logging;
pub mod mdp;
pub mod metrics;
pub mod rollout;
pub mod solver;
pub mod table;
pub mod visualize;

pub use crate::checkpoint::{CheckpointError, PolicyCheckpoint, TrainingMetadata};
pub use crate::envs::{CliffWalking, Environment, FrozenLake, GridLayout, Taxi};
pub use crate::error::{ModelError, SolverError};
pub use crate::mdp::{MdpModel, Outcome, TabularMdp, TabularMdpBuilder, validate_model};
pub use crate::metrics::{FileMetricSink, MemorySink, MetricRecord, MetricsSink, NoopSink};
pub use crate::rollout::{EpisodeStats, ModelEnv, Step, check_policy_shape, run_episodes};
pub use crate::solver::{
    Algorithm, IterationSummary, PolicyIteration, SolverConfig, TabularSolver, TrainingReport,
    ValueIteration,
};
pub use crate::table::{PolicyTable, ValueFunction};
pub use crate::visualize::{
    ValueGridOptions, plot_convergence, render_policy_grid, render_policy_table, render_value_grid,
};
