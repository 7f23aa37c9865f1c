use thiserror::Error;

/// Errors raised while validating or constructing an MDP model.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("model must have at least one state")]
    NoStates,
    #[error("model must have at least one action")]
    NoActions,
    #[error(
        "state {state}, action {action} is outside a model with {state_count} states \
         and {action_count} actions"
    )]
    PairOutOfRange {
        state: usize,
        action: usize,
        state_count: usize,
        action_count: usize,
    },
    #[error("no transitions defined for state {state}, action {action}")]
    MissingTransitions { state: usize, action: usize },
    #[error(
        "transition from state {state} via action {action} targets state {next_state}, \
         but the model only has {state_count} states"
    )]
    NextStateOutOfRange {
        state: usize,
        action: usize,
        next_state: usize,
        state_count: usize,
    },
    #[error("initial state {state} is outside a model with {state_count} states")]
    InitialStateOutOfRange { state: usize, state_count: usize },
    #[error("probability {probability} for state {state}, action {action} is outside [0, 1]")]
    InvalidProbability {
        state: usize,
        action: usize,
        probability: f64,
    },
    #[error("probabilities for state {state}, action {action} sum to {sum}, expected 1.0")]
    ProbabilityMass { state: usize, action: usize, sum: f64 },
    #[error("reward for state {state}, action {action} is not finite")]
    NonFiniteReward { state: usize, action: usize },
    #[error(
        "policy covers {policy_states} states and {policy_actions} actions, but the model \
         has {state_count} and {action_count}"
    )]
    PolicyShape {
        policy_states: usize,
        policy_actions: usize,
        state_count: usize,
        action_count: usize,
    },
    #[error("invalid map: {0}")]
    InvalidMap(&'static str),
    #[error(
        "unrecognized environment spec `{0}` (available: frozen-lake, frozen-lake-8x8, \
         cliff-walking, taxi)"
    )]
    UnknownEnvironment(String),
}

/// Errors surfaced by the tabular solvers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolverError {
    #[error("invalid model: {0}")]
    InvalidModel(#[from] ModelError),
    #[error("discount factor {0} is outside [0, 1]")]
    DiscountFactor(f64),
    #[error("convergence threshold {0} must be finite and positive")]
    Theta(f64),
    #[error("{0} must be positive")]
    ZeroBudget(&'static str),
    #[error("policy evaluation did not converge within {sweeps} sweeps (last delta {delta:e})")]
    EvaluationDidNotConverge { sweeps: usize, delta: f64 },
    #[error("policy did not stabilize within {iterations} iterations")]
    PolicyDidNotStabilize { iterations: usize },
}
