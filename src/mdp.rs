use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Allowed deviation from 1.0 when summing the outcome probabilities of a
/// single (state, action) pair.
pub const PROBABILITY_TOLERANCE: f64 = 1.0e-6;

/// One possible result of taking an action in a state.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Outcome {
    pub probability: f64,
    pub next_state: usize,
    pub reward: f64,
    pub terminal: bool,
}

impl Outcome {
    pub fn new(probability: f64, next_state: usize, reward: f64, terminal: bool) -> Self {
        Self {
            probability,
            next_state,
            reward,
            terminal,
        }
    }

    /// Outcome that happens with probability 1.
    pub fn certain(next_state: usize, reward: f64, terminal: bool) -> Self {
        Self::new(1.0, next_state, reward, terminal)
    }
}

/// Finite MDP with an explicit transition model.
///
/// Solvers only read from the model. Implementations must return the same
/// outcomes for a given (state, action) pair for the lifetime of a solver.
pub trait MdpModel {
    fn state_count(&self) -> usize;

    fn action_count(&self) -> usize;

    /// Ordered outcomes of taking `action` in `state`.
    fn transitions(&self, state: usize, action: usize) -> &[Outcome];

    /// States an episode may start from, chosen uniformly by rollouts.
    fn initial_states(&self) -> Vec<usize> {
        vec![0]
    }

    /// Step limit after which a rollout is truncated.
    fn max_episode_steps(&self) -> Option<usize> {
        None
    }
}

impl<M: MdpModel + ?Sized> MdpModel for &M {
    fn state_count(&self) -> usize {
        (**self).state_count()
    }

    fn action_count(&self) -> usize {
        (**self).action_count()
    }

    fn transitions(&self, state: usize, action: usize) -> &[Outcome] {
        (**self).transitions(state, action)
    }

    fn initial_states(&self) -> Vec<usize> {
        (**self).initial_states()
    }

    fn max_episode_steps(&self) -> Option<usize> {
        (**self).max_episode_steps()
    }
}

impl<M: MdpModel + ?Sized> MdpModel for Box<M> {
    fn state_count(&self) -> usize {
        (**self).state_count()
    }

    fn action_count(&self) -> usize {
        (**self).action_count()
    }

    fn transitions(&self, state: usize, action: usize) -> &[Outcome] {
        (**self).transitions(state, action)
    }

    fn initial_states(&self) -> Vec<usize> {
        (**self).initial_states()
    }

    fn max_episode_steps(&self) -> Option<usize> {
        (**self).max_episode_steps()
    }
}

/// Checks every (state, action) pair of `model` for well-formed outcomes.
pub fn validate_model<M: MdpModel + ?Sized>(model: &M) -> Result<(), ModelError> {
    let state_count = model.state_count();
    if state_count == 0 {
        return Err(ModelError::NoStates);
    }
    if model.action_count() == 0 {
        return Err(ModelError::NoActions);
    }
    for state in 0..state_count {
        for action in 0..model.action_count() {
            let outcomes = model.transitions(state, action);
            if outcomes.is_empty() {
                return Err(ModelError::MissingTransitions { state, action });
            }
            let mut sum = 0.0;
            for outcome in outcomes {
                if !(0.0..=1.0).contains(&outcome.probability) {
                    return Err(ModelError::InvalidProbability {
                        state,
                        action,
                        probability: outcome.probability,
                    });
                }
                if outcome.next_state >= state_count {
                    return Err(ModelError::NextStateOutOfRange {
                        state,
                        action,
                        next_state: outcome.next_state,
                        state_count,
                    });
                }
                if !outcome.reward.is_finite() {
                    return Err(ModelError::NonFiniteReward { state, action });
                }
                sum += outcome.probability;
            }
            if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
                return Err(ModelError::ProbabilityMass { state, action, sum });
            }
        }
    }
    Ok(())
}

/// Owned transition table indexed as `transitions[state][action]`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TabularMdp {
    state_count: usize,
    action_count: usize,
    transitions: Vec<Vec<Vec<Outcome>>>,
    initial_states: Vec<usize>,
}

impl TabularMdp {
    pub fn builder(state_count: usize, action_count: usize) -> TabularMdpBuilder {
        TabularMdpBuilder::new(state_count, action_count)
    }

    /// Wraps a nested transition table after validating it. Every state must
    /// list the same number of actions.
    pub fn from_transitions(transitions: Vec<Vec<Vec<Outcome>>>) -> Result<Self, ModelError> {
        let state_count = transitions.len();
        let action_count = transitions.first().map(Vec::len).unwrap_or(0);
        for (state, actions) in transitions.iter().enumerate() {
            if actions.len() != action_count {
                return Err(ModelError::MissingTransitions {
                    state,
                    action: actions.len().min(action_count),
                });
            }
        }
        let mdp = Self::from_parts(transitions, vec![0]);
        validate_model(&mdp)?;
        Ok(mdp)
    }

    /// Replaces the default initial state set.
    pub fn with_initial_states(mut self, initial_states: Vec<usize>) -> Result<Self, ModelError> {
        if let Some(&state) = initial_states.iter().find(|&&s| s >= self.state_count) {
            return Err(ModelError::InitialStateOutOfRange {
                state,
                state_count: self.state_count,
            });
        }
        if !initial_states.is_empty() {
            self.initial_states = initial_states;
        }
        Ok(self)
    }

    /// Used by the built-in environments, whose tables are correct by construction.
    pub(crate) fn from_parts(
        transitions: Vec<Vec<Vec<Outcome>>>,
        initial_states: Vec<usize>,
    ) -> Self {
        let state_count = transitions.len();
        let action_count = transitions.first().map(Vec::len).unwrap_or(0);
        Self {
            state_count,
            action_count,
            transitions,
            initial_states,
        }
    }
}

impl MdpModel for TabularMdp {
    fn state_count(&self) -> usize {
        self.state_count
    }

    fn action_count(&self) -> usize {
        self.action_count
    }

    fn transitions(&self, state: usize, action: usize) -> &[Outcome] {
        &self.transitions[state][action]
    }

    fn initial_states(&self) -> Vec<usize> {
        self.initial_states.clone()
    }
}

/// Incremental construction of a [`TabularMdp`].
pub struct TabularMdpBuilder {
    state_count: usize,
    action_count: usize,
    transitions: Vec<Vec<Vec<Outcome>>>,
    initial_states: Vec<usize>,
    out_of_range: Option<(usize, usize)>,
}

impl TabularMdpBuilder {
    pub fn new(state_count: usize, action_count: usize) -> Self {
        Self {
            state_count,
            action_count,
            transitions: vec![vec![Vec::new(); action_count]; state_count],
            initial_states: vec![0],
            out_of_range: None,
        }
    }

    /// Appends an outcome to (state, action). Out-of-range pairs are reported by
    /// [`TabularMdpBuilder::build`].
    pub fn transition(mut self, state: usize, action: usize, outcome: Outcome) -> Self {
        match self
            .transitions
            .get_mut(state)
            .and_then(|actions| actions.get_mut(action))
        {
            Some(outcomes) => outcomes.push(outcome),
            None => {
                self.out_of_range.get_or_insert((state, action));
            }
        }
        self
    }

    pub fn deterministic(
        self,
        state: usize,
        action: usize,
        next_state: usize,
        reward: f64,
        terminal: bool,
    ) -> Self {
        self.transition(state, action, Outcome::certain(next_state, reward, terminal))
    }

    pub fn with_initial_states(mut self, initial_states: Vec<usize>) -> Self {
        self.initial_states = initial_states;
        self
    }

    pub fn build(self) -> Result<TabularMdp, ModelError> {
        if let Some((state, action)) = self.out_of_range {
            return Err(ModelError::PairOutOfRange {
                state,
                action,
                state_count: self.state_count,
                action_count: self.action_count,
            });
        }
        let mdp = TabularMdp::from_parts(self.transitions, vec![0]);
        validate_model(&mdp)?;
        mdp.with_initial_states(self.initial_states)
    }
}
