//! Sampling episodes from a transition model.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ModelError;
use crate::mdp::{MdpModel, validate_model};
use crate::table::PolicyTable;

/// Result of a single [`ModelEnv::step`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step {
    pub next_state: usize,
    pub reward: f64,
    pub terminal: bool,
}

/// Turns an [`MdpModel`] into a seeded, steppable environment.
pub struct ModelEnv<M> {
    model: M,
    rng: StdRng,
    initial_states: Vec<usize>,
    state: usize,
    steps: usize,
}

impl<M: MdpModel> ModelEnv<M> {
    /// Validates `model` so that every later [`step`](Self::step) with an
    /// in-range action has a non-empty outcome list to sample from.
    pub fn new(model: M, seed: u64) -> Result<Self, ModelError> {
        validate_model(&model)?;
        let state_count = model.state_count();
        let mut initial_states = model.initial_states();
        if let Some(&state) = initial_states.iter().find(|&&state| state >= state_count) {
            return Err(ModelError::InitialStateOutOfRange { state, state_count });
        }
        if initial_states.is_empty() {
            initial_states.push(0);
        }
        let state = initial_states[0];
        Ok(Self {
            model,
            rng: StdRng::seed_from_u64(seed),
            initial_states,
            state,
            steps: 0,
        })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Starts a new episode from a uniformly chosen initial state.
    pub fn reset(&mut self) -> usize {
        self.state = *self
            .initial_states
            .choose(&mut self.rng)
            .unwrap_or(&self.initial_states[0]);
        self.steps = 0;
        self.state
    }

    pub fn state(&self) -> usize {
        self.state
    }

    pub fn step_count(&self) -> usize {
        self.steps
    }

    /// Samples the next transition for `action` from the current state.
    ///
    /// # Panics
    ///
    /// Panics if `action` is not below the model's action count.
    pub fn step(&mut self, action: usize) -> Step {
        assert!(
            action < self.model.action_count(),
            "action {action} is outside a model with {} actions",
            self.model.action_count()
        );
        let outcomes = self.model.transitions(self.state, action);
        let mut sample = self.rng.gen_range(0.0..1.0);
        // Rounding can leave the sample just past the cumulative mass; fall
        // back to the last outcome.
        let mut chosen = outcomes[outcomes.len() - 1];
        for outcome in outcomes {
            if sample < outcome.probability {
                chosen = *outcome;
                break;
            }
            sample -= outcome.probability;
        }
        self.state = chosen.next_state;
        self.steps += 1;
        Step {
            next_state: chosen.next_state,
            reward: chosen.reward,
            terminal: chosen.terminal,
        }
    }
}

/// Aggregate outcome of [`run_episodes`].
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct EpisodeStats {
    pub episodes: usize,
    /// Episodes that ended in a terminal transition rather than the step limit.
    pub terminated: usize,
    pub mean_return: f64,
    pub mean_length: f64,
}

impl EpisodeStats {
    pub fn success_rate(&self) -> f64 {
        if self.episodes == 0 {
            0.0
        } else {
            self.terminated as f64 / self.episodes as f64
        }
    }
}

/// Fails unless `policy` has one row per state and one column per action of `model`.
pub fn check_policy_shape<M: MdpModel + ?Sized>(
    model: &M,
    policy: &PolicyTable,
) -> Result<(), ModelError> {
    let shape = (model.state_count(), model.action_count());
    if (policy.state_count(), policy.action_count()) != shape {
        return Err(ModelError::PolicyShape {
            policy_states: policy.state_count(),
            policy_actions: policy.action_count(),
            state_count: model.state_count(),
            action_count: model.action_count(),
        });
    }
    Ok(())
}

/// Rolls out the greedy action of `policy` for `episodes` episodes.
///
/// Episodes are truncated after `max_steps`, or after the model's own limit
/// when `max_steps` is `None`. The model is validated and the policy must
/// match its shape.
pub fn run_episodes<M: MdpModel>(
    model: M,
    policy: &PolicyTable,
    episodes: usize,
    max_steps: Option<usize>,
    seed: u64,
) -> Result<EpisodeStats, ModelError> {
    check_policy_shape(&model, policy)?;
    let max_steps = max_steps
        .or_else(|| model.max_episode_steps())
        .unwrap_or(model.state_count() * 10);
    let mut env = ModelEnv::new(model, seed)?;
    let mut terminated = 0usize;
    let mut total_return = 0.0;
    let mut total_length = 0usize;
    for episode in 0..episodes {
        let mut state = env.reset();
        let mut episode_return = 0.0;
        let mut done = false;
        while !done && env.step_count() < max_steps {
            let step = env.step(policy.greedy_action(state));
            episode_return += step.reward;
            state = step.next_state;
            done = step.terminal;
        }
        if done {
            terminated += 1;
        }
        debug!(
            "Episode {episode} finished after {} steps with return {episode_return:.2}.",
            env.step_count()
        );
        total_return += episode_return;
        total_length += env.step_count();
    }
    let denominator = episodes.max(1) as f64;
    Ok(EpisodeStats {
        episodes,
        terminated,
        mean_return: total_return / denominator,
        mean_length: total_length as f64 / denominator,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdp::{Outcome, TabularMdp};

    fn coin() -> TabularMdp {
        // State 0 flips a fair coin: heads ends the episode, tails stays.
        TabularMdp::builder(2, 1)
            .transition(0, 0, Outcome::new(0.5, 1, 1.0, true))
            .transition(0, 0, Outcome::new(0.5, 0, 0.0, false))
            .deterministic(1, 0, 1, 0.0, true)
            .build()
            .expect("model")
    }

    #[test]
    fn same_seed_same_trajectory() {
        let mdp = coin();
        let mut first = ModelEnv::new(&mdp, 42).expect("valid model");
        let mut second = ModelEnv::new(&mdp, 42).expect("valid model");
        first.reset();
        second.reset();
        for _ in 0..20 {
            assert_eq!(first.step(0), second.step(0));
        }
        assert_eq!(first.step_count(), 20);
    }

    #[test]
    fn both_outcomes_are_sampled() {
        let mdp = coin();
        let mut env = ModelEnv::new(&mdp, 7).expect("valid model");
        let mut heads = 0;
        for _ in 0..200 {
            env.reset();
            if env.step(0).terminal {
                heads += 1;
            }
        }
        assert!(heads > 50 && heads < 150, "heads = {heads}");
    }

    #[test]
    fn episodes_respect_step_limit() {
        let mdp = TabularMdp::builder(1, 1)
            .deterministic(0, 0, 0, -1.0, false)
            .build()
            .expect("model");
        let policy = PolicyTable::uniform(1, 1);
        let stats = run_episodes(&mdp, &policy, 3, Some(5), 0).expect("rollouts");
        assert_eq!(stats.terminated, 0);
        assert_eq!(stats.mean_length, 5.0);
        assert_eq!(stats.mean_return, -5.0);
        assert_eq!(stats.success_rate(), 0.0);
    }

    #[test]
    fn mismatched_policy_is_rejected() {
        let mdp = coin();
        let policy = PolicyTable::uniform(3, 1);
        assert_eq!(
            run_episodes(&mdp, &policy, 1, Some(5), 0),
            Err(ModelError::PolicyShape {
                policy_states: 3,
                policy_actions: 1,
                state_count: 2,
                action_count: 1,
            })
        );
        let wide = PolicyTable::uniform(2, 4);
        assert!(matches!(
            run_episodes(&mdp, &wide, 1, Some(5), 0),
            Err(ModelError::PolicyShape { policy_actions: 4, .. })
        ));
    }

    /// Hand-written model that skips the builder's checks.
    struct Unchecked {
        outcomes: Vec<Outcome>,
        initial_states: Vec<usize>,
    }

    impl MdpModel for Unchecked {
        fn state_count(&self) -> usize {
            1
        }

        fn action_count(&self) -> usize {
            1
        }

        fn transitions(&self, _state: usize, _action: usize) -> &[Outcome] {
            &self.outcomes
        }

        fn initial_states(&self) -> Vec<usize> {
            self.initial_states.clone()
        }
    }

    #[test]
    fn unchecked_models_are_validated_before_sampling() {
        let empty = Unchecked {
            outcomes: Vec::new(),
            initial_states: vec![0],
        };
        assert_eq!(
            ModelEnv::new(&empty, 0).err(),
            Some(ModelError::MissingTransitions {
                state: 0,
                action: 0
            })
        );

        let stray_start = Unchecked {
            outcomes: vec![Outcome::certain(0, 0.0, true)],
            initial_states: vec![3],
        };
        assert_eq!(
            ModelEnv::new(&stray_start, 0).err(),
            Some(ModelError::InitialStateOutOfRange {
                state: 3,
                state_count: 1
            })
        );
        let policy = PolicyTable::uniform(1, 1);
        assert!(run_episodes(&empty, &policy, 1, Some(5), 0).is_err());
    }

    #[test]
    #[should_panic(expected = "action 1 is outside a model with 1 actions")]
    fn out_of_range_action_panics() {
        let mdp = coin();
        let mut env = ModelEnv::new(&mdp, 0).expect("valid model");
        env.reset();
        env.step(1);
    }
}
