//! Built-in tabular environments with full transition models.

pub mod cliff_walking;
pub mod frozen_lake;
pub mod taxi;

use crate::error::ModelError;
use crate::mdp::{MdpModel, Outcome};

pub use cliff_walking::CliffWalking;
pub use frozen_lake::FrozenLake;
pub use taxi::{Taxi, TaxiState};

/// Row-major grid rendering of a model whose states are cells.
pub trait GridLayout {
    /// (rows, cols).
    fn shape(&self) -> (usize, usize);

    /// Map glyph of the cell at `state`.
    fn cell(&self, state: usize) -> char;

    /// Cells whose action does not matter, drawn with their glyph.
    fn is_blocked(&self, state: usize) -> bool;

    fn action_symbol(&self, action: usize) -> char;
}

#[derive(Clone, Debug)]
pub enum Environment {
    FrozenLake(FrozenLake),
    CliffWalking(CliffWalking),
    Taxi(Taxi),
}

impl Environment {
    /// Create an environment from a CLI-style spec.
    /// Supported specs:
    /// - frozen-lake[:slippery|:deterministic] (alias FrozenLake-v1)
    /// - frozen-lake-8x8[:slippery|:deterministic]
    /// - cliff-walking (alias CliffWalking-v0)
    /// - taxi (alias Taxi-v3)
    pub fn from_spec(spec: &str) -> Result<Self, ModelError> {
        let spec_lower = spec.trim().to_ascii_lowercase();
        let (name, option) = match spec_lower.split_once(':') {
            Some((name, option)) => (name.trim(), Some(option.trim())),
            None => (spec_lower.as_str(), None),
        };
        let unknown = || ModelError::UnknownEnvironment(spec.to_string());
        let slippery = match option {
            None | Some("slippery") => true,
            Some("deterministic") => false,
            Some(_) => return Err(unknown()),
        };
        match name {
            "frozen-lake" | "frozenlake" | "frozenlake-v1" | "frozen-lake-4x4" => {
                Ok(Environment::FrozenLake(FrozenLake::four_by_four(slippery)))
            }
            "frozen-lake-8x8" | "frozenlake8x8" | "frozenlake8x8-v1" => {
                Ok(Environment::FrozenLake(FrozenLake::eight_by_eight(slippery)))
            }
            "cliff-walking" | "cliffwalking" | "cliffwalking-v0" if option.is_none() => {
                Ok(Environment::CliffWalking(CliffWalking::new()))
            }
            "taxi" | "taxi-v3" if option.is_none() => Ok(Environment::Taxi(Taxi::new())),
            _ => Err(unknown()),
        }
    }

    /// Canonical spec that [`Environment::from_spec`] maps back to this environment.
    pub fn spec(&self) -> String {
        match self {
            Environment::FrozenLake(lake) => {
                let size = if lake.state_count() > 16 { "-8x8" } else { "" };
                let mode = if lake.is_slippery() { "slippery" } else { "deterministic" };
                format!("frozen-lake{size}:{mode}")
            }
            Environment::CliffWalking(_) => String::from("cliff-walking"),
            Environment::Taxi(_) => String::from("taxi"),
        }
    }

    pub fn grid(&self) -> Option<&dyn GridLayout> {
        match self {
            Environment::FrozenLake(lake) => Some(lake),
            Environment::CliffWalking(cliff) => Some(cliff),
            Environment::Taxi(_) => None,
        }
    }

    pub fn action_name(&self, action: usize) -> &'static str {
        match self {
            Environment::FrozenLake(_) => frozen_lake::action_name(action),
            Environment::CliffWalking(_) => cliff_walking::action_name(action),
            Environment::Taxi(_) => taxi::action_name(action),
        }
    }

    pub fn describe_state(&self, state: usize) -> String {
        match self {
            Environment::FrozenLake(_) | Environment::CliffWalking(_) => {
                let (_, cols) = self.grid().map(|grid| grid.shape()).unwrap_or((1, 1));
                format!("cell ({}, {})", state / cols, state % cols)
            }
            Environment::Taxi(_) => taxi::describe_state(state),
        }
    }

    fn model(&self) -> &dyn MdpModel {
        match self {
            Environment::FrozenLake(lake) => lake,
            Environment::CliffWalking(cliff) => cliff,
            Environment::Taxi(taxi) => taxi,
        }
    }
}

impl MdpModel for Environment {
    fn state_count(&self) -> usize {
        self.model().state_count()
    }

    fn action_count(&self) -> usize {
        self.model().action_count()
    }

    fn transitions(&self, state: usize, action: usize) -> &[Outcome] {
        self.model().transitions(state, action)
    }

    fn initial_states(&self) -> Vec<usize> {
        self.model().initial_states()
    }

    fn max_episode_steps(&self) -> Option<usize> {
        self.model().max_episode_steps()
    }
}
