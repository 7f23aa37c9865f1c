use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// State-value estimates, one entry per state.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ValueFunction {
    values: Vec<f64>,
}

impl ValueFunction {
    pub fn zeros(state_count: usize) -> Self {
        Self {
            values: vec![0.0; state_count],
        }
    }

    pub fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.values.iter()
    }

    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    /// Largest absolute per-state difference to `other`.
    pub fn max_difference(&self, other: &ValueFunction) -> f64 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }
}

impl Index<usize> for ValueFunction {
    type Output = f64;

    fn index(&self, state: usize) -> &f64 {
        &self.values[state]
    }
}

impl IndexMut<usize> for ValueFunction {
    fn index_mut(&mut self, state: usize) -> &mut f64 {
        &mut self.values[state]
    }
}

/// Row-stochastic `state_count × action_count` matrix of action probabilities,
/// stored row-major.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PolicyTable {
    state_count: usize,
    action_count: usize,
    probabilities: Vec<f64>,
}

impl PolicyTable {
    /// Every action equally likely in every state.
    pub fn uniform(state_count: usize, action_count: usize) -> Self {
        let weight = if action_count == 0 {
            0.0
        } else {
            1.0 / action_count as f64
        };
        Self {
            state_count,
            action_count,
            probabilities: vec![weight; state_count * action_count],
        }
    }

    /// One-hot rows built from a greedy action per state.
    pub fn deterministic(actions: &[usize], action_count: usize) -> Self {
        let mut table = Self {
            state_count: actions.len(),
            action_count,
            probabilities: vec![0.0; actions.len() * action_count],
        };
        for (state, &action) in actions.iter().enumerate() {
            table.set_deterministic(state, action);
        }
        table
    }

    pub fn state_count(&self) -> usize {
        self.state_count
    }

    pub fn action_count(&self) -> usize {
        self.action_count
    }

    pub fn row(&self, state: usize) -> &[f64] {
        let start = state * self.action_count;
        &self.probabilities[start..start + self.action_count]
    }

    pub fn probability(&self, state: usize, action: usize) -> f64 {
        self.row(state)[action]
    }

    /// Most likely action in `state`; ties go to the lowest index.
    pub fn greedy_action(&self, state: usize) -> usize {
        first_argmax(self.row(state))
    }

    /// Greedy action for every state.
    pub fn actions(&self) -> Vec<usize> {
        (0..self.state_count)
            .map(|state| self.greedy_action(state))
            .collect()
    }

    /// Overwrites the row of `state` with a one-hot distribution at `action`.
    pub fn set_deterministic(&mut self, state: usize, action: usize) {
        let start = state * self.action_count;
        let row = &mut self.probabilities[start..start + self.action_count];
        row.fill(0.0);
        row[action] = 1.0;
    }

    /// True when every row puts all of its mass on a single action.
    pub fn is_deterministic(&self) -> bool {
        (0..self.state_count).all(|state| {
            let row = self.row(state);
            row.iter().all(|&p| p == 0.0 || p == 1.0)
                && row.iter().filter(|&&p| p == 1.0).count() == 1
        })
    }
}

/// Index of the first maximum of `values`. NaN entries never win.
pub(crate) fn first_argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (index, &value) in values.iter().enumerate().skip(1) {
        if value > values[best] || values[best].is_nan() {
            best = index;
        }
    }
    best
}
