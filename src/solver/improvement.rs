use tracing::{debug, info};

use super::action_value;
use crate::mdp::MdpModel;
use crate::table::{PolicyTable, ValueFunction, first_argmax};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImprovementOutcome {
    /// States whose greedy action differs from the previous argmax action.
    pub changed_states: Vec<usize>,
}

impl ImprovementOutcome {
    pub fn changed(&self) -> bool {
        !self.changed_states.is_empty()
    }
}

/// Makes `policy` greedy with respect to `values`, one-hot per state.
///
/// Ties between actions go to the lowest index, both for the new greedy
/// action and for the argmax of the previous row.
pub fn improve<M: MdpModel + ?Sized>(
    model: &M,
    values: &ValueFunction,
    policy: &mut PolicyTable,
    discount_factor: f64,
) -> ImprovementOutcome {
    let mut changed_states = Vec::new();
    let mut action_values = vec![0.0; model.action_count()];
    for state in 0..model.state_count() {
        let old_action = policy.greedy_action(state);
        for (action, slot) in action_values.iter_mut().enumerate() {
            *slot = action_value(model, values, state, action, discount_factor);
        }
        let best_action = first_argmax(&action_values);
        if old_action != best_action {
            debug!("Policy improved at state {state}: {old_action} -> {best_action}.");
            changed_states.push(state);
        }
        policy.set_deterministic(state, best_action);
    }
    info!(
        "Policy improvement completed. Policy stable: {}.",
        changed_states.is_empty()
    );
    ImprovementOutcome { changed_states }
}
