use tracing::{info, warn};

use super::{SolverConfig, action_value};
use crate::error::SolverError;
use crate::mdp::MdpModel;
use crate::metrics::{MetricsSink, POLICY_EVALUATION_DELTA, POLICY_EVALUATION_VALUE};
use crate::table::{PolicyTable, ValueFunction};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EvaluationOutcome {
    pub sweeps: usize,
    /// Largest state change of the final sweep.
    pub delta: f64,
    /// Value computed for the last state of the final sweep.
    pub last_value: f64,
}

/// Iterates the Bellman expectation backup for `policy` until a full sweep
/// moves no state by `config.theta` or more.
///
/// Sweeps are in place: a state's new value is visible to every state updated
/// after it in the same sweep. Each sweep records the last computed value and
/// the sweep's delta to `sink` at `step`.
pub fn evaluate<M, S>(
    model: &M,
    policy: &PolicyTable,
    values: &mut ValueFunction,
    config: &SolverConfig,
    sink: &mut S,
    step: u64,
) -> Result<EvaluationOutcome, SolverError>
where
    M: MdpModel + ?Sized,
    S: MetricsSink + ?Sized,
{
    info!("Starting policy evaluation...");
    let mut sweeps = 0usize;
    loop {
        let mut delta = 0.0_f64;
        let mut last_value = 0.0;
        for state in 0..model.state_count() {
            let mut value = 0.0;
            for (action, &weight) in policy.row(state).iter().enumerate() {
                if weight == 0.0 {
                    continue;
                }
                value += weight
                    * action_value(model, values, state, action, config.discount_factor);
            }
            delta = delta.max((value - values[state]).abs());
            values[state] = value;
            last_value = value;
        }
        sweeps += 1;
        sink.record(POLICY_EVALUATION_VALUE, last_value, step);
        sink.record(POLICY_EVALUATION_DELTA, delta, step);

        if delta < config.theta {
            info!("Policy evaluation converged after {sweeps} sweeps with delta {delta:.4e}.");
            return Ok(EvaluationOutcome {
                sweeps,
                delta,
                last_value,
            });
        }
        if sweeps >= config.max_sweeps {
            warn!(sweeps, delta, "policy evaluation exhausted its sweep budget");
            return Err(SolverError::EvaluationDidNotConverge { sweeps, delta });
        }
    }
}
