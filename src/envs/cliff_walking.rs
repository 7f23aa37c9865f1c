use crate::envs::GridLayout;
use crate::mdp::{MdpModel, Outcome, TabularMdp};

pub const UP: usize = 0;
pub const RIGHT: usize = 1;
pub const DOWN: usize = 2;
pub const LEFT: usize = 3;
pub const ACTION_COUNT: usize = 4;

pub const ROWS: usize = 4;
pub const COLS: usize = 12;
pub const START: usize = (ROWS - 1) * COLS;
pub const GOAL: usize = ROWS * COLS - 1;

const STEP_REWARD: f64 = -1.0;
const CLIFF_REWARD: f64 = -100.0;

/// The 4x12 cliff from Sutton & Barto, example 6.6.
///
/// The bottom row between start and goal is the cliff: stepping into it costs
/// 100 and sends the agent back to the start.
#[derive(Clone, Debug)]
pub struct CliffWalking {
    mdp: TabularMdp,
}

impl Default for CliffWalking {
    fn default() -> Self {
        Self::new()
    }
}

impl CliffWalking {
    pub fn new() -> Self {
        let transitions: Vec<Vec<Vec<Outcome>>> = (0..ROWS * COLS)
            .map(|state| {
                (0..ACTION_COUNT)
                    .map(|action| vec![outcome(state, action)])
                    .collect()
            })
            .collect();
        Self {
            mdp: TabularMdp::from_parts(transitions, vec![START]),
        }
    }
}

fn is_cliff(state: usize) -> bool {
    state > START && state < GOAL
}

fn outcome(state: usize, action: usize) -> Outcome {
    if state == GOAL {
        return Outcome::certain(GOAL, 0.0, true);
    }
    let (row, col) = (state / COLS, state % COLS);
    let (row, col) = match action {
        UP => (row.saturating_sub(1), col),
        RIGHT => (row, (col + 1).min(COLS - 1)),
        DOWN => ((row + 1).min(ROWS - 1), col),
        _ => (row, col.saturating_sub(1)),
    };
    let next_state = row * COLS + col;
    if is_cliff(next_state) {
        Outcome::certain(START, CLIFF_REWARD, false)
    } else {
        Outcome::certain(next_state, STEP_REWARD, next_state == GOAL)
    }
}

impl MdpModel for CliffWalking {
    fn state_count(&self) -> usize {
        ROWS * COLS
    }

    fn action_count(&self) -> usize {
        ACTION_COUNT
    }

    fn transitions(&self, state: usize, action: usize) -> &[Outcome] {
        self.mdp.transitions(state, action)
    }

    fn initial_states(&self) -> Vec<usize> {
        vec![START]
    }
}

impl GridLayout for CliffWalking {
    fn shape(&self) -> (usize, usize) {
        (ROWS, COLS)
    }

    fn cell(&self, state: usize) -> char {
        match state {
            START => 'S',
            GOAL => 'G',
            s if is_cliff(s) => 'C',
            _ => '.',
        }
    }

    fn is_blocked(&self, state: usize) -> bool {
        state == GOAL || is_cliff(state)
    }

    fn action_symbol(&self, action: usize) -> char {
        match action {
            UP => '↑',
            RIGHT => '→',
            DOWN => '↓',
            _ => '←',
        }
    }
}

pub fn action_name(action: usize) -> &'static str {
    match action {
        UP => "up",
        RIGHT => "right",
        DOWN => "down",
        LEFT => "left",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cliff_sends_agent_back_to_start() {
        let env = CliffWalking::new();
        assert_eq!(
            env.transitions(START, RIGHT),
            &[Outcome::certain(START, CLIFF_REWARD, false)]
        );
        assert_eq!(
            env.transitions(START, UP),
            &[Outcome::certain(START - COLS, STEP_REWARD, false)]
        );
    }

    #[test]
    fn goal_is_reached_from_above_and_absorbs() {
        let env = CliffWalking::new();
        assert_eq!(
            env.transitions(GOAL - COLS, DOWN),
            &[Outcome::certain(GOAL, STEP_REWARD, true)]
        );
        assert_eq!(env.transitions(GOAL, UP), &[Outcome::certain(GOAL, 0.0, true)]);
    }

    #[test]
    fn layout_marks_the_cliff() {
        let env = CliffWalking::new();
        assert_eq!(env.cell(START), 'S');
        assert_eq!(env.cell(START + 1), 'C');
        assert_eq!(env.cell(GOAL), 'G');
        assert!(!env.is_blocked(0));
    }
}
