use crate::envs::GridLayout;
use crate::error::ModelError;
use crate::mdp::{MdpModel, Outcome, TabularMdp};

pub const LEFT: usize = 0;
pub const DOWN: usize = 1;
pub const RIGHT: usize = 2;
pub const UP: usize = 3;
pub const ACTION_COUNT: usize = 4;

pub const MAP_4X4: [&str; 4] = ["SFFF", "FHFH", "FFFH", "HFFG"];

pub const MAP_8X8: [&str; 8] = [
    "SFFFFFFF", "FFFFFFFF", "FFFHFFFF", "FFFFFHFF", "FFFHFFFF", "FHHFFFHF", "FHFFHFHF",
    "FFFHFFFG",
];

/// Grid world of frozen tiles (`F`), holes (`H`), start cells (`S`) and a goal (`G`).
///
/// On slippery ice the agent moves in the intended direction or in one of the
/// two perpendicular directions, each with probability 1/3. Walking off the
/// grid leaves the agent in place.
#[derive(Clone, Debug)]
pub struct FrozenLake {
    rows: usize,
    cols: usize,
    cells: Vec<u8>,
    slippery: bool,
    max_episode_steps: usize,
    mdp: TabularMdp,
}

impl FrozenLake {
    pub fn new(map: &[&str], slippery: bool) -> Result<Self, ModelError> {
        let rows = map.len();
        if rows == 0 {
            return Err(ModelError::InvalidMap("map has no rows"));
        }
        let cols = map[0].len();
        if cols == 0 {
            return Err(ModelError::InvalidMap("map has no columns"));
        }
        if map.iter().any(|row| row.len() != cols) {
            return Err(ModelError::InvalidMap("rows differ in length"));
        }
        let cells: Vec<u8> = map.iter().flat_map(|row| row.bytes()).collect();
        if cells.iter().any(|cell| !b"SFHG".contains(cell)) {
            return Err(ModelError::InvalidMap("cells must be one of S, F, H, G"));
        }
        let initial_states: Vec<usize> = cells
            .iter()
            .enumerate()
            .filter(|&(_, &cell)| cell == b'S')
            .map(|(state, _)| state)
            .collect();
        if initial_states.is_empty() {
            return Err(ModelError::InvalidMap("map has no start cell"));
        }
        if !cells.contains(&b'G') {
            return Err(ModelError::InvalidMap("map has no goal cell"));
        }

        let mut lake = Self {
            rows,
            cols,
            cells,
            slippery,
            max_episode_steps: if rows * cols <= 16 { 100 } else { 200 },
            mdp: TabularMdp::from_parts(Vec::new(), Vec::new()),
        };
        let transitions: Vec<Vec<Vec<Outcome>>> = (0..rows * cols)
            .map(|state| {
                (0..ACTION_COUNT)
                    .map(|action| lake.outcomes(state, action))
                    .collect()
            })
            .collect();
        lake.mdp = TabularMdp::from_parts(transitions, initial_states);
        Ok(lake)
    }

    pub fn four_by_four(slippery: bool) -> Self {
        Self::new(&MAP_4X4, slippery).expect("built-in 4x4 map is valid")
    }

    pub fn eight_by_eight(slippery: bool) -> Self {
        Self::new(&MAP_8X8, slippery).expect("built-in 8x8 map is valid")
    }

    pub fn is_slippery(&self) -> bool {
        self.slippery
    }

    fn is_absorbing(&self, state: usize) -> bool {
        matches!(self.cells[state], b'H' | b'G')
    }

    fn moved(&self, state: usize, action: usize) -> usize {
        let (row, col) = (state / self.cols, state % self.cols);
        let (row, col) = match action {
            LEFT => (row, col.saturating_sub(1)),
            DOWN => ((row + 1).min(self.rows - 1), col),
            RIGHT => (row, (col + 1).min(self.cols - 1)),
            _ => (row.saturating_sub(1), col),
        };
        row * self.cols + col
    }

    fn outcomes(&self, state: usize, action: usize) -> Vec<Outcome> {
        if self.is_absorbing(state) {
            return vec![Outcome::certain(state, 0.0, true)];
        }
        let directions = if self.slippery {
            vec![(action + ACTION_COUNT - 1) % ACTION_COUNT, action, (action + 1) % ACTION_COUNT]
        } else {
            vec![action]
        };
        let probability = 1.0 / directions.len() as f64;
        directions
            .into_iter()
            .map(|direction| {
                let next_state = self.moved(state, direction);
                let reward = if self.cells[next_state] == b'G' { 1.0 } else { 0.0 };
                Outcome::new(probability, next_state, reward, self.is_absorbing(next_state))
            })
            .collect()
    }
}

impl MdpModel for FrozenLake {
    fn state_count(&self) -> usize {
        self.mdp.state_count()
    }

    fn action_count(&self) -> usize {
        ACTION_COUNT
    }

    fn transitions(&self, state: usize, action: usize) -> &[Outcome] {
        self.mdp.transitions(state, action)
    }

    fn initial_states(&self) -> Vec<usize> {
        self.mdp.initial_states()
    }

    fn max_episode_steps(&self) -> Option<usize> {
        Some(self.max_episode_steps)
    }
}

impl GridLayout for FrozenLake {
    fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn cell(&self, state: usize) -> char {
        char::from(self.cells[state])
    }

    fn is_blocked(&self, state: usize) -> bool {
        self.is_absorbing(state)
    }

    fn action_symbol(&self, action: usize) -> char {
        match action {
            LEFT => '←',
            DOWN => '↓',
            RIGHT => '→',
            _ => '↑',
        }
    }
}

pub fn action_name(action: usize) -> &'static str {
    match action {
        LEFT => "left",
        DOWN => "down",
        RIGHT => "right",
        UP => "up",
        _ => "unknown",
    }
}
