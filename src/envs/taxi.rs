use crate::mdp::{MdpModel, Outcome, TabularMdp};

pub const SOUTH: usize = 0;
pub const NORTH: usize = 1;
pub const EAST: usize = 2;
pub const WEST: usize = 3;
pub const PICKUP: usize = 4;
pub const DROPOFF: usize = 5;
pub const ACTION_COUNT: usize = 6;

pub const STATE_COUNT: usize = 500;
pub const MAX_EPISODE_STEPS: usize = 200;

const SIZE: usize = 5;
/// Passenger index meaning "riding in the taxi".
pub const IN_TAXI: usize = 4;

const MAP: [&[u8]; 7] = [
    b"+---------+",
    b"|R: | : :G|",
    b"| : | : : |",
    b"| : : : : |",
    b"| | : | : |",
    b"|Y| : |B: |",
    b"+---------+",
];

/// Pickup and dropoff locations R, G, Y, B as (row, col).
pub const LOCATIONS: [(usize, usize); 4] = [(0, 0), (0, 4), (4, 0), (4, 3)];
const LOCATION_NAMES: [char; 4] = ['R', 'G', 'Y', 'B'];

/// Decoded Taxi state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaxiState {
    pub row: usize,
    pub col: usize,
    /// Index into [`LOCATIONS`], or [`IN_TAXI`].
    pub passenger: usize,
    pub destination: usize,
}

impl TaxiState {
    pub fn encode(self) -> usize {
        ((self.row * SIZE + self.col) * 5 + self.passenger) * 4 + self.destination
    }

    pub fn decode(state: usize) -> Self {
        let destination = state % 4;
        let state = state / 4;
        let passenger = state % 5;
        let state = state / 5;
        Self {
            row: state / SIZE,
            col: state % SIZE,
            passenger,
            destination,
        }
    }

    /// True once the passenger has been dropped at the destination.
    pub fn delivered(self) -> bool {
        self.passenger == self.destination
    }
}

/// The 5x5 Taxi domain (Dietterich, 2000).
#[derive(Clone, Debug)]
pub struct Taxi {
    mdp: TabularMdp,
}

impl Default for Taxi {
    fn default() -> Self {
        Self::new()
    }
}

impl Taxi {
    pub fn new() -> Self {
        let transitions: Vec<Vec<Vec<Outcome>>> = (0..STATE_COUNT)
            .map(|state| {
                (0..ACTION_COUNT)
                    .map(|action| vec![outcome(TaxiState::decode(state), action)])
                    .collect()
            })
            .collect();
        let initial_states = (0..STATE_COUNT)
            .filter(|&state| {
                let decoded = TaxiState::decode(state);
                decoded.passenger != IN_TAXI && !decoded.delivered()
            })
            .collect();
        Self {
            mdp: TabularMdp::from_parts(transitions, initial_states),
        }
    }
}

fn outcome(state: TaxiState, action: usize) -> Outcome {
    let current = state.encode();
    if state.delivered() {
        return Outcome::certain(current, 0.0, true);
    }
    let taxi = (state.row, state.col);
    let mut next = state;
    let mut reward = -1.0;
    let mut terminal = false;
    match action {
        SOUTH => next.row = (state.row + 1).min(SIZE - 1),
        NORTH => next.row = state.row.saturating_sub(1),
        EAST => {
            if MAP[1 + state.row][2 * state.col + 2] == b':' {
                next.col = (state.col + 1).min(SIZE - 1);
            }
        }
        WEST => {
            if MAP[1 + state.row][2 * state.col] == b':' {
                next.col = state.col.saturating_sub(1);
            }
        }
        PICKUP => {
            if state.passenger != IN_TAXI && LOCATIONS[state.passenger] == taxi {
                next.passenger = IN_TAXI;
            } else {
                reward = -10.0;
            }
        }
        _ => {
            let at = LOCATIONS.iter().position(|&loc| loc == taxi);
            match (state.passenger == IN_TAXI, at) {
                (true, Some(index)) if index == state.destination => {
                    next.passenger = index;
                    reward = 20.0;
                    terminal = true;
                }
                (true, Some(index)) => next.passenger = index,
                _ => reward = -10.0,
            }
        }
    }
    Outcome::certain(next.encode(), reward, terminal)
}

impl MdpModel for Taxi {
    fn state_count(&self) -> usize {
        STATE_COUNT
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
        Some(MAX_EPISODE_STEPS)
    }
}

pub fn action_name(action: usize) -> &'static str {
    match action {
        SOUTH => "south",
        NORTH => "north",
        EAST => "east",
        WEST => "west",
        PICKUP => "pickup",
        DROPOFF => "dropoff",
        _ => "unknown",
    }
}

pub fn describe_state(state: usize) -> String {
    let decoded = TaxiState::decode(state);
    let passenger = if decoded.passenger == IN_TAXI {
        String::from("in taxi")
    } else {
        format!("at {}", LOCATION_NAMES[decoded.passenger])
    };
    format!(
        "taxi ({}, {}), passenger {passenger}, destination {}",
        decoded.row, decoded.col, LOCATION_NAMES[decoded.destination]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_matches_layout() {
        let state = TaxiState {
            row: 3,
            col: 1,
            passenger: 2,
            destination: 0,
        };
        assert_eq!(state.encode(), 328);
        assert_eq!(TaxiState::decode(328), state);
        assert_eq!(Taxi::new().initial_states().len(), 300);
    }

    #[test]
    fn walls_block_sideways_moves() {
        // Wall between columns 1 and 2 on the top row.
        let state = TaxiState {
            row: 0,
            col: 1,
            passenger: 0,
            destination: 1,
        };
        let taxi = Taxi::new();
        assert_eq!(taxi.transitions(state.encode(), EAST)[0].next_state, state.encode());
        let west = TaxiState::decode(taxi.transitions(state.encode(), WEST)[0].next_state);
        assert_eq!(west.col, 0);
    }

    #[test]
    fn dropoff_at_destination_terminates() {
        let state = TaxiState {
            row: 0,
            col: 4,
            passenger: IN_TAXI,
            destination: 1,
        };
        let outcome = Taxi::new().transitions(state.encode(), DROPOFF)[0];
        assert_eq!(outcome.reward, 20.0);
        assert!(outcome.terminal);
        assert!(TaxiState::decode(outcome.next_state).delivered());
    }

    #[test]
    fn illegal_pickup_is_penalized() {
        let state = TaxiState {
            row: 2,
            col: 2,
            passenger: 0,
            destination: 1,
        };
        let outcome = Taxi::new().transitions(state.encode(), PICKUP)[0];
        assert_eq!(outcome.reward, -10.0);
        assert_eq!(outcome.next_state, state.encode());
    }
}
