//! Game state representation.
//!
//! Each seat tracks its four pieces as a 59-slot vector of fractional
//! occupancy values in quarter-piece units. Slot 0 is the jail, slots 1-51
//! the shared circular track in the seat's own local frame, slot 52 the
//! transitional square the owner skips over, slots 53-57 the private home
//! stretch, and slot 58 home.

/// A seat index, always in `0..SEAT_COUNT`.
pub type Seat = usize;

/// Number of seats in a game.
pub const SEAT_COUNT: usize = 4;

/// Number of occupancy slots per seat.
pub const SLOT_COUNT: usize = 59;

/// The jail slot. Pieces start here and return here when captured.
pub const JAIL: usize = 0;

/// Last slot of the shared circular track in local coordinates.
pub const TRACK_END: usize = 51;

/// The transitional square at the track/home-stretch boundary. Never a
/// landing or passing target for the owning seat; other seats' pieces appear
/// here through rotation.
pub const TRANSITION: usize = 52;

/// The home slot. A seat with 1.0 occupancy here has won.
pub const HOME: usize = 58;

/// Occupancy contributed by a single piece.
pub const PIECE: f64 = 0.25;

/// Shared-track squares exempt from capture and blockade checks, in local
/// coordinates. The board is rotationally symmetric, so the same set applies
/// to every seat's frame.
pub const SAFE_SQUARES: [usize; 9] = [0, 1, 9, 14, 22, 27, 35, 40, 48];

/// Returns true if the given local slot is a designated safe square.
pub fn is_safe(slot: usize) -> bool {
    SAFE_SQUARES.contains(&slot)
}

/// Tolerance for the occupancy-sum invariant (well under one quarter unit).
const SUM_TOLERANCE: f64 = 1e-9;

/// One seat's occupancy vector.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub slots: [f64; SLOT_COUNT],
}

impl PlayerState {
    /// Creates a seat state with all four pieces in jail.
    pub fn start() -> Self {
        let mut slots = [0.0; SLOT_COUNT];
        slots[JAIL] = 1.0;
        PlayerState { slots }
    }

    /// Sum of all slot occupancies. Always 1.0 for a consistent state.
    pub fn occupancy_sum(&self) -> f64 {
        self.slots.iter().sum()
    }

    /// Returns true if the occupancy sum equals 1.0 within tolerance.
    pub fn is_consistent(&self) -> bool {
        (self.occupancy_sum() - 1.0).abs() < SUM_TOLERANCE
    }

    /// Returns true if this seat has all four pieces home.
    pub fn has_won(&self) -> bool {
        self.slots[HOME] == 1.0
    }

    /// Expands the fractional vector into one slot index per piece,
    /// in ascending slot order.
    pub fn piece_positions(&self) -> Vec<usize> {
        let mut positions = Vec::with_capacity(4);
        for (slot, &occ) in self.slots.iter().enumerate() {
            let mut count = (occ / PIECE).round() as usize;
            while count > 0 {
                positions.push(slot);
                count -= 1;
            }
        }
        positions
    }
}

/// Complete board state: one occupancy vector per seat, indexed by seat.
///
/// Seat ordering is fixed for the lifetime of a game. Seat i's local slot 1
/// corresponds to global track position `13*i mod 52`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardState {
    pub seats: [PlayerState; SEAT_COUNT],
}

impl BoardState {
    /// Creates the starting position with every piece in jail.
    pub fn new_game() -> Self {
        BoardState {
            seats: [
                PlayerState::start(),
                PlayerState::start(),
                PlayerState::start(),
                PlayerState::start(),
            ],
        }
    }

    /// Returns the winning seat, if any seat has all four pieces home.
    pub fn winner(&self) -> Option<Seat> {
        self.seats.iter().position(|s| s.has_won())
    }

    /// Panics if any seat's occupancy sum has drifted from 1.0. A violation
    /// here is an internal-consistency failure, never tolerated silently.
    pub fn assert_consistent(&self) {
        for (seat, state) in self.seats.iter().enumerate() {
            assert!(
                state.is_consistent(),
                "seat {} occupancy sum {} != 1.0",
                seat,
                state.occupancy_sum()
            );
        }
    }
}
