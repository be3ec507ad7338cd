//! Board representation and coordinate math.
//!
//! Contains the per-seat occupancy vectors, the full board state, and the
//! rotation transforms that let any seat reason about any other seat's
//! pieces in its own local frame.

pub mod rotation;
pub mod state;

pub use rotation::{relative_position, rotated_slot, set_track_occupancy, track_occupancy};
pub use state::{
    is_safe, BoardState, PlayerState, Seat, HOME, JAIL, PIECE, SAFE_SQUARES, SEAT_COUNT,
    SLOT_COUNT, TRACK_END, TRANSITION,
};
