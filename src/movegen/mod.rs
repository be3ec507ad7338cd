//! Legal successor generation.
//!
//! Enumerates every legal resulting board state for a given seat and dice
//! value, encoding the release, movement, blockade, capture, and overshoot
//! rules as pure state transitions. Successors are value-semantics
//! snapshots: each candidate move forks the board rather than mutating a
//! live state.

pub mod classify;

pub use classify::Categories;

use crate::board::{
    is_safe, track_occupancy, BoardState, Seat, HOME, JAIL, PIECE, SEAT_COUNT, TRACK_END,
    TRANSITION,
};

/// A candidate next board state reachable by one dice-conditioned move.
#[derive(Debug, Clone, PartialEq)]
pub struct Successor {
    /// The board after the move, including any captures.
    pub state: BoardState,
    /// Departure and arrival slots of the acting piece, in the acting seat's
    /// local frame. A release is `(0, 1)`.
    pub action: (usize, usize),
    /// Semantic move categories. `RANDOM` is always set.
    pub categories: Categories,
}

/// Enumerates every legal successor for `seat` rolling `dice`.
///
/// Returns `None` when the game is already over or the seat has no legal
/// move; passing the turn is not an error. Dice values outside 1-6 and seat
/// ids outside 0-3 are contract violations and panic.
pub fn successors(board: &BoardState, seat: Seat, dice: u8) -> Option<Vec<Successor>> {
    assert!((1..=6).contains(&dice), "dice value {} outside 1-6", dice);
    assert!(seat < SEAT_COUNT, "seat id {} outside 0-3", seat);

    // Terminal state: nobody moves once a seat has all pieces home.
    if board.winner().is_some() {
        return None;
    }

    let own = &board.seats[seat].slots;
    let mut out: Vec<Successor> = Vec::new();

    // Release: a 6 brings one piece out of jail onto the entry square.
    // Slot 1 is safe, so no blockade or capture check applies.
    if own[JAIL] > 0.0 && dice == 6 {
        let mut next = board.clone();
        next.seats[seat].slots[JAIL] -= PIECE;
        next.seats[seat].slots[1] += PIECE;
        out.push(Successor {
            state: next,
            action: (JAIL, 1),
            categories: Categories::RANDOM,
        });
    }

    // Movement: every occupied slot on the track or home stretch.
    for loc in 1..HOME {
        if own[loc] == 0.0 {
            continue;
        }

        if path_blocked(board, seat, loc, dice) {
            continue;
        }

        // The transitional square is logically skipped by its owner.
        let mut new_loc = loc + dice as usize;
        if loc <= TRANSITION && new_loc >= TRANSITION {
            new_loc += 1;
        }
        if new_loc > HOME {
            // Overshoot: the piece cannot move past home.
            continue;
        }

        let mut next = board.clone();
        next.seats[seat].slots[loc] -= PIECE;
        next.seats[seat].slots[new_loc] += PIECE;
        apply_captures(&mut next, seat, new_loc);
        next.assert_consistent();

        out.push(Successor {
            state: next,
            action: (loc, new_loc),
            categories: Categories::RANDOM,
        });
    }

    if out.is_empty() {
        return None;
    }

    for succ in out.iter_mut() {
        succ.categories = classify::classify(board, seat, succ.action, &succ.state);
    }
    Some(out)
}

/// Checks whether a blockade blocks the path from `loc` over `dice` squares.
///
/// The scanned window runs from the square after `loc` up to and including
/// the landing square, widened by one where it crosses the skipped
/// transitional slot. Safe squares, slot 52 itself, and anything at or past
/// home are exempt. The acting seat's own stacks block anywhere; other
/// seats' stacks (seen through rotation) block only on the shared track.
fn path_blocked(board: &BoardState, seat: Seat, loc: usize, dice: u8) -> bool {
    let lo = loc + 1;
    let mut hi = lo + dice as usize;
    if lo <= TRANSITION && TRANSITION < hi {
        hi += 1;
    }

    for tmp in lo..hi {
        if tmp == TRANSITION || tmp >= HOME || is_safe(tmp) {
            continue;
        }
        if board.seats[seat].slots[tmp] >= 0.5 {
            return true;
        }
        if tmp <= TRACK_END {
            for order in 1..SEAT_COUNT {
                if track_occupancy(board, seat, order, tmp) >= 0.5 {
                    return true;
                }
            }
        }
    }
    false
}

/// Sends every opposing piece on the landed square back to its jail.
/// Safe squares and private slots never trigger captures.
fn apply_captures(board: &mut BoardState, seat: Seat, new_loc: usize) {
    if new_loc > TRACK_END || is_safe(new_loc) {
        return;
    }
    for order in 1..SEAT_COUNT {
        let taken = track_occupancy(board, seat, order, new_loc);
        if taken > 0.0 {
            crate::board::set_track_occupancy(board, seat, order, new_loc, 0.0);
            board.seats[(seat + order) % SEAT_COUNT].slots[JAIL] += taken;
        }
    }
}
