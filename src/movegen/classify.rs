//! Transition classification.
//!
//! Labels each successor with a bitmask of semantic move categories derived
//! from how the transition changed the board. Categories are additive flags
//! on top of the baseline `RANDOM` category, which every move carries.

use crate::board::{is_safe, BoardState, Seat, HOME, JAIL, PIECE, SEAT_COUNT, TRACK_END};

/// Bitmask of semantic move categories. Not mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Categories(pub u8);

impl Categories {
    /// The moved piece was alone, unprotected, and in an opponent's
    /// knocking range before the move.
    pub const DEFENSIVE: Categories = Categories(1);
    /// The move captured at least one opposing piece.
    pub const AGGRESSIVE: Categories = Categories(2);
    /// The seat's piece closest to home advanced.
    pub const FAST: Categories = Categories(4);
    /// A piece left jail.
    pub const RELEASE: Categories = Categories(8);
    /// Baseline category; set on every move.
    pub const RANDOM: Categories = Categories(16);

    /// Returns true if every flag in `other` is set.
    pub fn contains(self, other: Categories) -> bool {
        self.0 & other.0 == other.0
    }

    /// Sets the flags in `other`.
    pub fn insert(&mut self, other: Categories) {
        self.0 |= other.0;
    }
}

/// Classifies a committed transition for `seat`, from the pre-move board.
pub fn classify(
    old: &BoardState,
    seat: Seat,
    action: (usize, usize),
    new: &BoardState,
) -> Categories {
    let mut categories = Categories::RANDOM;
    if is_defensive(old, seat, action) {
        categories.insert(Categories::DEFENSIVE);
    }
    if is_aggressive(old, seat, new) {
        categories.insert(Categories::AGGRESSIVE);
    }
    if is_fast(old, seat, new) {
        categories.insert(Categories::FAST);
    }
    if is_release(old, seat, new) {
        categories.insert(Categories::RELEASE);
    }
    categories
}

/// A move is defensive when the departed slot held a lone, capturable piece:
/// on the shared track, not on a safe square, exactly one quarter unit, and
/// within forward knocking distance 1-6 of some opposing piece.
pub fn is_defensive(old: &BoardState, seat: Seat, action: (usize, usize)) -> bool {
    let src = action.0;
    if !(1..=TRACK_END).contains(&src) || is_safe(src) {
        return false;
    }
    if old.seats[seat].slots[src] != PIECE {
        return false;
    }

    for order in 1..SEAT_COUNT {
        // The departed slot as numbered by this opponent. The boundary case
        // maps to 0 here, which no opponent piece in 1..52 can reach with a
        // positive forward distance, so it needs no special handling.
        let src_in_opp = (src as i64 - 13 * order as i64).rem_euclid(52) as usize;
        let opp = &old.seats[(seat + order) % SEAT_COUNT].slots;
        for op in 1..52 {
            if opp[op] == 0.0 {
                continue;
            }
            let dist = src_in_opp as i64 - op as i64;
            if (1..=6).contains(&dist) {
                return true;
            }
        }
    }
    false
}

/// A move is aggressive when any other seat's jail occupancy grew.
pub fn is_aggressive(old: &BoardState, seat: Seat, new: &BoardState) -> bool {
    (1..SEAT_COUNT).any(|order| {
        let other = (seat + order) % SEAT_COUNT;
        new.seats[other].slots[JAIL] > old.seats[other].slots[JAIL]
    })
}

/// A move is fast when the seat's piece closest to home advanced. The scan
/// runs from slot 57 downward and stops at the first occupied slot; jailed
/// pieces are never considered.
pub fn is_fast(old: &BoardState, seat: Seat, new: &BoardState) -> bool {
    for slot in (1..HOME).rev() {
        if old.seats[seat].slots[slot] > 0.0 {
            return new.seats[seat].slots[slot] < old.seats[seat].slots[slot];
        }
    }
    false
}

/// A move is a release when the seat's own jail occupancy shrank.
pub fn is_release(old: &BoardState, seat: Seat, new: &BoardState) -> bool {
    new.seats[seat].slots[JAIL] < old.seats[seat].slots[JAIL]
}
