//! Greedy heuristic policies.
//!
//! Each strategy runs a preference pass over the successors and may abstain;
//! abstention falls back to a uniform-random choice. Strategy seats take part
//! in the cross-seat credit-assignment protocol so that learning opponents
//! still receive loss and capture penalties when playing against them.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::{Policy, PolicyError};
use crate::board::{
    is_safe, relative_position, BoardState, Seat, JAIL, PIECE, SEAT_COUNT, TRACK_END,
};
use crate::movegen::Successor;

/// The selection rule a `StrategyPolicy` applies before falling back to
/// random choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Prefer the successor whose piece lands furthest along.
    Fast,
    /// Prefer the first successor that captures an opponent.
    Aggressive,
    /// Prefer the successor leaving the fewest own pieces capturable.
    Defensive,
    /// Defensive, then aggressive, then fast.
    Mixed,
}

/// A heuristic seat driven by one of the fixed strategies.
pub struct StrategyPolicy {
    seat: Seat,
    strategy: Strategy,
    rng: SmallRng,
}

impl StrategyPolicy {
    /// Creates a strategy policy for the given seat. Seed 0 uses entropy.
    pub fn new(seat: Seat, strategy: Strategy, seed: u64) -> Self {
        assert!(seat < SEAT_COUNT, "seat id {} outside 0-3", seat);
        let rng = if seed != 0 {
            SmallRng::seed_from_u64(seed)
        } else {
            SmallRng::from_entropy()
        };
        StrategyPolicy {
            seat,
            strategy,
            rng,
        }
    }
}

impl Policy for StrategyPolicy {
    fn name(&self) -> &'static str {
        match self.strategy {
            Strategy::Fast => "fast",
            Strategy::Aggressive => "aggressive",
            Strategy::Defensive => "defensive",
            Strategy::Mixed => "mixed",
        }
    }

    fn choose(
        &mut self,
        board: &BoardState,
        successors: &[Successor],
        _turn: u64,
    ) -> Result<usize, PolicyError> {
        let preferred = preferred_index(self.strategy, self.seat, board, successors);
        Ok(preferred.unwrap_or_else(|| self.rng.gen_range(0..successors.len())))
    }

    fn shares_rewards(&self) -> bool {
        true
    }
}

/// Runs the preference pass for a strategy. `None` means abstain.
fn preferred_index(
    strategy: Strategy,
    seat: Seat,
    board: &BoardState,
    successors: &[Successor],
) -> Option<usize> {
    match strategy {
        Strategy::Fast => fastest(successors),
        Strategy::Aggressive => first_capture(seat, board, successors),
        Strategy::Defensive => least_exposed(seat, successors),
        Strategy::Mixed => least_exposed(seat, successors)
            .or_else(|| first_capture(seat, board, successors))
            .or_else(|| fastest(successors)),
    }
}

/// The successor with the largest destination slot; first maximum wins.
fn fastest(successors: &[Successor]) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (i, s) in successors.iter().enumerate() {
        if best.map_or(true, |(_, dst)| s.action.1 > dst) {
            best = Some((i, s.action.1));
        }
    }
    best.map(|(i, _)| i)
}

/// The first successor in which some opponent's jail grew by one piece.
fn first_capture(seat: Seat, board: &BoardState, successors: &[Successor]) -> Option<usize> {
    for (i, s) in successors.iter().enumerate() {
        for other in 0..SEAT_COUNT {
            if other == seat {
                continue;
            }
            if s.state.seats[other].slots[JAIL] >= board.seats[other].slots[JAIL] + PIECE {
                return Some(i);
            }
        }
    }
    None
}

/// The successor minimizing the number of own lone pieces left within an
/// opponent's knocking range. Abstains when every successor ties.
fn least_exposed(seat: Seat, successors: &[Successor]) -> Option<usize> {
    let counts: Vec<usize> = successors
        .iter()
        .map(|s| knocking_range_count(seat, &s.state))
        .collect();
    let min = *counts.iter().min()?;
    if counts.iter().all(|&c| c == min) {
        return None;
    }
    counts.iter().position(|&c| c == min)
}

/// Counts this seat's capturable pieces: lone pieces on non-safe shared-track
/// squares with an opposing piece at forward distance 1-6. Opponent stacks
/// count once per piece.
fn knocking_range_count(seat: Seat, board: &BoardState) -> usize {
    let mut count = 0;
    for pos in 1..=TRACK_END {
        let occ = board.seats[seat].slots[pos];
        if occ != PIECE || is_safe(pos) {
            continue;
        }
        for other in 0..SEAT_COUNT {
            if other == seat {
                continue;
            }
            for (op, &opp_occ) in board.seats[other].slots.iter().enumerate() {
                if opp_occ == 0.0 {
                    continue;
                }
                let Some(rel) = relative_position(seat, other, op) else {
                    continue;
                };
                let dist = (pos + 52 - rel) % 52;
                if (1..=6).contains(&dist) {
                    count += (opp_occ / PIECE).round() as usize;
                }
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::successors;

    fn board_with(place: &[(Seat, usize, f64)]) -> BoardState {
        let mut board = BoardState::new_game();
        for &(seat, slot, occ) in place {
            board.seats[seat].slots[slot] += occ;
            board.seats[seat].slots[JAIL] -= occ;
        }
        board
    }

    #[test]
    fn fast_prefers_furthest_destination() {
        let board = board_with(&[(0, 10, 0.25), (0, 40, 0.25)]);
        let succs = successors(&board, 0, 3).unwrap();
        let idx = fastest(&succs).unwrap();
        assert_eq!(succs[idx].action, (40, 43));
    }

    #[test]
    fn aggressive_prefers_capture() {
        // Seat 1 can capture seat 0's piece at seat-1-local 7 with a 4 from
        // slot 3, or advance a far piece instead.
        let board = board_with(&[(0, 20, 0.25), (1, 3, 0.25), (1, 30, 0.25)]);
        let succs = successors(&board, 1, 4).unwrap();
        let idx = first_capture(1, &board, &succs).unwrap();
        assert_eq!(succs[idx].action, (3, 7));
    }

    #[test]
    fn aggressive_abstains_without_capture() {
        let board = board_with(&[(0, 10, 0.25)]);
        let succs = successors(&board, 0, 2).unwrap();
        assert_eq!(first_capture(0, &board, &succs), None);
    }

    #[test]
    fn defensive_moves_the_threatened_piece() {
        // Seat 0's piece at 20 is threatened by seat 1's piece four squares
        // behind it; the piece at 33 is not. Moving the threatened piece out
        // of range leaves fewer exposed pieces.
        let board = board_with(&[(0, 20, 0.25), (0, 33, 0.25), (1, 3, 0.25)]);
        let succs = successors(&board, 0, 6).unwrap();
        let idx = least_exposed(0, &succs).unwrap();
        let chosen = &succs[idx];
        assert_ne!(knocking_range_count(0, &chosen.state), {
            let worst = succs
                .iter()
                .map(|s| knocking_range_count(0, &s.state))
                .max()
                .unwrap();
            worst
        });
    }

    #[test]
    fn defensive_abstains_when_all_tie() {
        let board = board_with(&[(0, 10, 0.25), (0, 30, 0.25)]);
        let succs = successors(&board, 0, 2).unwrap();
        assert_eq!(least_exposed(0, &succs), None);
    }

    #[test]
    fn mixed_falls_through_to_fast() {
        let board = board_with(&[(0, 10, 0.25), (0, 40, 0.25)]);
        let succs = successors(&board, 0, 3).unwrap();
        let idx = preferred_index(Strategy::Mixed, 0, &board, &succs).unwrap();
        assert_eq!(succs[idx].action, (40, 43));
    }

    #[test]
    fn strategy_policies_share_rewards() {
        let policy = StrategyPolicy::new(0, Strategy::Mixed, 1);
        assert!(policy.shares_rewards());
    }
}
