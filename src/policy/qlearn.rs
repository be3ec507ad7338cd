//! Q-learning policy.
//!
//! One shared value-function approximator serves all four seats: feature
//! vectors are always expressed from the acting seat's own point of view, so
//! the same weights apply at every seat. Each seat retains its most recent
//! decision as a pending transition and accumulates shaped rewards until the
//! credit-assignment protocol flushes it into a single training update.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::{Learner, Policy, PolicyError};
use crate::board::{is_safe, BoardState, Seat, HOME, JAIL, SEAT_COUNT, TRACK_END};
use crate::eval::{SharedValue, ValueFunction};
use crate::movegen::{classify, successors, Successor};

/// Q-learning step size applied at flush time.
pub const LEARNING_RATE: f64 = 0.5;

/// Discount applied to the bootstrapped future-value estimate.
pub const DISCOUNT_RATE: f64 = 0.95;

/// Feature vector length: four 59-slot occupancy vectors plus the
/// normalized action source and destination.
pub const NUM_FEATURES: usize = 4 * 59 + 2;

/// Maximum lookahead depth for the bootstrap walk. Depth 4 reaches the
/// acting seat's own next turn.
pub const MAX_LOOKAHEAD: usize = 4;

/// A decision retained until the credit-assignment protocol consumes it.
struct PendingTransition {
    old: BoardState,
    action: (usize, usize),
    new: BoardState,
}

/// A seat that learns a shared action-value function by self-play.
pub struct QLearnPolicy {
    seat: Seat,
    value: SharedValue,
    train: bool,
    epsilon: f64,
    lookahead: usize,
    rng: SmallRng,
    pending: Option<PendingTransition>,
    cum_reward: f64,
    last_turn: Option<u64>,
}

impl QLearnPolicy {
    /// Creates a learning seat. `epsilon` only applies in training mode.
    /// Seed 0 uses entropy.
    pub fn new(seat: Seat, value: SharedValue, train: bool, epsilon: f64, seed: u64) -> Self {
        assert!(seat < SEAT_COUNT, "seat id {} outside 0-3", seat);
        let rng = if seed != 0 {
            SmallRng::seed_from_u64(seed)
        } else {
            SmallRng::from_entropy()
        };
        QLearnPolicy {
            seat,
            value,
            train,
            epsilon,
            lookahead: 1,
            rng,
            pending: None,
            cum_reward: 0.0,
            last_turn: None,
        }
    }

    /// Sets the exploration rate for subsequent decisions.
    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon;
    }

    /// Sets the bootstrap lookahead depth, clamped to `1..=MAX_LOOKAHEAD`.
    pub fn set_lookahead(&mut self, depth: usize) {
        self.lookahead = depth.clamp(1, MAX_LOOKAHEAD);
    }

    /// Accumulates the shaped rewards this seat earns for its own decision.
    /// Cross-seat penalties are routed by the turn controller.
    fn accumulate_own_rewards(&mut self, old: &BoardState, action: (usize, usize), new: &BoardState) {
        // Winning the game.
        if new.seats[self.seat].slots[HOME] == 1.0 {
            self.cum_reward += 1.0;
        }

        // Releasing a piece from jail.
        if new.seats[self.seat].slots[JAIL] < old.seats[self.seat].slots[JAIL] {
            self.cum_reward += 0.25;
        }

        // Moving a vulnerable piece out of harm's way.
        if classify::is_defensive(old, self.seat, action) {
            self.cum_reward += 0.2;
        }

        // Capturing opponents: one quarter unit of jail growth nets 0.15.
        for order in 1..SEAT_COUNT {
            let other = (self.seat + SEAT_COUNT - order) % SEAT_COUNT;
            let diff = new.seats[other].slots[JAIL] - old.seats[other].slots[JAIL];
            if diff > 0.0 {
                self.cum_reward += 0.15 * diff * 4.0;
            }
        }

        // Newly forming a blockade on a non-safe shared-track square.
        for slot in 1..=TRACK_END {
            if is_safe(slot) {
                continue;
            }
            if new.seats[self.seat].slots[slot] >= 0.5 && old.seats[self.seat].slots[slot] < 0.5 {
                self.cum_reward += 0.05;
                break;
            }
        }
    }
}

impl Policy for QLearnPolicy {
    fn name(&self) -> &'static str {
        "qlearn"
    }

    fn choose(
        &mut self,
        board: &BoardState,
        succs: &[Successor],
        turn: u64,
    ) -> Result<usize, PolicyError> {
        let index = if self.train && self.rng.gen::<f64>() < self.epsilon {
            self.rng.gen_range(0..succs.len())
        } else {
            let scores: Vec<f64> = {
                let value = self.value.lock().expect("value function mutex poisoned");
                succs
                    .iter()
                    .map(|s| value.evaluate(&encode(board, self.seat, s.action)))
                    .collect()
            };
            let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            if !max.is_finite() {
                return Err(PolicyError::NonFiniteScore { score: max, turn });
            }
            // Break ties among the maxima uniformly at random.
            let candidates: Vec<usize> = scores
                .iter()
                .enumerate()
                .filter(|(_, &q)| q == max)
                .map(|(i, _)| i)
                .collect();
            candidates[self.rng.gen_range(0..candidates.len())]
        };

        let chosen = &succs[index];
        self.pending = Some(PendingTransition {
            old: board.clone(),
            action: chosen.action,
            new: chosen.state.clone(),
        });
        self.last_turn = Some(turn);
        self.accumulate_own_rewards(board, chosen.action, &chosen.state);
        Ok(index)
    }

    fn shares_rewards(&self) -> bool {
        true
    }

    fn learner(&mut self) -> Option<&mut dyn Learner> {
        Some(self)
    }

    fn learner_view(&self) -> Option<&dyn Learner> {
        Some(self)
    }
}

impl Learner for QLearnPolicy {
    fn add_reward(&mut self, delta: f64) {
        self.cum_reward += delta;
    }

    fn flush(&mut self) {
        if !self.train || self.cum_reward == 0.0 {
            self.cum_reward = 0.0;
            return;
        }

        if let Some(pending) = &self.pending {
            let features = encode(&pending.old, self.seat, pending.action);
            let mut value = self.value.lock().expect("value function mutex poisoned");
            let old_q = value.evaluate(&features);
            let future = bootstrap_estimate(&*value, &pending.new, self.seat, self.lookahead);
            let target = old_q + LEARNING_RATE * (self.cum_reward - DISCOUNT_RATE * future - old_q);
            value.train(&features, target);
        }

        self.cum_reward = 0.0;
    }

    fn cumulative_reward(&self) -> f64 {
        self.cum_reward
    }

    fn last_decision_turn(&self) -> Option<u64> {
        self.last_turn
    }
}

/// Encodes a state-action pair for the approximator.
///
/// All four occupancy vectors are concatenated in seat-rotated order starting
/// from the deciding seat, followed by the action's source and destination
/// slots normalized by the final slot index.
pub fn encode(board: &BoardState, seat: Seat, action: (usize, usize)) -> Vec<f64> {
    let mut inputs = Vec::with_capacity(NUM_FEATURES);
    for order in 0..SEAT_COUNT {
        inputs.extend_from_slice(&board.seats[(seat + order) % SEAT_COUNT].slots);
    }
    inputs.push(action.0 as f64 / HOME as f64);
    inputs.push(action.1 as f64 / HOME as f64);
    inputs
}

/// Bootstrapped best-case future value after `seat`'s committed move.
///
/// An explicit bounded walk over (seat, dice, successor) triples: each ply
/// belongs to the next seat in turn order, every dice value 1-6 is
/// enumerated, and at the final ply each candidate is scored in the moving
/// seat's own frame against the board it would decide from. Returns the
/// maximum score, or 0 when the state is terminal or no candidate exists.
pub fn bootstrap_estimate(
    value: &dyn ValueFunction,
    board: &BoardState,
    seat: Seat,
    depth: usize,
) -> f64 {
    debug_assert!((1..=MAX_LOOKAHEAD).contains(&depth));
    if board.winner().is_some() {
        return 0.0;
    }
    let mut best = f64::NEG_INFINITY;
    walk(value, board, seat, 1, depth, &mut best);
    if best == f64::NEG_INFINITY {
        0.0
    } else {
        best
    }
}

fn walk(
    value: &dyn ValueFunction,
    board: &BoardState,
    seat: Seat,
    ply: usize,
    depth: usize,
    best: &mut f64,
) {
    let mover = (seat + ply) % SEAT_COUNT;
    for dice in 1..=6 {
        let Some(succs) = successors(board, mover, dice) else {
            continue;
        };
        for s in succs {
            if ply == depth {
                let q = value.evaluate(&encode(board, mover, s.action));
                if q > *best {
                    *best = q;
                }
            } else {
                walk(value, &s.state, seat, ply + 1, depth, best);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{shared, ConstantValue};

    fn board_with(place: &[(Seat, usize, f64)]) -> BoardState {
        let mut board = BoardState::new_game();
        for &(seat, slot, occ) in place {
            board.seats[seat].slots[slot] += occ;
            board.seats[seat].slots[JAIL] -= occ;
        }
        board
    }

    #[test]
    fn encoding_has_expected_layout() {
        let board = board_with(&[(2, 20, 0.25)]);
        let inputs = encode(&board, 2, (20, 24));
        assert_eq!(inputs.len(), NUM_FEATURES);
        // Seat 2's own vector comes first.
        assert_eq!(inputs[20], 0.25);
        assert_eq!(inputs[JAIL], 0.75);
        // The other three seats follow fully jailed.
        assert_eq!(inputs[59], 1.0);
        assert_eq!(inputs[118], 1.0);
        assert_eq!(inputs[177], 1.0);
        assert_eq!(inputs[236], 20.0 / 58.0);
        assert_eq!(inputs[237], 24.0 / 58.0);
    }

    #[test]
    fn encoding_is_seat_invariant() {
        // A rotationally symmetric position must encode identically from
        // every seat's point of view.
        let mut board = BoardState::new_game();
        for seat in 0..SEAT_COUNT {
            board.seats[seat].slots[JAIL] = 0.75;
            board.seats[seat].slots[10] = 0.25;
        }
        let reference = encode(&board, 0, (10, 14));
        for seat in 1..SEAT_COUNT {
            assert_eq!(encode(&board, seat, (10, 14)), reference);
        }
    }

    #[test]
    fn greedy_choice_picks_single_option() {
        let board = board_with(&[(0, 10, 0.25)]);
        let succs = successors(&board, 0, 3).unwrap();
        let mut policy = QLearnPolicy::new(0, shared(ConstantValue(1.0)), false, 0.0, 3);
        assert_eq!(policy.choose(&board, &succs, 0).unwrap(), 0);
        assert_eq!(policy.last_decision_turn(), Some(0));
    }

    #[test]
    fn non_finite_score_is_fatal() {
        let board = board_with(&[(0, 10, 0.25)]);
        let succs = successors(&board, 0, 3).unwrap();
        let mut policy = QLearnPolicy::new(0, shared(ConstantValue(f64::NAN)), false, 0.0, 3);
        let err = policy.choose(&board, &succs, 5).unwrap_err();
        assert!(matches!(err, PolicyError::NonFiniteScore { turn: 5, .. }));
    }

    #[test]
    fn release_reward_accumulates() {
        let board = BoardState::new_game();
        let succs = successors(&board, 0, 6).unwrap();
        let mut policy = QLearnPolicy::new(0, shared(ConstantValue(1.0)), true, 0.0, 3);
        policy.choose(&board, &succs, 0).unwrap();
        assert!((policy.cumulative_reward() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn capture_reward_nets_015_per_piece() {
        let board = board_with(&[(0, 20, 0.25), (1, 3, 0.25)]);
        let succs = successors(&board, 1, 4).unwrap();
        let mut policy = QLearnPolicy::new(1, shared(ConstantValue(1.0)), true, 0.0, 3);
        policy.choose(&board, &succs, 0).unwrap();
        assert!((policy.cumulative_reward() - 0.15).abs() < 1e-12);
    }

    #[test]
    fn blockade_reward_applies_once() {
        // Moving 16 -> 20 joins the piece already at 20.
        let board = board_with(&[(0, 20, 0.25), (0, 16, 0.25)]);
        let succs = successors(&board, 0, 4).unwrap();
        let join = succs.iter().position(|s| s.action == (16, 20)).unwrap();
        let mut policy = QLearnPolicy::new(0, shared(ConstantValue(1.0)), true, 0.0, 3);
        // Force the greedy path to the joining move by making it the only
        // successor offered.
        let only = vec![succs[join].clone()];
        policy.choose(&board, &only, 0).unwrap();
        assert!((policy.cumulative_reward() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn flush_resets_accumulator_without_training_when_idle() {
        let mut policy = QLearnPolicy::new(0, shared(ConstantValue(1.0)), true, 0.0, 3);
        policy.add_reward(-1.0);
        assert_eq!(policy.cumulative_reward(), -1.0);
        // No pending transition: the accumulator still resets.
        policy.flush();
        assert_eq!(policy.cumulative_reward(), 0.0);
    }

    #[test]
    fn bootstrap_of_terminal_state_is_zero() {
        let mut board = BoardState::new_game();
        board.seats[1].slots[JAIL] = 0.0;
        board.seats[1].slots[HOME] = 1.0;
        let value = ConstantValue(7.0);
        assert_eq!(bootstrap_estimate(&value, &board, 0, 1), 0.0);
    }

    #[test]
    fn bootstrap_takes_maximum_over_replies() {
        // Next seat has moves; a constant scorer makes the maximum equal to
        // the constant.
        let board = board_with(&[(1, 10, 0.25)]);
        let value = ConstantValue(0.4);
        let est = bootstrap_estimate(&value, &board, 0, 1);
        assert_eq!(est, 0.4);
    }

    #[test]
    fn deeper_lookahead_is_bounded() {
        let board = board_with(&[(0, 10, 0.25), (1, 20, 0.25), (2, 5, 0.25), (3, 40, 0.25)]);
        let value = ConstantValue(0.25);
        for depth in 1..=MAX_LOOKAHEAD {
            let est = bootstrap_estimate(&value, &board, 0, depth);
            assert_eq!(est, 0.25, "depth {}", depth);
        }
    }

    #[test]
    fn lookahead_setter_clamps() {
        let mut policy = QLearnPolicy::new(0, shared(ConstantValue(0.0)), false, 0.0, 1);
        policy.set_lookahead(10);
        assert_eq!(policy.lookahead, MAX_LOOKAHEAD);
        policy.set_lookahead(0);
        assert_eq!(policy.lookahead, 1);
    }
}
