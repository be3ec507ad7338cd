//! Turn controller.
//!
//! Drives a four-seat game: roll (or accept) a dice value, enumerate the
//! successors, let the seat's policy pick one, commit it, and advance. The
//! controller also owns the credit-assignment protocol: it routes loss and
//! capture penalties to the learners of other seats and flushes every
//! learner after a reward-sharing seat commits, so policies never reach into
//! each other.

use rand::Rng;

use crate::board::{BoardState, Seat, HOME, JAIL, SEAT_COUNT};
use crate::movegen::{successors, Categories};
use crate::policy::{Policy, PolicyError};

/// Safety valve for drivers that play games to completion.
pub const MAX_TURNS: u64 = 100_000;

/// Where the controller stands in the turn cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// Waiting for the next dice value.
    AwaitingDice,
    /// Successors enumerated, waiting on the seat's policy.
    AwaitingPolicy,
    /// A successor was committed this turn.
    Committed,
    /// A seat has won; no further turns are accepted.
    Terminal,
}

/// What one turn did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnRecord {
    pub turn: u64,
    pub seat: Seat,
    pub dice: u8,
    /// `None` when the seat had no legal move and the turn passed.
    pub action: Option<(usize, usize)>,
    pub categories: Categories,
    pub won: bool,
}

/// Result of playing a game to completion.
#[derive(Debug, Clone)]
pub struct GameOutcome {
    /// `None` only if the turn cap was hit.
    pub winner: Option<Seat>,
    pub turns: u64,
    pub board: BoardState,
}

/// A four-seat game in progress.
pub struct Game {
    board: BoardState,
    policies: Vec<Box<dyn Policy>>,
    current_seat: Seat,
    turn: u64,
    phase: TurnPhase,
}

impl Game {
    /// Starts from the all-jail opening position with seat 0 to move.
    pub fn new(policies: Vec<Box<dyn Policy>>) -> Self {
        Game::with_board(policies, BoardState::new_game())
    }

    /// Starts from an arbitrary consistent position.
    pub fn with_board(policies: Vec<Box<dyn Policy>>, board: BoardState) -> Self {
        assert_eq!(policies.len(), SEAT_COUNT, "need one policy per seat");
        board.assert_consistent();
        let phase = if board.winner().is_some() {
            TurnPhase::Terminal
        } else {
            TurnPhase::AwaitingDice
        };
        Game {
            board,
            policies,
            current_seat: 0,
            turn: 0,
            phase,
        }
    }

    /// Picks which seat moves first.
    pub fn set_start_seat(&mut self, seat: Seat) {
        assert!(seat < SEAT_COUNT, "seat id {} outside 0-3", seat);
        self.current_seat = seat;
    }

    pub fn board(&self) -> &BoardState {
        &self.board
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn current_seat(&self) -> Seat {
        self.current_seat
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn policy(&self, seat: Seat) -> &dyn Policy {
        self.policies[seat].as_ref()
    }

    pub fn policy_mut(&mut self, seat: Seat) -> &mut dyn Policy {
        self.policies[seat].as_mut()
    }

    /// Rolls a dice value and plays one turn.
    pub fn play_turn(&mut self, rng: &mut impl Rng) -> Result<TurnRecord, PolicyError> {
        let dice = rng.gen_range(1..=6);
        self.play_turn_with_dice(dice)
    }

    /// Plays one turn with a caller-supplied dice value.
    ///
    /// A seat without legal moves passes; the seat pointer and turn counter
    /// still advance. Panics if the game is already over.
    pub fn play_turn_with_dice(&mut self, dice: u8) -> Result<TurnRecord, PolicyError> {
        assert!(self.phase != TurnPhase::Terminal, "game is over");
        let seat = self.current_seat;
        let turn = self.turn;

        let mut record = TurnRecord {
            turn,
            seat,
            dice,
            action: None,
            categories: Categories::default(),
            won: false,
        };

        if let Some(succs) = successors(&self.board, seat, dice) {
            self.phase = TurnPhase::AwaitingPolicy;
            let index = self.policies[seat].choose(&self.board, &succs, turn)?;
            assert!(
                index < succs.len(),
                "policy '{}' chose index {} of {} successors",
                self.policies[seat].name(),
                index,
                succs.len()
            );
            let chosen = &succs[index];
            record.action = Some(chosen.action);
            record.categories = chosen.categories;

            let previous = std::mem::replace(&mut self.board, chosen.state.clone());
            self.phase = TurnPhase::Committed;
            record.won = self.board.seats[seat].slots[HOME] == 1.0;

            if self.policies[seat].shares_rewards() {
                self.assign_credit(seat, turn, &previous, record.won);
            }
        }

        self.turn += 1;
        self.current_seat = (seat + 1) % SEAT_COUNT;
        self.phase = if record.won {
            TurnPhase::Terminal
        } else {
            TurnPhase::AwaitingDice
        };
        Ok(record)
    }

    /// Routes cross-seat penalties and flushes every learner, in seat order
    /// `seat, seat-1, seat-2, seat-3`. Seats without a learner are skipped.
    fn assign_credit(&mut self, seat: Seat, turn: u64, previous: &BoardState, won: bool) {
        if won {
            for order in 1..SEAT_COUNT {
                let other = (seat + order) % SEAT_COUNT;
                if let Some(learner) = self.policies[other].learner() {
                    learner.add_reward(-1.0);
                }
            }
        }

        // A capture of the immediately preceding seat undoes the move that
        // seat committed one turn ago.
        let prev_seat = (seat + SEAT_COUNT - 1) % SEAT_COUNT;
        let jail_grew =
            self.board.seats[prev_seat].slots[JAIL] > previous.seats[prev_seat].slots[JAIL];
        if jail_grew && turn > 0 {
            if let Some(learner) = self.policies[prev_seat].learner() {
                if learner.last_decision_turn() == Some(turn - 1) {
                    learner.add_reward(-0.25);
                }
            }
        }

        for order in 0..SEAT_COUNT {
            let target = (seat + SEAT_COUNT - order) % SEAT_COUNT;
            if let Some(learner) = self.policies[target].learner() {
                learner.flush();
            }
        }
    }

    /// Plays turns until a seat wins or the turn cap is hit.
    pub fn play(&mut self, rng: &mut impl Rng) -> Result<GameOutcome, PolicyError> {
        while self.phase != TurnPhase::Terminal && self.turn < MAX_TURNS {
            self.play_turn(rng)?;
        }
        Ok(GameOutcome {
            winner: self.board.winner(),
            turns: self.turn,
            board: self.board.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use crate::policy::RandomPolicy;

    fn random_seats() -> Vec<Box<dyn Policy>> {
        (0..SEAT_COUNT)
            .map(|i| Box::new(RandomPolicy::new(40 + i as u64)) as Box<dyn Policy>)
            .collect()
    }

    #[test]
    fn turn_passes_when_jailed_without_a_six() {
        let mut game = Game::new(random_seats());
        let record = game.play_turn_with_dice(3).unwrap();
        assert_eq!(record.action, None);
        assert_eq!(game.turn(), 1);
        assert_eq!(game.current_seat(), 1);
        assert_eq!(game.phase(), TurnPhase::AwaitingDice);
        assert_eq!(*game.board(), BoardState::new_game());
    }

    #[test]
    fn six_releases_and_commits() {
        let mut game = Game::new(random_seats());
        let record = game.play_turn_with_dice(6).unwrap();
        assert_eq!(record.action, Some((JAIL, 1)));
        assert_eq!(game.board().seats[0].slots[1], 0.25);
        assert_eq!(game.board().seats[0].slots[JAIL], 0.75);
    }

    #[test]
    fn start_seat_is_respected() {
        let mut game = Game::new(random_seats());
        game.set_start_seat(2);
        let record = game.play_turn_with_dice(6).unwrap();
        assert_eq!(record.seat, 2);
        assert_eq!(game.current_seat(), 3);
    }

    #[test]
    fn winning_move_terminates_the_game() {
        let mut board = BoardState::new_game();
        board.seats[0].slots[JAIL] = 0.0;
        board.seats[0].slots[HOME] = 0.75;
        board.seats[0].slots[55] = 0.25;
        let mut game = Game::with_board(random_seats(), board);
        let record = game.play_turn_with_dice(3).unwrap();
        assert!(record.won);
        assert_eq!(game.phase(), TurnPhase::Terminal);
        assert_eq!(game.board().winner(), Some(0));
    }

    #[test]
    #[should_panic(expected = "game is over")]
    fn playing_a_finished_game_panics() {
        let mut board = BoardState::new_game();
        board.seats[1].slots[JAIL] = 0.0;
        board.seats[1].slots[HOME] = 1.0;
        let mut game = Game::with_board(random_seats(), board);
        let _ = game.play_turn_with_dice(4);
    }

    #[test]
    fn random_game_reaches_a_winner() {
        let mut game = Game::new(random_seats());
        let mut rng = SmallRng::seed_from_u64(7);
        let outcome = game.play(&mut rng).unwrap();
        assert!(outcome.winner.is_some());
        assert!(outcome.turns > 0);
        outcome.board.assert_consistent();
        assert_eq!(outcome.board.seats[outcome.winner.unwrap()].slots[HOME], 1.0);
    }
}
