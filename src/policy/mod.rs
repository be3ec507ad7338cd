//! Seat policies.
//!
//! A policy answers one question: given the board and the successors for the
//! current dice roll, which successor index do we take? Learning policies
//! additionally expose the `Learner` capability, which the turn controller
//! queries explicitly before routing cross-seat rewards and flushes; seats
//! without it are silently skipped.

pub mod qlearn;
pub mod random;
pub mod strategy;

pub use qlearn::QLearnPolicy;
pub use random::RandomPolicy;
pub use strategy::{Strategy, StrategyPolicy};

use std::str::FromStr;

use thiserror::Error;

use crate::board::{BoardState, Seat};
use crate::eval::SharedValue;
use crate::movegen::Successor;

/// Fatal policy failures. These abort the run rather than being masked.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The approximator produced a non-finite score during action selection,
    /// indicating divergent training.
    #[error("value function returned non-finite score {score} at turn {turn}")]
    NonFiniteScore { score: f64, turn: u64 },
}

/// Seat specifications as accepted on the command line, one letter per seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    QLearn,
    Random,
    Fast,
    Aggressive,
    Defensive,
    Mixed,
}

impl PolicyKind {
    /// Builds a policy for `seat`. Q-learning seats read the shared value
    /// function greedily; `seed` 0 uses entropy.
    pub fn build(self, seat: Seat, value: &SharedValue, seed: u64) -> Box<dyn Policy> {
        match self {
            PolicyKind::QLearn => Box::new(QLearnPolicy::new(seat, value.clone(), false, 0.0, seed)),
            PolicyKind::Random => Box::new(RandomPolicy::new(seed)),
            PolicyKind::Fast => Box::new(StrategyPolicy::new(seat, Strategy::Fast, seed)),
            PolicyKind::Aggressive => {
                Box::new(StrategyPolicy::new(seat, Strategy::Aggressive, seed))
            }
            PolicyKind::Defensive => Box::new(StrategyPolicy::new(seat, Strategy::Defensive, seed)),
            PolicyKind::Mixed => Box::new(StrategyPolicy::new(seat, Strategy::Mixed, seed)),
        }
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Q" | "q" => Ok(PolicyKind::QLearn),
            "R" | "r" => Ok(PolicyKind::Random),
            "F" | "f" => Ok(PolicyKind::Fast),
            "A" | "a" => Ok(PolicyKind::Aggressive),
            "D" | "d" => Ok(PolicyKind::Defensive),
            "M" | "m" => Ok(PolicyKind::Mixed),
            other => Err(format!("unknown seat spec '{}'", other)),
        }
    }
}

/// The decision interface every seat implements.
pub trait Policy {
    /// Short name for reporting.
    fn name(&self) -> &'static str;

    /// Chooses a successor index in `0..successors.len()`. Only called with a
    /// non-empty successor list.
    fn choose(
        &mut self,
        board: &BoardState,
        successors: &[Successor],
        turn: u64,
    ) -> Result<usize, PolicyError>;

    /// Whether this seat's decisions participate in the cross-seat
    /// credit-assignment protocol (loss penalties, predecessor-capture
    /// penalties, and flushes).
    fn shares_rewards(&self) -> bool {
        false
    }

    /// The optional learning capability, mutable.
    fn learner(&mut self) -> Option<&mut dyn Learner> {
        None
    }

    /// The optional learning capability, read-only.
    fn learner_view(&self) -> Option<&dyn Learner> {
        None
    }
}

/// Capability exposed by seats that accumulate shaped rewards and train the
/// shared approximator.
pub trait Learner {
    /// Accumulates a reward delta for this seat's most recent decision.
    fn add_reward(&mut self, delta: f64);

    /// Commits the accumulated reward into one training update (when
    /// training and non-zero) and resets the accumulator.
    fn flush(&mut self);

    /// The reward accumulated since the last flush.
    fn cumulative_reward(&self) -> f64;

    /// Turn number of this seat's most recent decision, if any.
    fn last_decision_turn(&self) -> Option<u64>;
}
