//! Uniform-random policy.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::{Policy, PolicyError};
use crate::board::BoardState;
use crate::movegen::Successor;

/// Picks a successor uniformly at random. Does not take part in the
/// credit-assignment protocol.
pub struct RandomPolicy {
    rng: SmallRng,
}

impl RandomPolicy {
    /// Creates a random policy. Seed 0 uses entropy.
    pub fn new(seed: u64) -> Self {
        let rng = if seed != 0 {
            SmallRng::seed_from_u64(seed)
        } else {
            SmallRng::from_entropy()
        };
        RandomPolicy { rng }
    }
}

impl Policy for RandomPolicy {
    fn name(&self) -> &'static str {
        "random"
    }

    fn choose(
        &mut self,
        _board: &BoardState,
        successors: &[Successor],
        _turn: u64,
    ) -> Result<usize, PolicyError> {
        Ok(self.rng.gen_range(0..successors.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::successors;

    #[test]
    fn choice_is_always_in_range() {
        let board = BoardState::new_game();
        let succs = successors(&board, 0, 6).unwrap();
        let mut policy = RandomPolicy::new(5);
        for turn in 0..20 {
            let idx = policy.choose(&board, &succs, turn).unwrap();
            assert!(idx < succs.len());
        }
    }

    #[test]
    fn random_policy_has_no_learner() {
        let mut policy = RandomPolicy::new(1);
        assert!(!policy.shares_rewards());
        assert!(policy.learner().is_none());
        assert!(policy.learner_view().is_none());
    }
}
