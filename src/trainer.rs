//! Self-play training loop.
//!
//! Four learning seats share one approximator and play full games against
//! each other, strictly sequentially so every training update sees the
//! freshest weights. Checkpoints and win-rate measurements happen on fixed
//! episode intervals; the measurement games are read-only and run in
//! parallel with rayon.

use std::io;
use std::path::PathBuf;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;
use thiserror::Error;

use crate::eval::{shared, MlpValue, SharedValue};
use crate::game::Game;
use crate::policy::qlearn::NUM_FEATURES;
use crate::policy::{Policy, PolicyError, PolicyKind, QLearnPolicy};

/// Training run failures.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error("checkpoint i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("policy failure: {0}")]
    Policy(#[from] PolicyError),
    #[error("thread pool construction failed: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Knobs for a training run.
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    /// Number of self-play episodes.
    pub episodes: u64,
    /// Exploration rate at episode 0; decays linearly to zero over the
    /// first tenth of the run.
    pub epsilon_max: f64,
    /// Bootstrap lookahead depth, 1-4.
    pub lookahead: usize,
    /// Episodes between checkpoints.
    pub checkpoint_interval: u64,
    /// Episodes between win-rate measurements.
    pub eval_interval: u64,
    /// Games per win-rate measurement.
    pub eval_games: usize,
    /// Worker threads for win-rate measurement; 0 uses the rayon default.
    pub eval_threads: usize,
    /// Checkpoint path. An existing file is loaded and training resumes
    /// from its weights.
    pub model_out: PathBuf,
    /// Master seed; 0 uses entropy.
    pub seed: u64,
    /// Suppress progress lines on stderr.
    pub quiet: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            episodes: 100_000,
            epsilon_max: 0.9,
            lookahead: 1,
            checkpoint_interval: 1_000,
            eval_interval: 20_000,
            eval_games: 1_000,
            eval_threads: 0,
            model_out: PathBuf::from("qlearn-model.json"),
            seed: 0,
            quiet: false,
        }
    }
}

/// One win-rate measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalPoint {
    pub episode: u64,
    /// Win rate of the greedy learner at seat 0 against three random seats.
    pub vs_random: f64,
    /// Same, against three mixed-strategy seats.
    pub vs_mixed: f64,
}

/// Summary of a completed training run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub episodes: u64,
    /// Self-play wins per seat.
    pub wins: [u64; 4],
    pub evals: Vec<EvalPoint>,
}

/// Exploration rate for `episode` under the linear warmup-decay schedule.
pub fn epsilon_for(episode: u64, config: &TrainerConfig) -> f64 {
    let cutoff = config.episodes as f64 / 10.0;
    let e = episode as f64;
    if e >= cutoff {
        return 0.0;
    }
    if cutoff <= 1.0 {
        // Runs of ten episodes or fewer have no room to decay; the only
        // warmup episode still explores at the full rate.
        return config.epsilon_max;
    }
    (cutoff - 1.0 - e) * config.epsilon_max / (cutoff - 1.0)
}

/// Runs self-play training per `config` and returns the report. The final
/// weights are always written to `config.model_out`.
pub fn run_training(config: &TrainerConfig) -> Result<TrainingReport, TrainError> {
    let value = if config.model_out.exists() {
        if !config.quiet {
            eprintln!("resuming from {}", config.model_out.display());
        }
        shared(MlpValue::load(&config.model_out)?)
    } else {
        shared(MlpValue::new(NUM_FEATURES, config.seed))
    };

    let mut dice_rng = if config.seed != 0 {
        SmallRng::seed_from_u64(config.seed)
    } else {
        SmallRng::from_entropy()
    };

    let mut wins = [0u64; 4];
    let mut evals = Vec::new();

    for episode in 0..config.episodes {
        let epsilon = epsilon_for(episode, config);
        let policies: Vec<Box<dyn Policy>> = (0..4)
            .map(|seat| {
                let seed = derive_seed(config.seed, episode * 4 + seat as u64 + 1);
                let mut p = QLearnPolicy::new(seat, value.clone(), true, epsilon, seed);
                p.set_lookahead(config.lookahead);
                Box::new(p) as Box<dyn Policy>
            })
            .collect();

        let mut game = Game::new(policies);
        let outcome = game.play(&mut dice_rng)?;
        if let Some(winner) = outcome.winner {
            wins[winner] += 1;
        }

        let done = episode + 1;
        if done % config.checkpoint_interval == 0 || done == config.episodes {
            value
                .lock()
                .expect("value function mutex poisoned")
                .save(&config.model_out)?;
            if !config.quiet {
                eprintln!(
                    "episode {}/{} eps {:.3} wins {:?}",
                    done, config.episodes, epsilon, wins
                );
            }
        }

        if done % config.eval_interval == 0 {
            let run_pair = || -> Result<(f64, f64), TrainError> {
                let vs_random = measure_win_rate(
                    &value,
                    PolicyKind::Random,
                    config.eval_games,
                    derive_seed(config.seed, done),
                )?;
                let vs_mixed = measure_win_rate(
                    &value,
                    PolicyKind::Mixed,
                    config.eval_games,
                    derive_seed(config.seed, done + 1),
                )?;
                Ok((vs_random, vs_mixed))
            };
            let (vs_random, vs_mixed) = if config.eval_threads > 0 {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(config.eval_threads)
                    .build()?;
                pool.install(run_pair)?
            } else {
                run_pair()?
            };
            if !config.quiet {
                eprintln!(
                    "episode {} win rate: {:.3} vs random, {:.3} vs mixed",
                    done, vs_random, vs_mixed
                );
            }
            evals.push(EvalPoint {
                episode: done,
                vs_random,
                vs_mixed,
            });
        }
    }

    Ok(TrainingReport {
        episodes: config.episodes,
        wins,
        evals,
    })
}

/// Win rate of a greedy learning seat at seat 0 against three `opponent`
/// seats over `games` games, played in parallel.
pub fn measure_win_rate(
    value: &SharedValue,
    opponent: PolicyKind,
    games: usize,
    seed: u64,
) -> Result<f64, TrainError> {
    let results: Vec<Result<bool, PolicyError>> = (0..games)
        .into_par_iter()
        .map(|g| {
            let base = derive_seed(seed, g as u64 * 8);
            let mut policies: Vec<Box<dyn Policy>> = Vec::with_capacity(4);
            policies.push(PolicyKind::QLearn.build(0, value, derive_seed(base, 1)));
            for seat in 1..4 {
                policies.push(opponent.build(seat, value, derive_seed(base, seat as u64 + 1)));
            }
            let mut game = Game::new(policies);
            let mut rng = SmallRng::seed_from_u64(derive_seed(base, 7));
            let outcome = game.play(&mut rng)?;
            Ok(outcome.winner == Some(0))
        })
        .collect();

    let mut won = 0usize;
    for result in results {
        if result? {
            won += 1;
        }
    }
    Ok(won as f64 / games as f64)
}

/// Stretches a master seed into a stream of per-use seeds, never returning
/// the entropy sentinel 0.
fn derive_seed(master: u64, index: u64) -> u64 {
    if master == 0 {
        return 0;
    }
    let mixed = master
        .wrapping_mul(0x9e37_79b9_7f4a_7c15)
        .wrapping_add(index.wrapping_mul(0xbf58_476d_1ce4_e5b9));
    if mixed == 0 {
        1
    } else {
        mixed
    }
}
