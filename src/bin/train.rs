//! Self-play training CLI.
//!
//! Trains the shared Q-learning value function by four-seat self-play and
//! checkpoints the weights to a JSON file.
//!
//! Usage:
//!   cargo run --release --bin train -- [OPTIONS]
//!
//! Options:
//!   --episodes N     Number of self-play episodes (default: 100000)
//!   --epsilon E      Starting exploration rate (default: 0.9)
//!   --lookahead N    Bootstrap lookahead depth 1-4 (default: 1)
//!   --checkpoint N   Episodes between checkpoints (default: 1000)
//!   --eval-every N   Episodes between win-rate measurements (default: 20000)
//!   --eval-games N   Games per win-rate measurement (default: 1000)
//!   --threads N      Worker threads for measurements, 0 for default (default: 0)
//!   --model FILE     Checkpoint path; resumes if it exists
//!                    (default: qlearn-model.json)
//!   --seed N         Random seed, 0 for entropy (default: 0)
//!   --quiet          Suppress progress output

use std::env;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use quadriga::trainer::{run_training, TrainerConfig};

fn main() {
    let args: Vec<String> = env::args().collect();
    let mut config = TrainerConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--episodes" => {
                i += 1;
                config.episodes = args[i].parse().expect("invalid --episodes value");
            }
            "--epsilon" => {
                i += 1;
                config.epsilon_max = args[i].parse().expect("invalid --epsilon value");
            }
            "--lookahead" => {
                i += 1;
                config.lookahead = args[i].parse().expect("invalid --lookahead value");
            }
            "--checkpoint" => {
                i += 1;
                config.checkpoint_interval = args[i].parse().expect("invalid --checkpoint value");
            }
            "--eval-every" => {
                i += 1;
                config.eval_interval = args[i].parse().expect("invalid --eval-every value");
            }
            "--eval-games" => {
                i += 1;
                config.eval_games = args[i].parse().expect("invalid --eval-games value");
            }
            "--threads" => {
                i += 1;
                config.eval_threads = args[i].parse().expect("invalid --threads value");
            }
            "--model" => {
                i += 1;
                config.model_out = PathBuf::from(&args[i]);
            }
            "--seed" => {
                i += 1;
                config.seed = args[i].parse().expect("invalid --seed value");
            }
            "--quiet" => {
                config.quiet = true;
            }
            "--help" | "-h" => {
                print_usage();
                return;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    if !config.quiet {
        eprintln!(
            "Training {} episodes, epsilon {:.2}, lookahead {}, model {}",
            config.episodes,
            config.epsilon_max,
            config.lookahead,
            config.model_out.display()
        );
    }

    let start = Instant::now();
    let report = match run_training(&config) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("training failed: {}", e);
            process::exit(1);
        }
    };
    let elapsed = start.elapsed();

    if !config.quiet {
        eprintln!(
            "Completed {} episodes in {:.1}s; self-play wins per seat {:?}",
            report.episodes,
            elapsed.as_secs_f64(),
            report.wins
        );
        for point in &report.evals {
            eprintln!(
                "  episode {}: {:.3} vs random, {:.3} vs mixed",
                point.episode, point.vs_random, point.vs_mixed
            );
        }
        eprintln!("Weights written to {}", config.model_out.display());
    }
}

fn print_usage() {
    eprintln!("Usage: train [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --episodes N     Number of self-play episodes (default: 100000)");
    eprintln!("  --epsilon E      Starting exploration rate (default: 0.9)");
    eprintln!("  --lookahead N    Bootstrap lookahead depth 1-4 (default: 1)");
    eprintln!("  --checkpoint N   Episodes between checkpoints (default: 1000)");
    eprintln!("  --eval-every N   Episodes between win-rate measurements (default: 20000)");
    eprintln!("  --eval-games N   Games per win-rate measurement (default: 1000)");
    eprintln!("  --threads N      Worker threads for measurements, 0 for default (default: 0)");
    eprintln!("  --model FILE     Checkpoint path; resumes if it exists (default: qlearn-model.json)");
    eprintln!("  --seed N         Random seed, 0 for entropy (default: 0)");
    eprintln!("  --quiet          Suppress progress output");
    eprintln!("  --help           Show this help");
}
