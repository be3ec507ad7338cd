//! Game-playing CLI.
//!
//! Plays four-seat Ludo games between configurable seat policies and writes
//! one JSON record per game (JSONL).
//!
//! Usage:
//!   cargo run --release -- [OPTIONS]
//!
//! Options:
//!   --games N      Number of games to play (default: 10)
//!   --seats SPEC   Four letters, one per seat: Q (q-learning), R (random),
//!                  F (fast), A (aggressive), D (defensive), M (mixed)
//!                  (default: RRRR)
//!   --model FILE   Value-function weights for Q seats (default: fresh net)
//!   --seed N       Random seed, 0 for entropy (default: 0)
//!   --output FILE  Output file path (default: stdout)
//!   --quiet        Suppress summary output

use std::env;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::process;
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;

use quadriga::board::SEAT_COUNT;
use quadriga::eval::{shared, MlpValue, SharedValue};
use quadriga::game::{Game, TurnPhase};
use quadriga::movegen::Categories;
use quadriga::policy::qlearn::NUM_FEATURES;
use quadriga::policy::{Policy, PolicyKind};

#[derive(Serialize)]
struct SeatRecord {
    policy: &'static str,
    moves: u64,
    captures: u64,
    releases: u64,
    /// Final slot of each piece, in the seat's local frame.
    final_positions: Vec<usize>,
}

#[derive(Serialize)]
struct GameRecord {
    game: usize,
    start_seat: usize,
    winner: Option<usize>,
    turns: u64,
    seats: Vec<SeatRecord>,
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let mut num_games = 10usize;
    let mut seat_spec = "RRRR".to_string();
    let mut model_path: Option<String> = None;
    let mut seed = 0u64;
    let mut output_path: Option<String> = None;
    let mut quiet = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--games" => {
                i += 1;
                num_games = args[i].parse().expect("invalid --games value");
            }
            "--seats" => {
                i += 1;
                seat_spec = args[i].clone();
            }
            "--model" => {
                i += 1;
                model_path = Some(args[i].clone());
            }
            "--seed" => {
                i += 1;
                seed = args[i].parse().expect("invalid --seed value");
            }
            "--output" => {
                i += 1;
                output_path = Some(args[i].clone());
            }
            "--quiet" => {
                quiet = true;
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

    let kinds = parse_seats(&seat_spec).unwrap_or_else(|e| {
        eprintln!("{}", e);
        process::exit(1);
    });

    let value: SharedValue = match &model_path {
        Some(path) => match MlpValue::load(std::path::Path::new(path)) {
            Ok(net) => shared(net),
            Err(e) => {
                eprintln!("failed to load model {}: {}", path, e);
                process::exit(1);
            }
        },
        None => shared(MlpValue::new(NUM_FEATURES, seed)),
    };
    if model_path.is_none() && kinds.contains(&PolicyKind::QLearn) && !quiet {
        eprintln!("no --model given; Q seats use untrained weights");
    }

    if !quiet {
        eprintln!("Playing {} games, seats {}, seed {}", num_games, seat_spec, seed);
    }

    let start = Instant::now();
    let records: Vec<GameRecord> = (0..num_games)
        .into_par_iter()
        .map(|g| play_one(g, &kinds, &value, seed))
        .collect();
    let elapsed = start.elapsed();

    if !quiet {
        let mut wins = [0u64; SEAT_COUNT];
        let mut draws = 0u64;
        for r in &records {
            match r.winner {
                Some(seat) => wins[seat] += 1,
                None => draws += 1,
            }
        }
        eprintln!(
            "Completed {} games in {:.1}s; wins per seat {:?}, unfinished {}",
            records.len(),
            elapsed.as_secs_f64(),
            wins,
            draws
        );
    }

    let result = match output_path {
        Some(path) => {
            let file = File::create(&path).expect("failed to create output file");
            write_jsonl(&records, &mut BufWriter::new(file))
        }
        None => {
            let stdout = io::stdout();
            write_jsonl(&records, &mut BufWriter::new(stdout.lock()))
        }
    };
    result.expect("failed to write output");
}

fn parse_seats(spec: &str) -> Result<Vec<PolicyKind>, String> {
    let kinds: Vec<PolicyKind> = spec
        .chars()
        .map(|c| c.to_string().parse())
        .collect::<Result<_, _>>()?;
    if kinds.len() != SEAT_COUNT {
        return Err(format!(
            "--seats needs exactly {} letters, got '{}'",
            SEAT_COUNT, spec
        ));
    }
    Ok(kinds)
}

fn play_one(game_index: usize, kinds: &[PolicyKind], value: &SharedValue, seed: u64) -> GameRecord {
    let base = if seed == 0 {
        0
    } else {
        seed.wrapping_add(game_index as u64 * 101)
    };
    let policies: Vec<Box<dyn Policy>> = kinds
        .iter()
        .enumerate()
        .map(|(seat, kind)| {
            let s = if base == 0 { 0 } else { base + seat as u64 + 1 };
            kind.build(seat, value, s)
        })
        .collect();

    let mut seats: Vec<SeatRecord> = policies
        .iter()
        .map(|p| SeatRecord {
            policy: p.name(),
            moves: 0,
            captures: 0,
            releases: 0,
            final_positions: Vec::new(),
        })
        .collect();

    let mut game = Game::new(policies);
    let mut rng = if base == 0 {
        SmallRng::from_entropy()
    } else {
        SmallRng::seed_from_u64(base)
    };
    let start_seat = rng.gen_range(0..SEAT_COUNT);
    game.set_start_seat(start_seat);

    while game.phase() != TurnPhase::Terminal && game.turn() < quadriga::game::MAX_TURNS {
        let record = game
            .play_turn(&mut rng)
            .expect("policy failed during play");
        if record.action.is_some() {
            let seat = &mut seats[record.seat];
            seat.moves += 1;
            if record.categories.contains(Categories::AGGRESSIVE) {
                seat.captures += 1;
            }
            if record.categories.contains(Categories::RELEASE) {
                seat.releases += 1;
            }
        }
    }

    for (seat, record) in seats.iter_mut().enumerate() {
        record.final_positions = game.board().seats[seat].piece_positions();
    }

    GameRecord {
        game: game_index,
        start_seat,
        winner: game.board().winner(),
        turns: game.turn(),
        seats,
    }
}

fn write_jsonl<W: Write>(records: &[GameRecord], out: &mut W) -> io::Result<()> {
    for record in records {
        serde_json::to_writer(&mut *out, record)?;
        writeln!(out)?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seat_spec_parsing() {
        let kinds = parse_seats("QRFm").unwrap();
        assert_eq!(kinds[0], PolicyKind::QLearn);
        assert_eq!(kinds[3], PolicyKind::Mixed);
        assert!(parse_seats("RR").is_err());
        assert!(parse_seats("RRRX").is_err());
    }

    #[test]
    fn start_seat_varies_across_games() {
        let kinds = parse_seats("RRRR").unwrap();
        let value = shared(MlpValue::new(NUM_FEATURES, 1));
        let starts: Vec<usize> = (0..12)
            .map(|g| play_one(g, &kinds, &value, 9).start_seat)
            .collect();
        assert!(starts.iter().all(|&s| s < SEAT_COUNT));
        assert!(
            starts.iter().any(|&s| s != starts[0]),
            "every game started at seat {}",
            starts[0]
        );
    }
}

fn print_usage() {
    eprintln!("Usage: quadriga [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --games N      Number of games to play (default: 10)");
    eprintln!("  --seats SPEC   Four letters, one per seat: Q, R, F, A, D, M (default: RRRR)");
    eprintln!("  --model FILE   Value-function weights for Q seats (default: fresh net)");
    eprintln!("  --seed N       Random seed, 0 for entropy (default: 0)");
    eprintln!("  --output FILE  Output file path (default: stdout)");
    eprintln!("  --quiet        Suppress summary output");
    eprintln!("  --help         Show this help");
}
