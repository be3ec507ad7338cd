//! A four-seat Ludo engine with a self-play Q-learning policy.
//!
//! The engine represents each seat as a 59-slot occupancy vector in
//! quarter-piece units and generates all legal dice-conditioned successor
//! states, with captures and blockades resolved. On top of that sit four
//! seat policies (random, heuristic strategies, and a Q-learning policy
//! backed by a small online-trained feed-forward network) and a turn
//! controller that drives games and routes cross-seat learning rewards.

pub mod board;
pub mod eval;
pub mod game;
pub mod movegen;
pub mod policy;
pub mod trainer;
