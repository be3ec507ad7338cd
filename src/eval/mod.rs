//! Value-function approximation.
//!
//! A single approximator is shared by all four seats during self-play, so it
//! lives behind one `Arc<Mutex<_>>` handle: every read (`evaluate`) and write
//! (`train`) goes through that one synchronization point.

pub mod mlp;

pub use mlp::MlpValue;

use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// A trainable scalar scoring function over feature vectors.
pub trait ValueFunction: Send {
    /// Scores a feature vector.
    fn evaluate(&self, inputs: &[f64]) -> f64;

    /// Applies one incremental training update toward `target`.
    fn train(&mut self, inputs: &[f64], target: f64);

    /// Persists the function to a file. The stored layout is owned by the
    /// implementation. The default is a no-op for stateless functions.
    fn save(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}

/// Shared handle to the one approximator all seats read and write.
pub type SharedValue = Arc<Mutex<dyn ValueFunction>>;

/// Wraps a value function in a shared handle.
pub fn shared<V: ValueFunction + 'static>(value: V) -> SharedValue {
    Arc::new(Mutex::new(value))
}

/// A value function that scores everything the same and never learns.
/// Useful as a baseline and in tests.
pub struct ConstantValue(pub f64);

impl ValueFunction for ConstantValue {
    fn evaluate(&self, _inputs: &[f64]) -> f64 {
        self.0
    }

    fn train(&mut self, _inputs: &[f64], _target: f64) {}
}
