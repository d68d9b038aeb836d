//! Random source used by the randomized endpoints.
//!
//! Handlers never touch a global generator. They draw from an injected
//! [`Entropy`], which production backs with [`ThreadEntropy`] and tests
//! replace with a scripted source.

use std::sync::Mutex;

use rand::Rng;

/// A source of uniform samples in `[0, 1)`.
pub trait Entropy: Send + Sync + 'static {
    fn unit(&self) -> f64;

    /// A uniform sample in `[low, high]`. Returns exactly `low` when the
    /// range is degenerate.
    fn between(&self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        (low + self.unit() * (high - low)).clamp(low, high)
    }
}

/// Draws from `rand`'s thread-local generator.
///
/// Each worker thread owns an independently seeded generator, so draws are
/// uncorrelated across requests and nothing is shared between threads.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadEntropy;

impl Entropy for ThreadEntropy {
    fn unit(&self) -> f64 {
        rand::rng().random::<f64>()
    }
}

/// Replays a fixed sequence of samples, cycling when it runs out.
#[derive(Debug)]
pub struct ScriptedEntropy {
    samples: Vec<f64>,
    next: Mutex<usize>,
}

impl ScriptedEntropy {
    /// # Panics
    ///
    /// Panics if `samples` is empty or any sample lies outside `[0, 1)`.
    pub fn new(samples: impl Into<Vec<f64>>) -> Self {
        let samples = samples.into();
        assert!(!samples.is_empty(), "scripted entropy needs at least one sample");
        assert!(
            samples.iter().all(|s| (0.0..1.0).contains(s)),
            "scripted samples must lie in [0, 1)",
        );
        Self { samples, next: Mutex::new(0) }
    }

    /// Always yields `sample`.
    pub fn constant(sample: f64) -> Self {
        Self::new(vec![sample])
    }
}

impl Entropy for ScriptedEntropy {
    fn unit(&self) -> f64 {
        let mut next = self.next.lock().unwrap_or_else(|e| e.into_inner());
        let sample = self.samples[*next % self.samples.len()];
        *next += 1;
        sample
    }
}
