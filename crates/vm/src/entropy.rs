//! Nondeterminism sources
//!
//! Randomness is injected, never ambient: a device draws from the source it
//! was constructed with, once per evaluation of a nondeterministic node. The
//! result is observable only through the round's export and return value.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};

/// External source of nondeterminism consulted by random-draw nodes.
pub trait NondeterminismSource: Send {
    /// Draw the next value in `[0, 1)`.
    ///
    /// Source failure (e.g. exhaustion) is an ordinary evaluation error: the
    /// round fails and the device's last successful export stays published.
    fn next_f64(&mut self) -> Result<f64>;
}

/// Seeded PRNG source for reproducible simulations.
#[derive(Debug)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl NondeterminismSource for SeededRandom {
    fn next_f64(&mut self) -> Result<f64> {
        Ok(self.rng.random::<f64>())
    }
}

/// Replays a fixed sequence of draws, then fails.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    draws: VecDeque<f64>,
}

impl ScriptedSource {
    pub fn new<I: IntoIterator<Item = f64>>(draws: I) -> Self {
        Self {
            draws: draws.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.draws.len()
    }
}

impl NondeterminismSource for ScriptedSource {
    fn next_f64(&mut self) -> Result<f64> {
        self.draws
            .pop_front()
            .ok_or_else(|| Error::Nondeterminism("scripted source exhausted".to_string()))
    }
}
