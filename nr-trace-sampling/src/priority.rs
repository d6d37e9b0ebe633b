// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Mutex,
};

use rand::{rngs::StdRng, Rng, SeedableRng};

const SANITIZE_SCALE: f64 = 1_000_000.0;

/// Truncates a priority to at most 6 decimal digits. Truncation never rounds
/// up, so a negative input moves away from zero.
pub fn sanitize(priority: f32) -> f32 {
    ((f64::from(priority) * SANITIZE_SCALE).floor() / SANITIZE_SCALE) as f32
}

/// Returns the sanitized sum of a priority and an adjustment. No bounds are
/// applied; negative results are legal.
pub fn adjust(priority: f32, delta: f32) -> f32 {
    sanitize(priority + delta)
}

/// Produces uniformly distributed priorities in `[0, 1)`, truncated to 6
/// decimal digits.
///
/// The random source is shared by every unit of work in the process, so it
/// sits behind a mutex. The lock is contention avoidance only, no caller
/// ever holds it across a decision.
pub struct PriorityGenerator {
    rng: Mutex<StdRng>,
}

impl PriorityGenerator {
    pub fn new() -> Self {
        PriorityGenerator {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic generator for tests.
    pub fn with_seed(seed: u64) -> Self {
        PriorityGenerator {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn create(&self) -> f32 {
        let value = self.rng.lock().unwrap().gen::<f64>();
        sanitize(value as f32)
    }
}

impl Default for PriorityGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// A shared priority cell updated through compare-and-swap on the float's
/// bit pattern, so concurrent boosts on the same unit of work are never
/// lost and no caller blocks.
#[derive(Debug)]
pub struct AtomicPriority(AtomicU32);

impl AtomicPriority {
    pub fn new(priority: f32) -> Self {
        AtomicPriority(AtomicU32::new(priority.to_bits()))
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Acquire))
    }

    /// Applies a sanitized adjustment, retrying until the swap wins. Each
    /// retry re-reads the freshly published value, so a lost race means a
    /// peer made progress.
    pub fn adjust(&self, delta: f32) {
        let mut current = self.0.load(Ordering::Acquire);
        loop {
            let next = adjust(f32::from_bits(current), delta).to_bits();
            match self
                .0
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => break,
                Err(observed) => {
                    current = observed;
                    std::hint::spin_loop();
                }
            }
        }
    }
}
