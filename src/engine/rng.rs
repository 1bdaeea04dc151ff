//! Deterministic random number generation.
//!
//! Implements PCG (Permuted Congruential Generator) with keyed stream seeds
//! so that every sweep job draws from its own reproducible stream.
//!
//! # Reproducibility Guarantee
//!
//! A stream is identified by the master seed, a label and a list of indices
//! (for sweep jobs: model name, then occurrence, subset and run). Its random
//! sequence is bitwise-identical across:
//! - Different runs
//! - Different platforms
//! - Different worker counts and execution modes
//! - Different positions of the job in the registry

use rand::prelude::*;
use rand_pcg::Pcg64;

/// Largest trial count drawn by explicit Bernoulli trials.
const EXACT_BINOMIAL_LIMIT: u64 = 64;

/// Largest expected success count drawn by geometric skipping.
const GEOMETRIC_MEAN_LIMIT: f64 = 30.0;

/// Deterministic, reproducible random number generator.
#[derive(Debug, Clone)]
pub struct SimRng {
    rng: Pcg64,
}

impl SimRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg64::seed_from_u64(seed),
        }
    }

    /// Create the RNG of the stream keyed by `label` and `indices`.
    #[must_use]
    pub fn for_stream(master_seed: u64, label: &str, indices: &[u64]) -> Self {
        Self::new(Self::stream_seed(master_seed, label, indices))
    }

    /// Derive the PCG seed of a keyed stream: the first eight bytes of the
    /// blake3 hash of the master seed, the length-prefixed label and the
    /// indices.
    #[must_use]
    pub fn stream_seed(master_seed: u64, label: &str, indices: &[u64]) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&master_seed.to_le_bytes());
        hasher.update(&(label.len() as u64).to_le_bytes());
        hasher.update(label.as_bytes());
        for index in indices {
            hasher.update(&index.to_le_bytes());
        }

        let mut seed = [0u8; 8];
        seed.copy_from_slice(&hasher.finalize().as_bytes()[..8]);
        u64::from_le_bytes(seed)
    }

    /// Generate a random f64 in [0, 1).
    pub fn gen_f64(&mut self) -> f64 {
        self.rng.gen()
    }

    /// Generate a standard normal sample using Box-Muller transform.
    pub fn gen_standard_normal(&mut self) -> f64 {
        let u1 = self.gen_f64();
        let u2 = self.gen_f64();

        // Avoid log(0)
        let u1 = if u1 < f64::EPSILON { f64::EPSILON } else { u1 };

        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }

    /// Generate a normal sample with given mean and std.
    pub fn gen_normal(&mut self, mean: f64, std: f64) -> f64 {
        mean + std * self.gen_standard_normal()
    }

    /// Draw from Binomial(n, p).
    ///
    /// Small trial counts and small expected counts are drawn exactly; the
    /// rest use the normal approximation, rounded and clamped to `[0, n]`.
    pub fn gen_binomial(&mut self, n: u64, p: f64) -> u64 {
        if n == 0 || p.is_nan() || p <= 0.0 {
            return 0;
        }
        if p >= 1.0 {
            return n;
        }

        if n <= EXACT_BINOMIAL_LIMIT {
            return (0..n).filter(|_| self.gen_f64() < p).count() as u64;
        }

        let mean = n as f64 * p;
        if mean < GEOMETRIC_MEAN_LIMIT {
            return self.binomial_by_skipping(n, p);
        }

        let std = (mean * (1.0 - p)).sqrt();
        let draw = self.gen_normal(mean, std).round();
        draw.clamp(0.0, n as f64) as u64
    }

    /// Exact binomial draw by jumping over geometric runs of failures.
    fn binomial_by_skipping(&mut self, n: u64, p: f64) -> u64 {
        let log_q = (-p).ln_1p();
        let mut consumed = 0u64;
        let mut successes = 0u64;

        loop {
            let u = self.gen_f64().max(f64::MIN_POSITIVE);
            let failures = (u.ln() / log_q).floor();
            if failures >= (n - consumed) as f64 {
                return successes;
            }
            consumed += failures as u64 + 1;
            successes += 1;
        }
    }
}
