//! Built-in compartment-model configurations.
//!
//! Each model is a discrete-time (daily) compartment model split into partial
//! state update blocks:
//! - SIR (Susceptible-Infected-Recovered)
//! - SEIR (with Exposed compartment)
//! - SEIRD (with Deceased compartment)
//! - Stochastic SEIR (binomial transitions, several Monte Carlo runs)

pub mod seir;
pub mod seird;
pub mod sir;
pub mod stochastic_seir;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::engine::model::{Configuration, Signals, State};
use crate::engine::sweep::Params;
use crate::error::SimError;

/// Compartment names shared by the models.
pub const SUSCEPTIBLE: &str = "susceptible";
/// Exposed (infected, not yet infectious).
pub const EXPOSED: &str = "exposed";
/// Infectious.
pub const INFECTED: &str = "infected";
/// Recovered.
pub const RECOVERED: &str = "recovered";
/// Deceased.
pub const DECEASED: &str = "deceased";

/// Default total population.
pub const DEFAULT_POPULATION: f64 = 10_000.0;
/// Default initial infectious count.
pub const DEFAULT_INITIAL_INFECTED: f64 = 10.0;
/// Default horizon in days.
pub const DEFAULT_TIMESTEPS: u64 = 100;

/// The built-in models, in registry order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    /// Deterministic SIR.
    Sir,
    /// Deterministic SEIR.
    Seir,
    /// Deterministic SEIRD.
    Seird,
    /// Stochastic SEIR.
    StochasticSeir,
}

impl ModelKind {
    /// Every built-in model in registry order.
    pub const ALL: [Self; 4] = [Self::Sir, Self::Seir, Self::Seird, Self::StochasticSeir];

    /// Model name as emitted in the `model` column.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sir => "sir",
            Self::Seir => "seir",
            Self::Seird => "seird",
            Self::StochasticSeir => "stochastic-seir",
        }
    }

    /// One-line description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Sir => "Susceptible-Infected-Recovered, deterministic",
            Self::Seir => "SIR with an Exposed (incubating) compartment",
            Self::Seird => "SEIR with a Deceased compartment",
            Self::StochasticSeir => "SEIR with binomial transitions, Monte Carlo runs",
        }
    }

    /// Parameters the model's policies read.
    #[must_use]
    pub const fn parameters(self) -> &'static [&'static str] {
        match self {
            Self::Sir => &["beta", "gamma"],
            Self::Seir | Self::StochasticSeir => &["beta", "sigma", "gamma"],
            Self::Seird => &["beta", "sigma", "gamma", "mu"],
        }
    }

    /// Default configuration of the model.
    #[must_use]
    pub fn config(self) -> Configuration {
        match self {
            Self::Sir => sir::config(),
            Self::Seir => seir::config(),
            Self::Seird => seird::config(),
            Self::StochasticSeir => stochastic_seir::config(),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| SimError::config(format!("unknown model '{s}'")))
    }
}

/// Read a compartment or parameter, treating a missing key as zero.
pub(crate) fn value(map: &indexmap::IndexMap<String, f64>, key: &str) -> f64 {
    map.get(key).copied().unwrap_or(0.0)
}

/// Build a signal map from `(name, value)` pairs.
pub(crate) fn signals<const N: usize>(pairs: [(&str, f64); N]) -> Signals {
    pairs
        .into_iter()
        .map(|(name, v)| (name.to_string(), v))
        .collect()
}

/// Force of infection `beta * I / N_living`.
pub(crate) fn force_of_infection(params: &Params, state: &State) -> f64 {
    let living: f64 = state
        .iter()
        .filter(|(name, _)| name.as_str() != DECEASED)
        .map(|(_, v)| *v)
        .sum();
    if living <= 0.0 {
        return 0.0;
    }
    value(params, "beta") * value(state, INFECTED) / living
}
