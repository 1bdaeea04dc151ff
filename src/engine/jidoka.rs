//! Jidoka (自働化) - Autonomous anomaly detection.
//!
//! The guard runs after every partial state update and stops the job as soon
//! as a compartment becomes non-finite, drops below zero, or (for models that
//! conserve their population) drifts away from the initial total.

use serde::{Deserialize, Serialize};

use crate::engine::model::State;
use crate::error::{SimError, SimResult};

/// Jidoka configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JidokaConfig {
    /// Whether the guard is active.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Largest tolerated negative compartment value.
    #[serde(default = "default_negative_tolerance")]
    pub negative_tolerance: f64,
    /// Largest tolerated drift of the population total, as a fraction of it.
    #[serde(default = "default_conservation_tolerance")]
    pub conservation_tolerance: f64,
}

const fn default_true() -> bool {
    true
}

const fn default_negative_tolerance() -> f64 {
    1e-9
}

const fn default_conservation_tolerance() -> f64 {
    1e-6
}

impl Default for JidokaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            negative_tolerance: default_negative_tolerance(),
            conservation_tolerance: default_conservation_tolerance(),
        }
    }
}

/// Per-job guard. Remembers the initial population when conservation applies.
#[derive(Debug, Clone)]
pub struct JidokaGuard {
    config: JidokaConfig,
    initial_total: Option<f64>,
}

impl JidokaGuard {
    /// Create a guard for a job starting at `initial`.
    #[must_use]
    pub fn new(config: JidokaConfig, initial: &State, conserved_population: bool) -> Self {
        let initial_total = conserved_population.then(|| initial.values().sum());
        Self {
            config,
            initial_total,
        }
    }

    /// Check a state produced at `location`.
    ///
    /// # Errors
    ///
    /// Returns `NonFiniteValue` or `ConstraintViolation` on the first anomaly.
    pub fn check(&self, location: &str, state: &State) -> SimResult<()> {
        if !self.config.enabled {
            return Ok(());
        }

        for (name, value) in state {
            if !value.is_finite() {
                return Err(SimError::NonFiniteValue {
                    location: format!("{location}.{name}"),
                });
            }
            if *value < -self.config.negative_tolerance {
                return Err(SimError::ConstraintViolation {
                    name: format!("{location}: non_negative({name})"),
                    violation: *value,
                    tolerance: self.config.negative_tolerance,
                });
            }
        }

        if let Some(initial) = self.initial_total {
            let total: f64 = state.values().sum();
            let drift = (total - initial).abs();
            let tolerance = self.config.conservation_tolerance * initial.abs().max(1.0);
            if drift > tolerance {
                return Err(SimError::ConstraintViolation {
                    name: format!("{location}: population_conserved"),
                    violation: drift,
                    tolerance,
                });
            }
        }

        Ok(())
    }
}
