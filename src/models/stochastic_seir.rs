//! Stochastic SEIR configuration.
//!
//! Chain-binomial SEIR: each day every transition is a binomial draw with
//! probability `1 − exp(−rate)`. Compartments stay integral. Three Monte
//! Carlo runs per subset by default.

use crate::engine::model::{Configuration, Signals, State, UpdateBlock};
use crate::engine::rng::SimRng;
use crate::engine::sweep::{ParamSweep, Params};

use super::seir::{
    exposed_after_exposure, exposed_after_progression, infected_after_progression,
    susceptible_after_exposure,
};
use super::sir::{infected_after_recovery, recovered_after_recovery};
use super::{
    force_of_infection, signals, value, DEFAULT_INITIAL_INFECTED, DEFAULT_POPULATION,
    DEFAULT_TIMESTEPS, EXPOSED, INFECTED, RECOVERED, SUSCEPTIBLE,
};

/// Default number of Monte Carlo runs.
pub const DEFAULT_RUNS: u32 = 3;

/// Default configuration: same rates as SEIR, `sigma = 0.2`, three runs.
#[must_use]
pub fn config() -> Configuration {
    Configuration::new("stochastic-seir")
        .initial(SUSCEPTIBLE, DEFAULT_POPULATION - DEFAULT_INITIAL_INFECTED)
        .initial(EXPOSED, 0.0)
        .initial(INFECTED, DEFAULT_INITIAL_INFECTED)
        .initial(RECOVERED, 0.0)
        .block(
            UpdateBlock::new()
                .policy("transmission", exposure_draw)
                .update(SUSCEPTIBLE, susceptible_after_exposure)
                .update(EXPOSED, exposed_after_exposure),
        )
        .block(
            UpdateBlock::new()
                .policy("progression", progression_draw)
                .policy("recovery", recovery_draw)
                .update(EXPOSED, exposed_after_progression)
                .update(INFECTED, infected_after_transitions)
                .update(RECOVERED, recovered_after_recovery),
        )
        .sweep(
            ParamSweep::new()
                .with("beta", vec![0.3])
                .with("sigma", vec![0.2])
                .with("gamma", vec![0.1]),
        )
        .timesteps(DEFAULT_TIMESTEPS)
        .runs(DEFAULT_RUNS)
        .conserved(true)
}

/// Daily transition probability for a continuous rate.
#[must_use]
pub fn transition_probability(rate: f64) -> f64 {
    if rate <= 0.0 {
        return 0.0;
    }
    1.0 - (-rate).exp()
}

fn count(state: &State, compartment: &str) -> u64 {
    value(state, compartment).max(0.0).round() as u64
}

fn exposure_draw(params: &Params, state: &State, rng: &mut SimRng) -> Signals {
    let p = transition_probability(force_of_infection(params, state));
    let exposures = rng.gen_binomial(count(state, SUSCEPTIBLE), p);
    signals([("exposures", exposures as f64)])
}

fn progression_draw(params: &Params, state: &State, rng: &mut SimRng) -> Signals {
    let p = transition_probability(value(params, "sigma"));
    let onsets = rng.gen_binomial(count(state, EXPOSED), p);
    signals([("onsets", onsets as f64)])
}

fn recovery_draw(params: &Params, state: &State, rng: &mut SimRng) -> Signals {
    let p = transition_probability(value(params, "gamma"));
    let recoveries = rng.gen_binomial(count(state, INFECTED), p);
    signals([("recoveries", recoveries as f64)])
}

fn infected_after_transitions(params: &Params, state: &State, signals: &Signals) -> f64 {
    // onsets and recoveries are drawn from the same pre-block state
    infected_after_recovery(params, state, signals) + value(signals, "onsets")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::jidoka::{JidokaConfig, JidokaGuard};
    use crate::engine::model::StatePoint;

    fn run(seed: u64) -> Vec<StatePoint> {
        let config = config();
        let params = config.params.subsets().remove(0);
        let guard = JidokaGuard::new(JidokaConfig::default(), &config.initial_state, true);
        config.simulate(&params, &mut SimRng::new(seed), &guard).unwrap()
    }

    #[test]
    fn test_transition_probability() {
        assert!(transition_probability(0.0).abs() < f64::EPSILON);
        assert!(transition_probability(-1.0).abs() < f64::EPSILON);
        assert!((transition_probability(0.1) - 0.095_162_581_964).abs() < 1e-9);
    }

    #[test]
    fn test_same_seed_same_trajectory() {
        assert_eq!(run(11), run(11));
    }

    #[test]
    fn test_different_seeds_diverge() {
        assert_ne!(run(11), run(12));
    }

    #[test]
    fn test_compartments_stay_integral_and_conserved() {
        for point in run(5) {
            let total: f64 = point.state.values().sum();
            assert!((total - DEFAULT_POPULATION).abs() < 1e-9);
            for v in point.state.values() {
                assert!(*v >= 0.0);
                assert!((v - v.round()).abs() < 1e-9, "non-integral {v}");
            }
        }
    }

    #[test]
    fn test_default_runs() {
        assert_eq!(config().runs, DEFAULT_RUNS);
        assert_eq!(config().job_count(), 3);
    }
}
