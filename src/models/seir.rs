//! SEIR configuration.
//!
//! Adds an Exposed compartment between S and I. Day blocks: transmission
//! (S→E), progression (E→I at `sigma·E`), recovery (I→R at `gamma·I`).

use crate::engine::model::{Configuration, Signals, State, UpdateBlock};
use crate::engine::rng::SimRng;
use crate::engine::sweep::{ParamSweep, Params};

use super::sir::{infected_after_recovery, recovered_after_recovery, recovery};
use super::{
    force_of_infection, signals, value, DEFAULT_INITIAL_INFECTED, DEFAULT_POPULATION,
    DEFAULT_TIMESTEPS, EXPOSED, INFECTED, RECOVERED, SUSCEPTIBLE,
};

/// Default configuration: `beta = 0.3`, `sigma ∈ {0.2, 0.5}`, `gamma = 0.1`.
#[must_use]
pub fn config() -> Configuration {
    Configuration::new("seir")
        .initial(SUSCEPTIBLE, DEFAULT_POPULATION - DEFAULT_INITIAL_INFECTED)
        .initial(EXPOSED, 0.0)
        .initial(INFECTED, DEFAULT_INITIAL_INFECTED)
        .initial(RECOVERED, 0.0)
        .block(
            UpdateBlock::new()
                .policy("transmission", exposure)
                .update(SUSCEPTIBLE, susceptible_after_exposure)
                .update(EXPOSED, exposed_after_exposure),
        )
        .block(
            UpdateBlock::new()
                .policy("progression", progression)
                .update(EXPOSED, exposed_after_progression)
                .update(INFECTED, infected_after_progression),
        )
        .block(
            UpdateBlock::new()
                .policy("recovery", recovery)
                .update(INFECTED, infected_after_recovery)
                .update(RECOVERED, recovered_after_recovery),
        )
        .sweep(
            ParamSweep::new()
                .with("beta", vec![0.3])
                .with("sigma", vec![0.2, 0.5])
                .with("gamma", vec![0.1]),
        )
        .timesteps(DEFAULT_TIMESTEPS)
        .conserved(true)
}

pub(crate) fn exposure(params: &Params, state: &State, _rng: &mut SimRng) -> Signals {
    let s = value(state, SUSCEPTIBLE);
    let exposures = (force_of_infection(params, state) * s).min(s);
    signals([("exposures", exposures)])
}

pub(crate) fn progression(params: &Params, state: &State, _rng: &mut SimRng) -> Signals {
    let e = value(state, EXPOSED);
    let onsets = (value(params, "sigma") * e).min(e);
    signals([("onsets", onsets)])
}

pub(crate) fn susceptible_after_exposure(_params: &Params, state: &State, signals: &Signals) -> f64 {
    value(state, SUSCEPTIBLE) - value(signals, "exposures")
}

pub(crate) fn exposed_after_exposure(_params: &Params, state: &State, signals: &Signals) -> f64 {
    value(state, EXPOSED) + value(signals, "exposures")
}

pub(crate) fn exposed_after_progression(_params: &Params, state: &State, signals: &Signals) -> f64 {
    value(state, EXPOSED) - value(signals, "onsets")
}

pub(crate) fn infected_after_progression(_params: &Params, state: &State, signals: &Signals) -> f64 {
    value(state, INFECTED) + value(signals, "onsets")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::jidoka::{JidokaConfig, JidokaGuard};
    use crate::engine::model::StatePoint;
    use crate::models::sir;

    fn run(config: &Configuration, subset: usize) -> Vec<StatePoint> {
        let params = config.params.subsets().remove(subset);
        let guard = JidokaGuard::new(JidokaConfig::default(), &config.initial_state, true);
        config.simulate(&params, &mut SimRng::new(0), &guard).unwrap()
    }

    fn peak_day(points: &[StatePoint]) -> u64 {
        points
            .iter()
            .max_by(|a, b| a.state[INFECTED].total_cmp(&b.state[INFECTED]))
            .map_or(0, |p| p.timestep)
    }

    #[test]
    fn test_three_substeps_per_day() {
        let config = config().timesteps(2);
        let points = run(&config, 0);
        assert_eq!(points.len(), 1 + 2 * 3);
        assert_eq!(points[3].substep, 3);
    }

    #[test]
    fn test_compartments_non_negative_and_conserved() {
        let config = config().timesteps(300);
        for point in run(&config, 1) {
            assert!(point.state.values().all(|v| *v >= 0.0));
            let total: f64 = point.state.values().sum();
            assert!((total - DEFAULT_POPULATION).abs() < 1e-6);
        }
    }

    #[test]
    fn test_incubation_delays_peak() {
        let seir_config = config().timesteps(300);
        // SIR with the same beta and gamma as the first SEIR subset
        let sir_config = sir::config()
            .sweep(ParamSweep::new().with("beta", vec![0.3]).with("gamma", vec![0.1]))
            .timesteps(300);

        let seir_peak = peak_day(&run(&seir_config, 0));
        let sir_peak = peak_day(&run(&sir_config, 0));
        assert!(seir_peak > sir_peak, "SEIR peak {seir_peak} vs SIR {sir_peak}");
    }

    #[test]
    fn test_faster_incubation_peaks_earlier() {
        let config = config().timesteps(300);
        let slow = peak_day(&run(&config, 0));
        let fast = peak_day(&run(&config, 1));
        assert!(fast < slow);
    }
}
