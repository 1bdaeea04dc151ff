//! SIR (Susceptible-Infected-Recovered) configuration.
//!
//! Two blocks per day: transmission (S→I at `beta·S·I/N`), then recovery
//! (I→R at `gamma·I`). Flows are clamped to the source compartment.

use crate::engine::model::{Configuration, Signals, State, UpdateBlock};
use crate::engine::rng::SimRng;
use crate::engine::sweep::{ParamSweep, Params};

use super::{
    force_of_infection, signals, value, DEFAULT_INITIAL_INFECTED, DEFAULT_POPULATION,
    DEFAULT_TIMESTEPS, INFECTED, RECOVERED, SUSCEPTIBLE,
};

/// Default configuration: `beta ∈ {0.2, 0.3}`, `gamma = 0.1`.
#[must_use]
pub fn config() -> Configuration {
    Configuration::new("sir")
        .initial(SUSCEPTIBLE, DEFAULT_POPULATION - DEFAULT_INITIAL_INFECTED)
        .initial(INFECTED, DEFAULT_INITIAL_INFECTED)
        .initial(RECOVERED, 0.0)
        .block(
            UpdateBlock::new()
                .policy("transmission", transmission)
                .update(SUSCEPTIBLE, susceptible_after_infection)
                .update(INFECTED, infected_after_infection),
        )
        .block(
            UpdateBlock::new()
                .policy("recovery", recovery)
                .update(INFECTED, infected_after_recovery)
                .update(RECOVERED, recovered_after_recovery),
        )
        .sweep(
            ParamSweep::new()
                .with("beta", vec![0.2, 0.3])
                .with("gamma", vec![0.1]),
        )
        .timesteps(DEFAULT_TIMESTEPS)
        .conserved(true)
}

/// Basic reproduction number.
#[must_use]
pub fn r0(beta: f64, gamma: f64) -> f64 {
    beta / gamma
}

pub(crate) fn transmission(params: &Params, state: &State, _rng: &mut SimRng) -> Signals {
    let s = value(state, SUSCEPTIBLE);
    let infections = (force_of_infection(params, state) * s).min(s);
    signals([("infections", infections)])
}

pub(crate) fn recovery(params: &Params, state: &State, _rng: &mut SimRng) -> Signals {
    let i = value(state, INFECTED);
    let recoveries = (value(params, "gamma") * i).min(i);
    signals([("recoveries", recoveries)])
}

fn susceptible_after_infection(_params: &Params, state: &State, signals: &Signals) -> f64 {
    value(state, SUSCEPTIBLE) - value(signals, "infections")
}

fn infected_after_infection(_params: &Params, state: &State, signals: &Signals) -> f64 {
    value(state, INFECTED) + value(signals, "infections")
}

pub(crate) fn infected_after_recovery(_params: &Params, state: &State, signals: &Signals) -> f64 {
    value(state, INFECTED) - value(signals, "recoveries")
}

pub(crate) fn recovered_after_recovery(_params: &Params, state: &State, signals: &Signals) -> f64 {
    value(state, RECOVERED) + value(signals, "recoveries")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::jidoka::{JidokaConfig, JidokaGuard};
    use crate::engine::model::StatePoint;

    fn trajectory(beta: f64, gamma: f64, timesteps: u64) -> Vec<StatePoint> {
        let config = config().timesteps(timesteps);
        let mut params = Params::new();
        params.insert("beta".into(), beta);
        params.insert("gamma".into(), gamma);
        let guard = JidokaGuard::new(JidokaConfig::default(), &config.initial_state, true);
        config.simulate(&params, &mut SimRng::new(0), &guard).unwrap()
    }

    #[test]
    fn test_r0() {
        assert!((r0(0.3, 0.1) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_infected_grows_when_r0_above_one() {
        let points = trajectory(0.3, 0.1, 5);
        let first = points.first().unwrap().state[INFECTED];
        let last = points.last().unwrap().state[INFECTED];
        assert!(last > first, "infected should grow: {first} -> {last}");
    }

    #[test]
    fn test_infected_declines_when_r0_below_one() {
        let points = trajectory(0.05, 0.1, 20);
        let last = points.last().unwrap().state[INFECTED];
        assert!(last < DEFAULT_INITIAL_INFECTED);
    }

    #[test]
    fn test_population_conserved() {
        for point in trajectory(0.3, 0.1, 200) {
            let total: f64 = point.state.values().sum();
            assert!((total - DEFAULT_POPULATION).abs() < 1e-6, "total {total}");
        }
    }

    #[test]
    fn test_epidemic_burns_out() {
        let points = trajectory(0.3, 0.1, 400);
        let last = &points.last().unwrap().state;
        assert!(last[INFECTED] < 1.0);
        assert!(last[RECOVERED] > 0.5 * DEFAULT_POPULATION);
    }

    #[test]
    fn test_high_gamma_is_clamped() {
        let points = trajectory(0.3, 5.0, 3);
        for point in &points {
            assert!(point.state[INFECTED] >= 0.0);
        }
    }
}
