//! SEIRD configuration.
//!
//! SEIR plus a Deceased compartment: infectious individuals leave I either by
//! recovering (`gamma·I`) or dying (`mu·I`). The deceased do not mix.

use crate::engine::model::{Configuration, Signals, State, UpdateBlock};
use crate::engine::rng::SimRng;
use crate::engine::sweep::{ParamSweep, Params};

use super::seir::{
    exposed_after_exposure, exposed_after_progression, exposure, infected_after_progression,
    progression, susceptible_after_exposure,
};
use super::{
    signals, value, DECEASED, DEFAULT_INITIAL_INFECTED, DEFAULT_POPULATION, DEFAULT_TIMESTEPS,
    EXPOSED, INFECTED, RECOVERED, SUSCEPTIBLE,
};

/// Default configuration: `mu ∈ {0.01, 0.02}`, other rates as SEIR.
#[must_use]
pub fn config() -> Configuration {
    Configuration::new("seird")
        .initial(SUSCEPTIBLE, DEFAULT_POPULATION - DEFAULT_INITIAL_INFECTED)
        .initial(EXPOSED, 0.0)
        .initial(INFECTED, DEFAULT_INITIAL_INFECTED)
        .initial(RECOVERED, 0.0)
        .initial(DECEASED, 0.0)
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
                .policy("resolution", resolution)
                .update(INFECTED, infected_after_resolution)
                .update(RECOVERED, recovered_after_resolution)
                .update(DECEASED, deceased_after_resolution),
        )
        .sweep(
            ParamSweep::new()
                .with("beta", vec![0.3])
                .with("sigma", vec![0.2])
                .with("gamma", vec![0.1])
                .with("mu", vec![0.01, 0.02]),
        )
        .timesteps(DEFAULT_TIMESTEPS)
        .conserved(true)
}

/// Infection fatality ratio implied by the rates.
#[must_use]
pub fn fatality_ratio(gamma: f64, mu: f64) -> f64 {
    mu / (gamma + mu)
}

fn resolution(params: &Params, state: &State, _rng: &mut SimRng) -> Signals {
    let i = value(state, INFECTED);
    let mut recoveries = value(params, "gamma") * i;
    let mut deaths = value(params, "mu") * i;

    let outflow = recoveries + deaths;
    if outflow > i && outflow > 0.0 {
        let scale = i / outflow;
        recoveries *= scale;
        deaths *= scale;
    }

    signals([("recoveries", recoveries), ("deaths", deaths)])
}

fn infected_after_resolution(_params: &Params, state: &State, signals: &Signals) -> f64 {
    value(state, INFECTED) - value(signals, "recoveries") - value(signals, "deaths")
}

fn recovered_after_resolution(_params: &Params, state: &State, signals: &Signals) -> f64 {
    value(state, RECOVERED) + value(signals, "recoveries")
}

fn deceased_after_resolution(_params: &Params, state: &State, signals: &Signals) -> f64 {
    value(state, DECEASED) + value(signals, "deaths")
}
