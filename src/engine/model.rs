//! Configuration objects: the unit of work handed to an engine.
//!
//! A configuration bundles a model's initial state, its partial state update
//! blocks, the parameter sweep, the horizon and the number of Monte Carlo
//! runs. Each block is one substep: its policies turn the current state into
//! signals, then its variable updates turn signals into new compartment values.

use indexmap::IndexMap;

use crate::engine::jidoka::JidokaGuard;
use crate::engine::rng::SimRng;
use crate::engine::sweep::{ParamSweep, Params};
use crate::error::{SimError, SimResult};

/// Compartment sizes by name.
pub type State = IndexMap<String, f64>;

/// Policy outputs by name. Signals sharing a name are summed.
pub type Signals = IndexMap<String, f64>;

/// Policy function: computes signals from the pre-block state.
pub type PolicyFn = fn(&Params, &State, &mut SimRng) -> Signals;

/// State update function: computes one variable's new value.
pub type UpdateFn = fn(&Params, &State, &Signals) -> f64;

/// Named policy.
#[derive(Debug, Clone)]
pub struct Policy {
    /// Policy name (reported in the tensor field).
    pub name: String,
    /// Policy function.
    pub function: PolicyFn,
}

/// Update of a single state variable.
#[derive(Debug, Clone)]
pub struct VariableUpdate {
    /// Variable updated.
    pub variable: String,
    /// Update function.
    pub function: UpdateFn,
}

/// One partial state update block.
#[derive(Debug, Clone, Default)]
pub struct UpdateBlock {
    /// Policies evaluated first.
    pub policies: Vec<Policy>,
    /// Variable updates applied together after the policies.
    pub updates: Vec<VariableUpdate>,
}

impl UpdateBlock {
    /// Create an empty block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a policy.
    #[must_use]
    pub fn policy(mut self, name: impl Into<String>, function: PolicyFn) -> Self {
        self.policies.push(Policy {
            name: name.into(),
            function,
        });
        self
    }

    /// Add a variable update.
    #[must_use]
    pub fn update(mut self, variable: impl Into<String>, function: UpdateFn) -> Self {
        self.updates.push(VariableUpdate {
            variable: variable.into(),
            function,
        });
        self
    }

    /// Apply the block to `state`, returning the next state.
    pub fn apply(&self, params: &Params, state: &State, rng: &mut SimRng) -> State {
        let mut signals = Signals::new();
        for policy in &self.policies {
            for (key, value) in (policy.function)(params, state, rng) {
                *signals.entry(key).or_insert(0.0) += value;
            }
        }

        let mut next = state.clone();
        for update in &self.updates {
            let value = (update.function)(params, state, &signals);
            next.insert(update.variable.clone(), value);
        }
        next
    }
}

/// One point of a job trajectory.
#[derive(Debug, Clone, PartialEq)]
pub struct StatePoint {
    /// Timestep (0 for the initial state).
    pub timestep: u64,
    /// Substep (block index + 1, 0 for the initial state).
    pub substep: usize,
    /// State after the substep.
    pub state: State,
}

/// A model configuration ready to be executed.
#[derive(Debug, Clone)]
pub struct Configuration {
    /// Model name, emitted in the `model` column.
    pub model: String,
    /// Initial compartment sizes.
    pub initial_state: State,
    /// Partial state update blocks, one per substep.
    pub blocks: Vec<UpdateBlock>,
    /// Parameter sweep.
    pub params: ParamSweep,
    /// Number of timesteps after the initial state.
    pub timesteps: u64,
    /// Monte Carlo repetitions per subset.
    pub runs: u32,
    /// Whether the sum of compartments must stay constant.
    pub conserved_population: bool,
}

impl Configuration {
    /// Create a configuration with one run and no blocks.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            initial_state: State::new(),
            blocks: Vec::new(),
            params: ParamSweep::new(),
            timesteps: 0,
            runs: 1,
            conserved_population: false,
        }
    }

    /// Set an initial compartment.
    #[must_use]
    pub fn initial(mut self, variable: impl Into<String>, value: f64) -> Self {
        self.initial_state.insert(variable.into(), value);
        self
    }

    /// Append a block.
    #[must_use]
    pub fn block(mut self, block: UpdateBlock) -> Self {
        self.blocks.push(block);
        self
    }

    /// Set the parameter sweep.
    #[must_use]
    pub fn sweep(mut self, params: ParamSweep) -> Self {
        self.params = params;
        self
    }

    /// Set the horizon.
    #[must_use]
    pub const fn timesteps(mut self, timesteps: u64) -> Self {
        self.timesteps = timesteps;
        self
    }

    /// Set the number of Monte Carlo runs.
    #[must_use]
    pub const fn runs(mut self, runs: u32) -> Self {
        self.runs = runs;
        self
    }

    /// Mark the population as conserved.
    #[must_use]
    pub const fn conserved(mut self, conserved: bool) -> Self {
        self.conserved_population = conserved;
        self
    }

    /// Total initial population.
    #[must_use]
    pub fn population(&self) -> f64 {
        self.initial_state.values().sum()
    }

    /// Number of jobs (subsets × runs) this configuration expands to.
    #[must_use]
    pub fn job_count(&self) -> usize {
        self.params.subset_count() * self.runs as usize
    }

    /// Check the configuration before execution.
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the first problem found.
    pub fn validate(&self) -> SimResult<()> {
        if self.model.is_empty() {
            return Err(SimError::config("configuration has an empty model name"));
        }
        if self.runs == 0 {
            return Err(SimError::config(format!(
                "{}: runs must be at least 1",
                self.model
            )));
        }
        if self.initial_state.is_empty() {
            return Err(SimError::config(format!(
                "{}: initial state is empty",
                self.model
            )));
        }
        if let Some((name, value)) = self.initial_state.iter().find(|(_, v)| !v.is_finite()) {
            return Err(SimError::config(format!(
                "{}: initial value of '{name}' is not finite ({value})",
                self.model
            )));
        }
        for (index, block) in self.blocks.iter().enumerate() {
            for update in &block.updates {
                if !self.initial_state.contains_key(&update.variable) {
                    return Err(SimError::config(format!(
                        "{}: block {index} updates unknown variable '{}'",
                        self.model, update.variable
                    )));
                }
            }
        }
        self.params.validate().map_err(|e| match e {
            SimError::Config { message } => SimError::config(format!("{}: {message}", self.model)),
            other => other,
        })
    }

    /// Run one job: the initial state, then every block of every timestep.
    ///
    /// # Errors
    ///
    /// Returns the guard's error as soon as a state fails its checks.
    pub fn simulate(
        &self,
        params: &Params,
        rng: &mut SimRng,
        guard: &JidokaGuard,
    ) -> SimResult<Vec<StatePoint>> {
        let mut trajectory = Vec::new();
        let mut state = self.initial_state.clone();
        trajectory.push(StatePoint {
            timestep: 0,
            substep: 0,
            state: state.clone(),
        });

        for timestep in 1..=self.timesteps {
            for (index, block) in self.blocks.iter().enumerate() {
                state = block.apply(params, &state, rng);
                let substep = index + 1;
                guard.check(
                    &format!("{}/t{timestep}/s{substep}", self.model),
                    &state,
                )?;
                trajectory.push(StatePoint {
                    timestep,
                    substep,
                    state: state.clone(),
                });
            }
        }

        Ok(trajectory)
    }
}
