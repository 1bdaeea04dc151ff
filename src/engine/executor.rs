//! Execution modes, execution context and the sweep executor.
//!
//! Every configuration expands into jobs, one per (parameter subset, run).
//! Jobs are numbered in registry order (simulation, then subset, then run);
//! that number fixes the job's position in the output. The job's RNG stream
//! is keyed by its model name, the occurrence of that model in the registry,
//! its subset and its run, so neither the execution mode nor the registry
//! position of other configurations changes what a job draws.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use crate::engine::jidoka::{JidokaConfig, JidokaGuard};
use crate::engine::model::Configuration;
use crate::engine::output::{
    BlockEntry, EngineOutput, RawResult, Record, Session, SubsetEntry, TensorField, MODEL_COLUMN,
    RUN_COLUMN, SIMULATION_COLUMN, SUBSET_COLUMN, SUBSTEP_COLUMN, TIMESTEP_COLUMN,
};
use crate::engine::rng::SimRng;
use crate::engine::sweep::Params;
use crate::error::{SimError, SimResult};

/// Default master seed.
pub const DEFAULT_SEED: u64 = 42;

/// Execution strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionMode {
    /// Jobs run one after another on the calling thread.
    Single,
    /// Jobs run on a work-stealing pool of worker threads.
    #[default]
    Multi,
}

impl ExecutionMode {
    /// Sequential mode.
    #[must_use]
    pub const fn single_mode() -> Self {
        Self::Single
    }

    /// Parallel mode.
    #[must_use]
    pub const fn multi_mode() -> Self {
        Self::Multi
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Multi => write!(f, "multi"),
        }
    }
}

impl FromStr for ExecutionMode {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "single" | "single_mode" | "local" => Ok(Self::Single),
            "multi" | "multi_mode" | "parallel" => Ok(Self::Multi),
            other => Err(SimError::config(format!(
                "unknown execution mode '{other}' (expected 'single' or 'multi')"
            ))),
        }
    }
}

/// Execution context: mode plus the knobs the executor needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionContext {
    /// Execution strategy.
    pub mode: ExecutionMode,
    /// Worker threads used in `Multi` mode.
    pub workers: usize,
    /// Master seed; each job derives its stream from it.
    pub seed: u64,
    /// Per-substep state guard.
    pub jidoka: JidokaConfig,
}

impl ExecutionContext {
    /// Create a context bound to `mode` with default workers and seed.
    #[must_use]
    pub fn new(mode: ExecutionMode) -> Self {
        Self {
            mode,
            workers: default_workers(),
            seed: DEFAULT_SEED,
            jidoka: JidokaConfig::default(),
        }
    }

    /// Set the number of worker threads (at least one is always used).
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the master seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the Jidoka configuration.
    #[must_use]
    pub fn with_jidoka(mut self, jidoka: JidokaConfig) -> Self {
        self.jidoka = jidoka;
        self
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new(ExecutionMode::default())
    }
}

/// Number of CPUs, or 4 when it cannot be determined.
#[must_use]
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZero::get)
        .unwrap_or(4)
}

/// Something that can execute a list of configurations.
pub trait Engine {
    /// Execute every configuration and return `(raw rows, tensor field, sessions)`.
    ///
    /// # Errors
    ///
    /// Implementations return any configuration or simulation failure.
    fn execute(&self, configs: &[Configuration]) -> SimResult<EngineOutput>;
}

impl<E: Engine + ?Sized> Engine for &E {
    fn execute(&self, configs: &[Configuration]) -> SimResult<EngineOutput> {
        (**self).execute(configs)
    }
}

impl<E: Engine + ?Sized> Engine for Box<E> {
    fn execute(&self, configs: &[Configuration]) -> SimResult<EngineOutput> {
        (**self).execute(configs)
    }
}

/// One unit of parallel work.
#[derive(Debug, Clone)]
struct Job {
    simulation: usize,
    subset: usize,
    run: u32,
    params: Params,
    seed: u64,
}

/// The built-in engine.
#[derive(Debug, Clone, Default)]
pub struct Executor {
    context: ExecutionContext,
}

impl Executor {
    /// Create an executor for a context.
    #[must_use]
    pub const fn new(context: ExecutionContext) -> Self {
        Self { context }
    }

    /// The executor's context.
    #[must_use]
    pub const fn context(&self) -> &ExecutionContext {
        &self.context
    }

    fn plan(&self, configs: &[Configuration]) -> (Vec<Job>, TensorField) {
        let mut jobs = Vec::with_capacity(configs.iter().map(Configuration::job_count).sum());
        let mut field = TensorField::default();
        let mut occurrences: HashMap<&str, u64> = HashMap::new();

        for (simulation, config) in configs.iter().enumerate() {
            let seen = occurrences.entry(config.model.as_str()).or_insert(0);
            let occurrence = *seen;
            *seen += 1;

            for (block, update_block) in config.blocks.iter().enumerate() {
                field.blocks.push(BlockEntry {
                    simulation,
                    model: config.model.clone(),
                    block,
                    policies: update_block.policies.iter().map(|p| p.name.clone()).collect(),
                    variables: update_block
                        .updates
                        .iter()
                        .map(|u| u.variable.clone())
                        .collect(),
                });
            }

            for (subset, params) in config.params.subsets().into_iter().enumerate() {
                for run in 1..=config.runs {
                    jobs.push(Job {
                        simulation,
                        subset,
                        run,
                        params: params.clone(),
                        seed: SimRng::stream_seed(
                            self.context.seed,
                            &config.model,
                            &[occurrence, subset as u64, u64::from(run)],
                        ),
                    });
                }
                field.subsets.push(SubsetEntry {
                    simulation,
                    subset,
                    params,
                });
            }
        }

        (jobs, field)
    }

    fn run_job(&self, config: &Configuration, job: &Job) -> SimResult<RawResult> {
        let mut rng = SimRng::new(job.seed);
        let guard = JidokaGuard::new(
            self.context.jidoka.clone(),
            &config.initial_state,
            config.conserved_population,
        );

        let trajectory = config.simulate(&job.params, &mut rng, &guard)?;

        Ok(trajectory
            .into_iter()
            .map(|point| {
                let mut record = Record::new()
                    .with(SIMULATION_COLUMN, job.simulation)
                    .with(SUBSET_COLUMN, job.subset)
                    .with(RUN_COLUMN, i64::from(job.run))
                    .with(SUBSTEP_COLUMN, point.substep)
                    .with(TIMESTEP_COLUMN, point.timestep)
                    .with(MODEL_COLUMN, config.model.as_str());
                for (variable, value) in point.state {
                    record.insert(variable, value);
                }
                record
            })
            .collect())
    }
}

impl Engine for Executor {
    fn execute(&self, configs: &[Configuration]) -> SimResult<EngineOutput> {
        for config in configs {
            config.validate()?;
        }

        let (jobs, tensor_field) = self.plan(configs);
        let sessions: Vec<Session> = jobs
            .iter()
            .map(|job| {
                let model = &configs[job.simulation].model;
                Session {
                    id: Session::compute_id(model, job.subset, job.run, job.seed),
                    simulation: job.simulation,
                    subset: job.subset,
                    run: job.run,
                    model: model.clone(),
                    params: job.params.clone(),
                    seed: job.seed,
                }
            })
            .collect();

        tracing::debug!(
            configs = configs.len(),
            jobs = jobs.len(),
            mode = %self.context.mode,
            workers = self.context.workers,
            "executing sweep"
        );

        let simulate = |index: usize| {
            let job = &jobs[index];
            self.run_job(&configs[job.simulation], job)
        };

        let outcomes: Vec<SimResult<RawResult>> = match self.context.mode {
            ExecutionMode::Single => (0..jobs.len()).map(simulate).collect(),
            ExecutionMode::Multi => {
                WorkStealingPool::with_workers(self.context.workers).execute(jobs.len(), simulate)
            }
        };

        if outcomes.len() != jobs.len() {
            return Err(SimError::execution(format!(
                "expected {} job results, received {}",
                jobs.len(),
                outcomes.len()
            )));
        }

        let mut raw = RawResult::new();
        for (job, outcome) in jobs.iter().zip(outcomes) {
            match outcome {
                Ok(records) => raw.extend(records),
                Err(err) => {
                    tracing::warn!(
                        simulation = job.simulation,
                        subset = job.subset,
                        run = job.run,
                        error = %err,
                        "job failed"
                    );
                    return Err(err);
                }
            }
        }

        tracing::debug!(rows = raw.len(), sessions = sessions.len(), "sweep finished");
        Ok((raw, tensor_field, sessions))
    }
}

/// Work-stealing pool for independent jobs.
///
/// A global injector holds every job index; each worker drains its local
/// FIFO deque, then the injector, then steals round-robin from its peers.
/// Results come back in job order.
#[derive(Debug, Clone, Copy)]
pub struct WorkStealingPool {
    num_workers: usize,
}

impl WorkStealingPool {
    /// Create a pool with `num_workers` threads (minimum one).
    #[must_use]
    pub fn with_workers(num_workers: usize) -> Self {
        Self {
            num_workers: num_workers.max(1),
        }
    }

    /// Number of worker threads.
    #[must_use]
    pub const fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Run `task` for every index in `0..n_tasks`, returning results in index order.
    pub fn execute<F, R>(&self, n_tasks: usize, task: F) -> Vec<R>
    where
        F: Fn(usize) -> R + Sync,
        R: Send,
    {
        use crossbeam_deque::{Injector, Steal, Stealer, Worker};

        if n_tasks == 0 {
            return Vec::new();
        }

        let injector: Injector<usize> = Injector::new();
        for index in 0..n_tasks {
            injector.push(index);
        }

        let workers: Vec<Worker<usize>> = (0..self.num_workers.min(n_tasks))
            .map(|_| Worker::new_fifo())
            .collect();
        let stealers: Vec<Stealer<usize>> = workers.iter().map(Worker::stealer).collect();

        let results: Mutex<Vec<(usize, R)>> = Mutex::new(Vec::with_capacity(n_tasks));

        std::thread::scope(|s| {
            for (worker_id, worker) in workers.into_iter().enumerate() {
                let injector = &injector;
                let stealers = &stealers;
                let results = &results;
                let task = &task;

                s.spawn(move || loop {
                    let next = worker
                        .pop()
                        .or_else(|| loop {
                            match injector.steal_batch_and_pop(&worker) {
                                Steal::Success(index) => return Some(index),
                                Steal::Empty => return None,
                                Steal::Retry => {}
                            }
                        })
                        .or_else(|| {
                            for i in 1..stealers.len() {
                                let victim = &stealers[(worker_id + i) % stealers.len()];
                                loop {
                                    match victim.steal() {
                                        Steal::Success(index) => return Some(index),
                                        Steal::Empty => break,
                                        Steal::Retry => {}
                                    }
                                }
                            }
                            None
                        });

                    let Some(index) = next else { break };
                    let result = task(index);
                    if let Ok(mut guard) = results.lock() {
                        guard.push((index, result));
                    }
                });
            }
        });

        let mut indexed = results.into_inner().unwrap_or_default();
        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, r)| r).collect()
    }
}
