//! Runner: execute a registry and collect the raw result as a table.

use tracing::debug;

use crate::engine::executor::{Engine, ExecutionContext, ExecutionMode, Executor};
use crate::error::SimResult;
use crate::registry::ConfigRegistry;
use crate::table::Table;

/// Executes every registered configuration through an engine.
#[derive(Debug, Clone)]
pub struct Runner<E: Engine> {
    engine: E,
    registry: ConfigRegistry,
}

impl<E: Engine> Runner<E> {
    /// Bind an engine to a fully populated registry.
    #[must_use]
    pub const fn new(engine: E, registry: ConfigRegistry) -> Self {
        Self { engine, registry }
    }

    /// The registry this runner executes.
    #[must_use]
    pub const fn registry(&self) -> &ConfigRegistry {
        &self.registry
    }

    /// The engine this runner drives.
    #[must_use]
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// Execute the registry and return one row per engine record.
    ///
    /// `drop_midsteps` is accepted for interface compatibility and does not
    /// change the result.
    ///
    /// # Errors
    ///
    /// Returns any engine error unchanged.
    pub fn run(&self, drop_midsteps: bool) -> SimResult<Table> {
        debug!(
            configurations = self.registry.len(),
            drop_midsteps, "running registry"
        );

        let (raw_result, _tensor_field, _sessions) =
            self.engine.execute(self.registry.as_slice())?;

        debug!(rows = raw_result.len(), "engine finished");
        Ok(Table::from_records(raw_result))
    }
}

impl Runner<Executor> {
    /// Multi-mode executor over `registry`.
    #[must_use]
    pub fn multi(registry: ConfigRegistry) -> Self {
        Self::new(
            Executor::new(ExecutionContext::new(ExecutionMode::multi_mode())),
            registry,
        )
    }

    /// Multi-mode executor over the built-in models.
    #[must_use]
    pub fn with_default_models() -> Self {
        Self::multi(ConfigRegistry::default_models())
    }
}

/// Run the built-in models in parallel and return the result table.
///
/// # Errors
///
/// Returns any engine error unchanged.
pub fn run(drop_midsteps: bool) -> SimResult<Table> {
    Runner::with_default_models().run(drop_midsteps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::model::Configuration;
    use crate::engine::output::{EngineOutput, Record, Session, TensorField};
    use crate::error::SimError;
    use crate::models::ModelKind;
    use std::cell::Cell;

    /// Emits `rows` records per configuration, tagged with the model name.
    struct FakeEngine {
        rows: usize,
        calls: Cell<usize>,
    }

    impl FakeEngine {
        fn new(rows: usize) -> Self {
            Self {
                rows,
                calls: Cell::new(0),
            }
        }
    }

    impl Engine for FakeEngine {
        fn execute(&self, configs: &[Configuration]) -> SimResult<EngineOutput> {
            self.calls.set(self.calls.get() + 1);
            let records = configs
                .iter()
                .flat_map(|config| {
                    (0..self.rows).map(move |i| {
                        Record::new()
                            .with("model", config.model.as_str())
                            .with("i", i)
                    })
                })
                .collect();
            let sessions = vec![Session {
                id: "fake".into(),
                simulation: 0,
                subset: 0,
                run: 1,
                model: "fake".into(),
                params: crate::engine::sweep::Params::new(),
                seed: 0,
            }];
            Ok((records, TensorField::default(), sessions))
        }
    }

    struct FailingEngine;

    impl Engine for FailingEngine {
        fn execute(&self, _configs: &[Configuration]) -> SimResult<EngineOutput> {
            Err(SimError::execution("worker lost"))
        }
    }

    fn registry() -> ConfigRegistry {
        [ModelKind::Sir, ModelKind::Seird]
            .into_iter()
            .map(ModelKind::config)
            .collect()
    }

    #[test]
    fn test_rows_concatenate_per_configuration() {
        let runner = Runner::new(FakeEngine::new(3), registry());
        let table = runner.run(true).unwrap();

        assert_eq!(table.len(), 6);
        assert_eq!(table.columns(), &["model", "i"]);
        assert_eq!(table.get(0, "model").and_then(|v| v.as_str()), Some("sir"));
        assert_eq!(table.get(3, "model").and_then(|v| v.as_str()), Some("seird"));
        assert_eq!(runner.engine().calls.get(), 1);
    }

    #[test]
    fn test_drop_midsteps_has_no_effect() {
        let runner = Runner::new(FakeEngine::new(2), registry());
        assert_eq!(runner.run(true).unwrap(), runner.run(false).unwrap());
    }

    #[test]
    fn test_empty_registry_yields_empty_table() {
        let runner = Runner::new(FakeEngine::new(5), ConfigRegistry::new());
        let table = runner.run(true).unwrap();
        assert!(table.is_empty());
        assert!(table.columns().is_empty());
    }

    #[test]
    fn test_engine_error_propagates_unchanged() {
        let runner = Runner::new(FailingEngine, registry());
        let err = runner.run(true).unwrap_err();
        assert!(matches!(err, SimError::Execution(ref msg) if msg == "worker lost"));
    }

    #[test]
    fn test_engine_by_reference() {
        let engine = FakeEngine::new(1);
        let runner = Runner::new(&engine, registry());
        assert_eq!(runner.run(true).unwrap().len(), 2);
        assert_eq!(engine.calls.get(), 1);
    }

    #[test]
    fn test_default_runner_uses_multi_mode() {
        let runner = Runner::with_default_models();
        assert_eq!(runner.engine().context().mode, ExecutionMode::Multi);
        assert_eq!(runner.registry().len(), 4);
    }

    #[test]
    fn test_executor_output_passes_through() {
        let registry: ConfigRegistry = [ModelKind::Sir.config().timesteps(3)].into_iter().collect();
        let runner = Runner::multi(registry);
        let table = runner.run(true).unwrap();

        // 2 beta values x (1 initial + 3 timesteps x 2 blocks)
        assert_eq!(table.len(), 14);
        assert_eq!(
            &table.columns()[..6],
            &["simulation", "subset", "run", "substep", "timestep", "model"]
        );
    }
}
