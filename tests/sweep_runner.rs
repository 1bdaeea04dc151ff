use episweep::engine::output::{EngineOutput, Record, TensorField, Value};
use episweep::prelude::*;
use proptest::prelude::*;

/// Records `rows` rows per configuration, tagged with the model name.
struct EchoEngine {
    rows: usize,
}

impl Engine for EchoEngine {
    fn execute(&self, configs: &[Configuration]) -> SimResult<EngineOutput> {
        let records = configs
            .iter()
            .flat_map(|c| {
                (0..self.rows)
                    .map(move |row| Record::new().with("model", c.model.as_str()).with("row", row))
            })
            .collect();
        Ok((records, TensorField::default(), Vec::new()))
    }
}

fn executor(mode: ExecutionMode, seed: u64) -> Executor {
    Executor::new(ExecutionContext::new(mode).with_workers(4).with_seed(seed))
}

fn short_registry(kinds: &[ModelKind]) -> ConfigRegistry {
    kinds.iter().map(|k| k.config().timesteps(20)).collect()
}

/// Rows of one model as sorted `(column, value)` lists, without the
/// registry-position column.
fn model_rows(table: &Table, model: &str) -> Vec<Vec<(String, Value)>> {
    table
        .to_records()
        .iter()
        .filter(|record| record.get("model").and_then(Value::as_str) == Some(model))
        .map(|record| {
            let mut cells: Vec<(String, Value)> = record
                .iter()
                .filter(|(column, _)| *column != "simulation")
                .map(|(column, value)| (column.to_string(), value.clone()))
                .collect();
            cells.sort_by(|a, b| a.0.cmp(&b.0));
            cells
        })
        .collect()
}

// H0: the table is not the concatenation of per-configuration outputs
// Falsification: fake engine with N configurations, compare row blocks
#[test]
fn h0_1_rows_concatenate_configuration_outputs() {
    let registry = short_registry(&[ModelKind::Seir, ModelKind::Sir, ModelKind::Seird]);
    let table = Runner::new(EchoEngine { rows: 4 }, registry).run(true).unwrap();

    assert_eq!(table.len(), 12);
    let models: Vec<&str> = table
        .column("model")
        .unwrap()
        .into_iter()
        .map(|v| v.and_then(Value::as_str).unwrap())
        .collect();
    assert_eq!(&models[0..4], &["seir"; 4]);
    assert_eq!(&models[4..8], &["sir"; 4]);
    assert_eq!(&models[8..12], &["seird"; 4]);
}

// H0: drop_midsteps changes the result
// Falsification: run(true) vs run(false) on the real executor
#[test]
fn h0_2_drop_midsteps_is_inert() {
    let runner = Runner::new(
        executor(ExecutionMode::Multi, 42),
        short_registry(&ModelKind::ALL),
    );
    assert_eq!(runner.run(true).unwrap(), runner.run(false).unwrap());
}

// H0: an empty registry errors or yields rows
#[test]
fn h0_3_empty_registry_yields_empty_table() {
    let runner = Runner::new(executor(ExecutionMode::Multi, 42), ConfigRegistry::new());
    let table = runner.run(true).unwrap();
    assert!(table.is_empty());
    assert!(table.columns().is_empty());
}

// H0: registry order changes row content, not just row order
// Falsification: compare per-model rows between two registry orders,
// stochastic model included
#[test]
fn h0_4_reordering_only_moves_rows() {
    let forward = Runner::new(
        executor(ExecutionMode::Single, 7),
        short_registry(&[ModelKind::Sir, ModelKind::StochasticSeir, ModelKind::Seird]),
    )
    .run(true)
    .unwrap();
    let backward = Runner::new(
        executor(ExecutionMode::Multi, 7),
        short_registry(&[ModelKind::Seird, ModelKind::StochasticSeir, ModelKind::Sir]),
    )
    .run(true)
    .unwrap();

    assert_eq!(forward.len(), backward.len());
    for model in ["sir", "stochastic-seir", "seird"] {
        assert_eq!(
            model_rows(&forward, model),
            model_rows(&backward, model),
            "rows of {model} changed"
        );
    }
}

// H0: adding a configuration changes the rows of the others
#[test]
fn h0_4b_added_configuration_leaves_stochastic_rows_alone() {
    let alone = Runner::new(
        executor(ExecutionMode::Single, 7),
        short_registry(&[ModelKind::StochasticSeir]),
    )
    .run(true)
    .unwrap();
    let extended = Runner::new(
        executor(ExecutionMode::Single, 7),
        short_registry(&[ModelKind::Sir, ModelKind::StochasticSeir]),
    )
    .run(true)
    .unwrap();

    assert_eq!(
        model_rows(&alone, "stochastic-seir"),
        model_rows(&extended, "stochastic-seir")
    );
}

// H0: parallel execution differs from sequential execution
#[test]
fn h0_5_single_and_multi_agree() {
    let registry = short_registry(&ModelKind::ALL);
    let single = Runner::new(executor(ExecutionMode::Single, 3), registry.clone())
        .run(true)
        .unwrap();
    let multi = Runner::new(executor(ExecutionMode::Multi, 3), registry)
        .run(true)
        .unwrap();
    assert_eq!(single, multi);
}

// H0: the same seed produces different stochastic output
#[test]
fn h0_6_stochastic_output_reproducible() {
    let registry = short_registry(&[ModelKind::StochasticSeir]);
    let a = Runner::new(executor(ExecutionMode::Multi, 11), registry.clone())
        .run(true)
        .unwrap();
    let b = Runner::new(executor(ExecutionMode::Multi, 11), registry.clone())
        .run(true)
        .unwrap();
    let c = Runner::new(executor(ExecutionMode::Multi, 12), registry)
        .run(true)
        .unwrap();

    assert_eq!(a, b);
    assert_ne!(a, c);
}

// H0: deterministic models lose or create population
#[test]
fn h0_7_deterministic_models_conserve_population() {
    let table = Runner::new(
        executor(ExecutionMode::Multi, 42),
        short_registry(&[ModelKind::Sir, ModelKind::Seir, ModelKind::Seird]),
    )
    .run(true)
    .unwrap();

    let compartments = ["susceptible", "exposed", "infected", "recovered", "deceased"];
    for i in 0..table.len() {
        let total: f64 = compartments
            .iter()
            .filter_map(|c| table.get(i, c).and_then(Value::as_f64))
            .sum();
        assert!((total - 10_000.0).abs() < 1e-6, "row {i}: total {total}");
    }
}

#[test]
fn test_default_run_covers_builtin_models() {
    let table = episweep::run(true).unwrap();

    // sir 2x(1+200), seir 2x(1+300), seird 2x(1+300), stochastic 3x(1+200)
    assert_eq!(table.len(), 402 + 602 + 602 + 603);
    assert_eq!(
        &table.columns()[..6],
        &["simulation", "subset", "run", "substep", "timestep", "model"]
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_row_count_matches_sweep(
        betas in prop::collection::vec(0.05f64..0.5, 1..4),
        gammas in prop::collection::vec(0.05f64..0.3, 1..3),
        timesteps in 1u64..10,
    ) {
        let config = ModelKind::Sir
            .config()
            .sweep(ParamSweep::new().with("beta", betas.clone()).with("gamma", gammas.clone()))
            .timesteps(timesteps);
        let registry: ConfigRegistry = [config].into_iter().collect();
        let table = Runner::new(executor(ExecutionMode::Single, 0), registry).run(true).unwrap();

        let per_job = 1 + timesteps as usize * 2;
        prop_assert_eq!(table.len(), betas.len() * gammas.len() * per_job);
    }
}
