//! Run configuration with YAML schema and validation.
//!
//! Implements Poka-Yoke (mistake-proofing) through:
//! - Type-safe configuration structs with `deny_unknown_fields`
//! - Range checks via `validator`
//! - Semantic validation of model overrides against the built-in models

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

use crate::engine::executor::{default_workers, ExecutionContext, ExecutionMode, DEFAULT_SEED};
use crate::engine::jidoka::JidokaConfig;
use crate::engine::model::Configuration;
use crate::error::{SimError, SimResult};
use crate::models::ModelKind;
use crate::table::TableFormat;

/// Top-level run configuration.
///
/// Every section is optional; an empty document runs the built-in models in
/// parallel with seed 42.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Schema version for forward compatibility.
    #[validate(length(min = 1))]
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Run metadata.
    #[serde(default)]
    pub simulation: SimulationMeta,

    /// Reproducibility settings.
    #[serde(default)]
    pub reproducibility: ReproducibilityConfig,

    /// Execution settings.
    #[validate(nested)]
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Jidoka (stop-on-error) configuration.
    #[serde(default)]
    pub jidoka: JidokaConfig,

    /// Output settings used by the CLI.
    #[serde(default)]
    pub output: OutputConfig,

    /// Models to run, in order. Empty selects every built-in model.
    #[validate(nested)]
    #[serde(default)]
    pub models: Vec<ModelSpec>,
}

fn default_schema_version() -> String {
    "1.0".to_string()
}

impl RunConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - YAML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> SimResult<Self> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml)?
        };

        // Poka-Yoke: validate all constraints
        config.validate()?;

        config.validate_semantic()?;

        Ok(config)
    }

    /// Create a builder for configuration.
    #[must_use]
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::default()
    }

    /// Validate semantic constraints beyond schema.
    fn validate_semantic(&self) -> SimResult<()> {
        if self.jidoka.negative_tolerance < 0.0 || self.jidoka.conservation_tolerance < 0.0 {
            return Err(SimError::config("Jidoka tolerances must be non-negative"));
        }

        for spec in &self.models {
            spec.check_overrides()?;
        }

        Ok(())
    }

    /// Execution context described by this configuration.
    #[must_use]
    pub fn execution_context(&self) -> ExecutionContext {
        ExecutionContext::new(self.execution.mode)
            .with_workers(self.execution.workers.unwrap_or_else(default_workers))
            .with_seed(self.reproducibility.seed)
            .with_jidoka(self.jidoka.clone())
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            simulation: SimulationMeta::default(),
            reproducibility: ReproducibilityConfig::default(),
            execution: ExecutionConfig::default(),
            jidoka: JidokaConfig::default(),
            output: OutputConfig::default(),
            models: Vec::new(),
        }
    }
}

/// Configuration builder for programmatic construction.
#[derive(Debug, Default)]
pub struct RunConfigBuilder {
    seed: Option<u64>,
    mode: Option<ExecutionMode>,
    workers: Option<usize>,
    models: Vec<ModelSpec>,
}

impl RunConfigBuilder {
    /// Set the random seed.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the execution mode.
    #[must_use]
    pub const fn mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Set the number of workers.
    #[must_use]
    pub const fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Append a model.
    #[must_use]
    pub fn model(mut self, spec: ModelSpec) -> Self {
        self.models.push(spec);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> RunConfig {
        let mut config = RunConfig::default();

        if let Some(seed) = self.seed {
            config.reproducibility.seed = seed;
        }
        if let Some(mode) = self.mode {
            config.execution.mode = mode;
        }
        if self.workers.is_some() {
            config.execution.workers = self.workers;
        }
        config.models = self.models;

        config
    }
}

/// Run metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationMeta {
    /// Run name.
    #[serde(default)]
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
}

/// Reproducibility settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReproducibilityConfig {
    /// Master seed for all RNG.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

const fn default_seed() -> u64 {
    DEFAULT_SEED
}

impl Default for ReproducibilityConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
        }
    }
}

/// Execution settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ExecutionConfig {
    /// Execution mode.
    #[serde(default)]
    pub mode: ExecutionMode,
    /// Worker threads; defaults to the number of CPUs.
    #[validate(range(min = 1, max = 1024))]
    #[serde(default)]
    pub workers: Option<usize>,
}

/// Output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Table format.
    #[serde(default)]
    pub format: TableFormat,
    /// Destination file; stdout when absent.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// One model to run, with optional overrides of its defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ModelSpec {
    /// Which built-in model.
    pub model: ModelKind,
    /// Horizon override.
    #[validate(range(max = 1_000_000))]
    #[serde(default)]
    pub timesteps: Option<u64>,
    /// Monte Carlo runs override.
    #[validate(range(min = 1, max = 100_000))]
    #[serde(default)]
    pub runs: Option<u32>,
    /// Parameter sweep overrides; each listed parameter replaces the default list.
    #[serde(default)]
    pub params: IndexMap<String, Vec<f64>>,
    /// Initial compartment overrides.
    #[serde(default)]
    pub initial: IndexMap<String, f64>,
}

impl ModelSpec {
    /// Spec selecting a model with its defaults.
    #[must_use]
    pub fn new(model: ModelKind) -> Self {
        Self {
            model,
            timesteps: None,
            runs: None,
            params: IndexMap::new(),
            initial: IndexMap::new(),
        }
    }

    /// Override the horizon.
    #[must_use]
    pub const fn timesteps(mut self, timesteps: u64) -> Self {
        self.timesteps = Some(timesteps);
        self
    }

    /// Override the number of runs.
    #[must_use]
    pub const fn runs(mut self, runs: u32) -> Self {
        self.runs = Some(runs);
        self
    }

    /// Override a parameter's sweep values.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, values: impl Into<Vec<f64>>) -> Self {
        self.params.insert(name.into(), values.into());
        self
    }

    /// Override an initial compartment.
    #[must_use]
    pub fn initial(mut self, compartment: impl Into<String>, value: f64) -> Self {
        self.initial.insert(compartment.into(), value);
        self
    }

    /// Check that every override names something the model has.
    fn check_overrides(&self) -> SimResult<()> {
        let known_params = self.model.parameters();
        for (name, values) in &self.params {
            if !known_params.contains(&name.as_str()) {
                return Err(SimError::config(format!(
                    "{}: unknown parameter '{name}' (expected one of {})",
                    self.model,
                    known_params.join(", ")
                )));
            }
            if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(SimError::config(format!(
                    "{}: parameter '{name}' must be finite and non-negative",
                    self.model
                )));
            }
        }

        let defaults = self.model.config();
        for (name, value) in &self.initial {
            if !defaults.initial_state.contains_key(name) {
                return Err(SimError::config(format!(
                    "{}: unknown compartment '{name}'",
                    self.model
                )));
            }
            if !value.is_finite() || *value < 0.0 {
                return Err(SimError::config(format!(
                    "{}: initial '{name}' must be finite and non-negative",
                    self.model
                )));
            }
        }

        Ok(())
    }

    /// Build the configuration: the model's defaults with overrides applied.
    ///
    /// # Errors
    ///
    /// Returns an error if an override is unknown or the result is invalid.
    pub fn build(&self) -> SimResult<Configuration> {
        self.check_overrides()?;

        let mut config = self.model.config();
        if let Some(timesteps) = self.timesteps {
            config.timesteps = timesteps;
        }
        if let Some(runs) = self.runs {
            config.runs = runs;
        }
        for (name, values) in &self.params {
            config.params.set(name.clone(), values.clone());
        }
        for (name, value) in &self.initial {
            config.initial_state.insert(name.clone(), *value);
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_is_default() {
        let config = RunConfig::from_yaml("").unwrap();
        assert_eq!(config.reproducibility.seed, 42);
        assert_eq!(config.execution.mode, ExecutionMode::Multi);
        assert!(config.models.is_empty());
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r"
schema_version: '1.0'
simulation:
  name: compartment sweep
reproducibility:
  seed: 7
execution:
  mode: single
  workers: 2
jidoka:
  conservation_tolerance: 0.001
output:
  format: json
  path: out.json
models:
  - model: sir
    timesteps: 30
    params:
      beta: [0.1, 0.2, 0.4]
    initial:
      infected: 50
  - model: stochastic-seir
    runs: 5
";
        let config = RunConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.simulation.name, "compartment sweep");
        assert_eq!(config.reproducibility.seed, 7);
        assert_eq!(config.execution.mode, ExecutionMode::Single);
        assert_eq!(config.output.format, TableFormat::Json);
        assert_eq!(config.models.len(), 2);

        let ctx = config.execution_context();
        assert_eq!(ctx.workers, 2);
        assert_eq!(ctx.seed, 7);
        assert!((ctx.jidoka.conservation_tolerance - 0.001).abs() < f64::EPSILON);

        let sir = config.models[0].build().unwrap();
        assert_eq!(sir.timesteps, 30);
        assert_eq!(sir.params.subset_count(), 3);
        assert!((sir.initial_state["infected"] - 50.0).abs() < f64::EPSILON);

        let stochastic = config.models[1].build().unwrap();
        assert_eq!(stochastic.runs, 5);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = RunConfig::from_yaml("execution:\n  threads: 4\n");
        assert!(matches!(result, Err(SimError::YamlParse(_))));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let result = RunConfig::from_yaml("execution:\n  workers: 0\n");
        assert!(matches!(result, Err(SimError::Validation(_))));
    }

    #[test]
    fn test_zero_runs_rejected() {
        let result = RunConfig::from_yaml("models:\n  - model: sir\n    runs: 0\n");
        assert!(matches!(result, Err(SimError::Validation(_))));
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let result = RunConfig::from_yaml("models:\n  - model: sir\n    params:\n      sigma: [0.2]\n");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("unknown parameter 'sigma'"));
    }

    #[test]
    fn test_unknown_compartment_rejected() {
        let spec = ModelSpec::new(ModelKind::Sir).initial("deceased", 1.0);
        assert!(spec.build().is_err());
    }

    #[test]
    fn test_negative_rate_rejected() {
        let spec = ModelSpec::new(ModelKind::Seir).param("gamma", vec![-0.1]);
        assert!(spec.build().is_err());
    }

    #[test]
    fn test_empty_sweep_rejected() {
        let spec = ModelSpec::new(ModelKind::Sir).param("beta", Vec::<f64>::new());
        let err = spec.build().unwrap_err();
        assert!(err.to_string().contains("empty sweep"));
    }

    #[test]
    fn test_builder() {
        let config = RunConfig::builder()
            .seed(99)
            .mode(ExecutionMode::Single)
            .workers(3)
            .model(ModelSpec::new(ModelKind::Seird).timesteps(5).runs(2))
            .build();

        assert_eq!(config.reproducibility.seed, 99);
        assert_eq!(config.execution.workers, Some(3));
        let built = config.models[0].build().unwrap();
        assert_eq!(built.timesteps, 5);
        assert_eq!(built.runs, 2);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.yaml");
        std::fs::write(&path, "reproducibility:\n  seed: 5\n").unwrap();

        let config = RunConfig::load(&path).unwrap();
        assert_eq!(config.reproducibility.seed, 5);
    }

    #[test]
    fn test_load_missing_file() {
        let result = RunConfig::load("/nonexistent/run.yaml");
        assert!(matches!(result, Err(SimError::Io(_))));
    }
}
