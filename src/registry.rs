//! Ordered configuration registry.
//!
//! The registry is built explicitly and handed to the runner; nothing is
//! registered as a side effect. Order is registry order: it fixes the
//! `simulation` index of every configuration and the order of output rows.

use crate::config::RunConfig;
use crate::engine::model::Configuration;
use crate::error::SimResult;
use crate::models::ModelKind;

/// Ordered collection of configurations.
#[derive(Debug, Clone, Default)]
pub struct ConfigRegistry {
    configs: Vec<Configuration>,
}

impl ConfigRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in models: SIR, SEIR, SEIRD, stochastic SEIR.
    #[must_use]
    pub fn default_models() -> Self {
        ModelKind::ALL.into_iter().map(ModelKind::config).collect()
    }

    /// Build the registry described by a run configuration.
    ///
    /// An empty `models` list selects the built-in models.
    ///
    /// # Errors
    ///
    /// Returns an error if a model override is invalid.
    pub fn from_run_config(run_config: &RunConfig) -> SimResult<Self> {
        if run_config.models.is_empty() {
            return Ok(Self::default_models());
        }

        let mut registry = Self::new();
        for spec in &run_config.models {
            registry.register(spec.build()?);
        }
        Ok(registry)
    }

    /// Append a configuration.
    pub fn register(&mut self, config: Configuration) -> &mut Self {
        self.configs.push(config);
        self
    }

    /// Number of registered configurations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.configs.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Iterate in registry order.
    pub fn iter(&self) -> std::slice::Iter<'_, Configuration> {
        self.configs.iter()
    }

    /// Registered configurations as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Configuration] {
        &self.configs
    }

    /// Model names in registry order.
    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.configs.iter().map(|c| c.model.as_str())
    }
}

impl FromIterator<Configuration> for ConfigRegistry {
    fn from_iter<I: IntoIterator<Item = Configuration>>(iter: I) -> Self {
        Self {
            configs: iter.into_iter().collect(),
        }
    }
}

impl Extend<Configuration> for ConfigRegistry {
    fn extend<I: IntoIterator<Item = Configuration>>(&mut self, iter: I) {
        self.configs.extend(iter);
    }
}

impl<'a> IntoIterator for &'a ConfigRegistry {
    type Item = &'a Configuration;
    type IntoIter = std::slice::Iter<'a, Configuration>;

    fn into_iter(self) -> Self::IntoIter {
        self.configs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_models_order() {
        let registry = ConfigRegistry::default_models();
        let names: Vec<&str> = registry.model_names().collect();
        assert_eq!(names, vec!["sir", "seir", "seird", "stochastic-seir"]);
    }

    #[test]
    fn test_register_and_extend() {
        let mut registry = ConfigRegistry::new();
        assert!(registry.is_empty());

        registry.register(ModelKind::Seir.config());
        registry.extend([ModelKind::Sir.config()]);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.as_slice()[0].model, "seir");
        assert_eq!(registry.iter().nth(1).map(|c| c.model.as_str()), Some("sir"));
    }

    #[test]
    fn test_from_empty_run_config_uses_defaults() {
        let registry = ConfigRegistry::from_run_config(&RunConfig::default()).unwrap();
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_from_run_config_selects_models() {
        let yaml = r"
models:
  - model: seird
  - model: sir
    timesteps: 10
";
        let run_config = RunConfig::from_yaml(yaml).unwrap();
        let registry = ConfigRegistry::from_run_config(&run_config).unwrap();

        let names: Vec<&str> = registry.model_names().collect();
        assert_eq!(names, vec!["seird", "sir"]);
        assert_eq!(registry.as_slice()[1].timesteps, 10);
    }
}
