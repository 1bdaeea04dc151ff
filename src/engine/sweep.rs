//! Parameter-sweep expansion.
//!
//! A sweep maps each parameter to a list of candidate values. The expanded
//! subsets are the Cartesian product of those lists in row-major order: the
//! first parameter varies slowest, the last fastest.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// One concrete parameter combination.
pub type Params = IndexMap<String, f64>;

/// Ordered parameter sweep.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamSweep {
    values: IndexMap<String, Vec<f64>>,
}

impl ParamSweep {
    /// Create an empty sweep (one empty subset).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style: sweep `name` over `values`.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, values: impl Into<Vec<f64>>) -> Self {
        self.set(name, values);
        self
    }

    /// Sweep `name` over `values`, replacing any previous list.
    pub fn set(&mut self, name: impl Into<String>, values: impl Into<Vec<f64>>) {
        self.values.insert(name.into(), values.into());
    }

    /// Candidate values for a parameter.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.values.get(name).map(Vec::as_slice)
    }

    /// Parameter names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// `(name, values)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of swept parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no parameter is swept.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of subsets the sweep expands to.
    #[must_use]
    pub fn subset_count(&self) -> usize {
        self.values.values().map(Vec::len).product()
    }

    /// Check that every list is non-empty and every value finite.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the offending parameter.
    pub fn validate(&self) -> SimResult<()> {
        for (name, values) in &self.values {
            if values.is_empty() {
                return Err(SimError::config(format!(
                    "parameter '{name}' has an empty sweep"
                )));
            }
            if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
                return Err(SimError::config(format!(
                    "parameter '{name}' has non-finite value {bad}"
                )));
            }
        }
        Ok(())
    }

    /// Expand the sweep into concrete parameter subsets.
    #[must_use]
    pub fn subsets(&self) -> Vec<Params> {
        let total = self.subset_count();
        let mut out = Vec::with_capacity(total);

        for index in 0..total {
            let mut params = Params::with_capacity(self.values.len());
            let mut stride = total;
            for (name, values) in &self.values {
                stride /= values.len();
                let pick = (index / stride) % values.len();
                params.insert(name.clone(), values[pick]);
            }
            out.push(params);
        }

        out
    }
}
