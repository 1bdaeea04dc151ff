//! Engine output types.
//!
//! An execution yields three things: the raw per-iteration records, a
//! tensor field describing the sweep space, and one session per job.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column name of the registry index.
pub const SIMULATION_COLUMN: &str = "simulation";
/// Column name of the parameter-subset index.
pub const SUBSET_COLUMN: &str = "subset";
/// Column name of the Monte Carlo run (1-based).
pub const RUN_COLUMN: &str = "run";
/// Column name of the substep (block index + 1, 0 for the initial state).
pub const SUBSTEP_COLUMN: &str = "substep";
/// Column name of the timestep.
pub const TIMESTEP_COLUMN: &str = "timestep";
/// Column name of the model name.
pub const MODEL_COLUMN: &str = "model";

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Integer value (indices, counters).
    Int(i64),
    /// Floating-point value (compartment sizes).
    Float(f64),
    /// Text value (model names).
    Text(String),
}

impl Value {
    /// Numeric view of the value, if it has one.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    /// Integer view of the value.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Text view of the value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Self::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// One row of raw output: an ordered mapping from column name to value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column, keeping its original position if it already exists.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(column.into(), value.into());
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    /// Look up a column.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    /// Column names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// `(column, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

/// Raw engine output, one record per iteration.
pub type RawResult = Vec<Record>;

/// Description of one partial state update block of one configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockEntry {
    /// Registry index of the configuration.
    pub simulation: usize,
    /// Model name.
    pub model: String,
    /// Block index (substep - 1).
    pub block: usize,
    /// Policy names in the block.
    pub policies: Vec<String>,
    /// State variables updated by the block.
    pub variables: Vec<String>,
}

/// One expanded parameter combination of one configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsetEntry {
    /// Registry index of the configuration.
    pub simulation: usize,
    /// Subset index within the configuration's sweep.
    pub subset: usize,
    /// Parameter values of the subset.
    pub params: IndexMap<String, f64>,
}

/// Auxiliary description of the sweep space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TensorField {
    /// Every block of every configuration.
    pub blocks: Vec<BlockEntry>,
    /// Every parameter subset of every configuration.
    pub subsets: Vec<SubsetEntry>,
}

impl TensorField {
    /// Whether the field describes no configuration at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.subsets.is_empty()
    }
}

/// Metadata of one executed job (simulation × subset × run).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Stable identifier: blake3 of model, subset, run and seed.
    pub id: String,
    /// Registry index of the configuration.
    pub simulation: usize,
    /// Subset index.
    pub subset: usize,
    /// Monte Carlo run (1-based).
    pub run: u32,
    /// Model name.
    pub model: String,
    /// Parameter values of the job.
    pub params: IndexMap<String, f64>,
    /// RNG seed derived for the job.
    pub seed: u64,
}

impl Session {
    /// Compute the session id for a job.
    #[must_use]
    pub fn compute_id(model: &str, subset: usize, run: u32, seed: u64) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(model.as_bytes());
        hasher.update(&(subset as u64).to_le_bytes());
        hasher.update(&run.to_le_bytes());
        hasher.update(&seed.to_le_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

/// Everything an engine returns: `(raw rows, tensor field, sessions)`.
pub type EngineOutput = (RawResult, TensorField, Vec<Session>);
