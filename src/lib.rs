//! # episweep
//!
//! Parameter-sweep runner for compartmental epidemic models.
//!
//! Configurations (initial state, partial state update blocks, parameter
//! sweep, timesteps, runs) are registered into a [`ConfigRegistry`] and
//! executed by an [`Engine`](engine::Engine). The [`Runner`] collects the
//! engine's raw per-substep records into a [`Table`].
//!
//! Built-in models: SIR, SEIR, SEIRD and a chain-binomial stochastic SEIR.
//!
//! ## Example
//!
//! ```rust
//! use episweep::prelude::*;
//!
//! let registry: ConfigRegistry = [ModelKind::Sir.config().timesteps(5)]
//!     .into_iter()
//!     .collect();
//! let table = Runner::multi(registry).run(true)?;
//! assert_eq!(table.columns()[0], "simulation");
//! # Ok::<(), episweep::SimError>(())
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::suboptimal_flops,
    clippy::imprecise_flops,
    clippy::too_many_lines,
    clippy::missing_const_for_fn,
)]

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod registry;
pub mod runner;
pub mod table;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{ModelSpec, RunConfig, RunConfigBuilder};
    pub use crate::engine::executor::{Engine, ExecutionContext, ExecutionMode, Executor};
    pub use crate::engine::jidoka::{JidokaConfig, JidokaGuard};
    pub use crate::engine::model::{Configuration, UpdateBlock};
    pub use crate::engine::output::{Record, Value};
    pub use crate::engine::rng::SimRng;
    pub use crate::engine::sweep::ParamSweep;
    pub use crate::error::{SimError, SimResult};
    pub use crate::models::ModelKind;
    pub use crate::registry::ConfigRegistry;
    pub use crate::runner::Runner;
    pub use crate::table::{Table, TableFormat};
}

/// Re-export for public API
pub use error::{SimError, SimResult};
pub use registry::ConfigRegistry;
pub use runner::{run, Runner};
pub use table::Table;
