//! Simulation engine.
//!
//! Implements the sweep execution contract:
//! - Configuration objects built from partial state update blocks
//! - Parameter-sweep expansion (Cartesian product)
//! - Deterministic RNG (PCG with keyed per-job streams)
//! - Jidoka guards for stop-on-error
//! - Sequential and work-stealing parallel execution

pub mod executor;
pub mod jidoka;
pub mod model;
pub mod output;
pub mod rng;
pub mod sweep;

pub use executor::{Engine, ExecutionContext, ExecutionMode, Executor, WorkStealingPool};
pub use jidoka::{JidokaConfig, JidokaGuard};
pub use model::{Configuration, Signals, State, UpdateBlock};
pub use output::{EngineOutput, RawResult, Record, Session, TensorField, Value};
pub use rng::SimRng;
pub use sweep::{ParamSweep, Params};
