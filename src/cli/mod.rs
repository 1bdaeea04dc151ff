//! CLI module for episweep.
//!
//! All CLI logic lives here so it can be tested; `main.rs` only installs
//! the log subscriber and calls [`run_cli`].

mod args;
mod commands;
mod output;

pub use args::{Args, Command, RunOptions};
pub use commands::{execute, resolve_run_config, run_cli, run_sweep};
pub use output::{
    models_text, print_help, print_models, print_run_summary, print_version, run_summary_text,
    version_text,
};
