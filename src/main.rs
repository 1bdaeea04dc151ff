//! episweep CLI - parameter sweeps over compartmental epidemic models
//!
//! Thin entry point: installs the log subscriber and delegates to the CLI
//! module.

use std::process::ExitCode;

use episweep::cli::{run_cli, Args};
use tracing_subscriber::EnvFilter;

/// Install a stderr subscriber honouring `RUST_LOG`, defaulting to `warn`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    init_tracing();
    run_cli(Args::parse())
}
