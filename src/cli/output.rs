//! CLI output formatting.
//!
//! Text is built by `*_text` functions so it can be tested; the `print_*`
//! functions only write it out.

use std::fmt::Write as _;
use std::time::Duration;

use crate::config::RunConfig;
use crate::models::ModelKind;
use crate::table::Table;

/// Version line, including the git hash when the build captured one.
#[must_use]
pub fn version_text() -> String {
    let version = option_env!("EPISWEEP_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
    match option_env!("GIT_HASH").filter(|h| !h.is_empty()) {
        Some(hash) => format!("episweep {version} ({})", &hash[..hash.len().min(12)]),
        None => format!("episweep {version}"),
    }
}

/// Print version information.
pub fn print_version() {
    println!("{}", version_text());
}

/// Print help message.
pub fn print_help() {
    println!(
        r"episweep - parameter sweeps over compartmental epidemic models

USAGE:
    episweep <COMMAND> [OPTIONS]

COMMANDS:
    run [config.yaml]           Run a sweep (built-in models if no file given)
        --seed <N>              Override the master seed
        --mode <single|multi>   Override the execution mode
        --workers <N>           Override the worker count
        --format <csv|json>     Output format (default: csv)
        --output <PATH>         Write the table to a file instead of stdout
        -v, --verbose           Print a run summary to stderr

    models                      List built-in models and their parameters

    help                        Show this help message
    version                     Show version information

EXAMPLES:
    episweep run
    episweep run sweep.yaml --seed 7 --mode single
    episweep run --format json --output results.json

Set RUST_LOG=episweep=debug for execution logs.
"
    );
}

/// Listing of the built-in models.
#[must_use]
pub fn models_text() -> String {
    let mut text = String::new();
    for kind in ModelKind::ALL {
        let config = kind.config();
        let _ = writeln!(text, "{:<16} {}", kind.name(), kind.description());
        let _ = writeln!(
            text,
            "{:<16} compartments: {}",
            "",
            config
                .initial_state
                .keys()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
        for (name, values) in config.params.iter() {
            let _ = writeln!(text, "{:<16} {name} = {values:?}", "");
        }
        let _ = writeln!(
            text,
            "{:<16} timesteps: {}, runs: {}, subsets: {}",
            "",
            config.timesteps,
            config.runs,
            config.params.subset_count()
        );
    }
    text
}

/// Print the built-in models.
pub fn print_models() {
    print!("{}", models_text());
}

/// Summary of a finished run.
#[must_use]
pub fn run_summary_text(config: &RunConfig, table: &Table, elapsed: Duration) -> String {
    let destination = config
        .output
        .path
        .as_ref()
        .map_or_else(|| "stdout".to_string(), |p| p.display().to_string());

    let mut text = String::new();
    let _ = writeln!(text, "Mode:    {}", config.execution.mode);
    let _ = writeln!(text, "Seed:    {}", config.reproducibility.seed);
    let _ = writeln!(text, "Rows:    {}", table.len());
    let _ = writeln!(text, "Columns: {}", table.columns().len());
    let _ = writeln!(text, "Output:  {destination} ({})", config.output.format);
    let _ = writeln!(text, "Elapsed: {:.3}s", elapsed.as_secs_f64());
    text
}

/// Print the run summary to stderr.
pub fn print_run_summary(config: &RunConfig, table: &Table, elapsed: Duration) {
    eprint!("{}", run_summary_text(config, table, elapsed));
}
