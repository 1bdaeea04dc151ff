//! CLI command handlers.

use std::io::Write;
use std::process::ExitCode;
use std::time::Instant;

use tracing::info;
use validator::Validate;

use crate::config::RunConfig;
use crate::engine::executor::Executor;
use crate::error::SimResult;
use crate::registry::ConfigRegistry;
use crate::runner::Runner;
use crate::table::Table;

use super::args::RunOptions;
use super::output::{print_help, print_models, print_run_summary, print_version};
use super::{Args, Command};

/// Main CLI entry point.
///
/// Dispatches to the appropriate command handler based on parsed arguments.
#[must_use]
pub fn run_cli(args: Args) -> ExitCode {
    match args.command {
        Command::Run(options) => run_sweep(&options),
        Command::Models => {
            print_models();
            ExitCode::SUCCESS
        }
        Command::Help => {
            print_help();
            ExitCode::SUCCESS
        }
        Command::Version => {
            print_version();
            ExitCode::SUCCESS
        }
    }
}

/// Run a sweep and emit the table to stdout or the configured output file.
#[must_use]
pub fn run_sweep(options: &RunOptions) -> ExitCode {
    let started = Instant::now();

    let result = resolve_run_config(options).and_then(|config| {
        let table = execute(&config)?;
        emit(&config, &table)?;
        Ok((config, table))
    });

    match result {
        Ok((config, table)) => {
            if options.verbose {
                print_run_summary(&config, &table, started.elapsed());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Load the run configuration (or the default) and apply CLI overrides.
///
/// # Errors
///
/// Returns error if the file cannot be loaded or an override is invalid.
pub fn resolve_run_config(options: &RunOptions) -> SimResult<RunConfig> {
    let mut config = match &options.config_path {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };

    if let Some(seed) = options.seed {
        config.reproducibility.seed = seed;
    }
    if let Some(mode) = options.mode {
        config.execution.mode = mode;
    }
    if options.workers.is_some() {
        config.execution.workers = options.workers;
    }
    if let Some(format) = options.format {
        config.output.format = format;
    }
    if let Some(path) = &options.output {
        config.output.path = Some(path.clone());
    }

    // Overrides obey the same ranges as the file
    config.validate()?;
    Ok(config)
}

/// Build the registry and executor a run configuration describes and run it.
///
/// # Errors
///
/// Returns error if a model override is invalid or the engine fails.
pub fn execute(config: &RunConfig) -> SimResult<Table> {
    let registry = ConfigRegistry::from_run_config(config)?;
    let context = config.execution_context();
    info!(
        models = registry.len(),
        mode = %context.mode,
        workers = context.workers,
        seed = context.seed,
        "starting sweep"
    );

    Runner::new(Executor::new(context), registry).run(true)
}

fn emit(config: &RunConfig, table: &Table) -> SimResult<()> {
    match &config.output.path {
        Some(path) => table.write(path, config.output.format),
        None => {
            let rendered = table.render(config.output.format)?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}
