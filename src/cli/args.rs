//! CLI argument parsing.
//!
//! Hand-rolled parser over any iterator of strings so that parsing can be
//! tested without touching the process environment.

use std::path::PathBuf;

use crate::engine::executor::ExecutionMode;
use crate::table::TableFormat;

/// CLI arguments container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    /// The command to execute.
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run a sweep
    Run(RunOptions),
    /// List built-in models
    Models,
    /// Show help
    Help,
    /// Show version
    Version,
}

/// Options of the `run` command. `None` keeps the run configuration's value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Optional run configuration file.
    pub config_path: Option<PathBuf>,
    /// Seed override.
    pub seed: Option<u64>,
    /// Execution mode override.
    pub mode: Option<ExecutionMode>,
    /// Worker count override.
    pub workers: Option<usize>,
    /// Output format override.
    pub format: Option<TableFormat>,
    /// Output path override.
    pub output: Option<PathBuf>,
    /// Print a run summary to stderr.
    pub verbose: bool,
}

impl Args {
    /// Parse command-line arguments from an iterator.
    #[must_use]
    pub fn parse_from<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();
        Self::parse_from_vec(&args)
    }

    /// Parse command-line arguments from the environment.
    #[must_use]
    pub fn parse() -> Self {
        Self::parse_from(std::env::args())
    }

    fn parse_from_vec(args: &[String]) -> Self {
        if args.len() < 2 {
            return Self {
                command: Command::Help,
            };
        }

        let command = match args[1].as_str() {
            "run" => Self::parse_run_command(&args[2..]),
            "models" => Command::Models,
            "-h" | "--help" | "help" => Command::Help,
            "-V" | "--version" | "version" => Command::Version,
            unknown => {
                eprintln!("Unknown command: {unknown}");
                Command::Help
            }
        };

        Self { command }
    }

    /// Parse the 'run' command arguments (everything after `run`).
    fn parse_run_command(args: &[String]) -> Command {
        let mut options = RunOptions::default();

        let mut i = 0;
        while i < args.len() {
            let flag = args[i].as_str();
            let value = args.get(i + 1).map(String::as_str);

            match flag {
                "-v" | "--verbose" => {
                    options.verbose = true;
                    i += 1;
                    continue;
                }
                "--seed" => options.seed = parse_value(flag, value),
                "--mode" => options.mode = parse_value(flag, value),
                "--workers" => options.workers = parse_value(flag, value),
                "--format" => options.format = parse_value(flag, value),
                "--output" | "-o" => options.output = value.map(PathBuf::from),
                positional if !positional.starts_with('-') && options.config_path.is_none() => {
                    options.config_path = Some(PathBuf::from(positional));
                    i += 1;
                    continue;
                }
                other => {
                    eprintln!("Ignoring unexpected argument: {other}");
                    i += 1;
                    continue;
                }
            }

            if value.is_none() {
                eprintln!("Error: '{flag}' requires a value");
            }
            i += 2;
        }

        Command::Run(options)
    }
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<&str>) -> Option<T> {
    let raw = value?;
    let parsed = raw.parse().ok();
    if parsed.is_none() {
        eprintln!("Ignoring invalid value for {flag}: {raw}");
    }
    parsed
}
