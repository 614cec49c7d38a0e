//! STAR CLI: the command-line driver for STA path reporting.
//!
//! Provides `star run` to classify and aggregate the timing paths of a run and
//! emit the text indexes and handoff payload, and `star check` to validate a
//! `star.toml` without touching any path data.

#![warn(missing_docs)]

mod check;
mod pipeline;
mod run;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// STAR: static timing analysis reporting.
#[derive(Parser, Debug)]
#[command(name = "star", version, about = "STA path classification and reporting")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output, including diagnostic notes and per-batch details.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `star.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Aggregate path dumps and emit the index and handoff files.
    Run(RunArgs),
    /// Load and validate the configuration only.
    Check,
}

/// Arguments for the `star run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Directory of per-scenario JSON path dumps.
    #[arg(long)]
    pub paths: String,

    /// Output directory (overrides `misc.output_dir`).
    #[arg(short, long)]
    pub out: Option<String>,

    /// Do not launch the publisher even if `misc.publisher` is set.
    #[arg(long)]
    pub no_publish: bool,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => term_is_set(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Run(ref args) => run::run(args, &global),
        Command::Check => check::run(&global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("{}", abnormal_exit_banner());
            process::exit(1);
        }
    }
}

/// The banner printed when a run stops on a fatal error.
fn abnormal_exit_banner() -> String {
    let line = "#".repeat(60);
    format!("{line}\n# star: ABNORMAL EXIT, no reports were published\n{line}")
}

/// Rough color detection from the TERM environment variable.
fn term_is_set() -> bool {
    std::env::var("TERM").is_ok_and(|t| t != "dumb")
}
