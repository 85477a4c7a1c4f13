//! compreq: compute version requirements for Python dependencies.
//!
//! Requirements are recomputed from release metadata according to a policy,
//! e.g. "at least the three latest minor releases, below the next major".

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod commands;
mod context;
mod output;
mod policy;

use clap::Parser;
use commands::{Cli, Commands};
use context::CliContext;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 if cli.quiet => Level::ERROR,
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    output::init(cli.no_ansi);

    let ctx = match CliContext::new(&cli) {
        Ok(ctx) => ctx,
        Err(e) => {
            output::error(&format!("Failed to initialize: {e:#}"));
            return ExitCode::FAILURE;
        }
    };

    match run_command(&cli, &ctx) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run_command(cli: &Cli, ctx: &CliContext) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Releases(args) => commands::releases::run(ctx, args),
        Commands::Bounds(args) => commands::bounds::run(args),
        Commands::Resolve(args) => commands::resolve::run(ctx, args),
        Commands::Update(args) => commands::update::run(ctx, args),
        Commands::Python(args) => commands::python::run(ctx, args),
    }
}
