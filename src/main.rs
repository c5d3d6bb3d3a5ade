//! Kiln - a front-end asset pipeline with a live-reload dev server.

mod actor;
mod cache;
mod cli;
mod config;
mod core;
mod embed;
mod image;
mod logger;
mod pipeline;
mod reload;
mod report;
mod task;
mod transform;
mod utils;

use clap::{ColorChoice, Parser};
use cli::Cli;
use config::KilnConfig;
use report::TerminalReporter;
use std::process::ExitCode;
use std::sync::Arc;
use task::{Orchestrator, TaskFailure};
use transform::BuildContext;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<TaskFailure>() {
                Some(failure) => failure.report(&TerminalReporter),
                None => log!("error"; "{:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    // Before any blocking operation
    core::setup_shutdown_handler()?;

    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));

    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = KilnConfig::load(&cli.config, cli.mode)?;
    let ctx = BuildContext::new(Arc::new(config));
    Orchestrator::new(ctx).run(cli.command.task())
}
