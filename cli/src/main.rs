mod arg_parser;
mod logging;
mod shell;
mod tokenizer;

use anyhow::{Context, Result};
use arg_parser::ArgParser;
use clap::Parser;
use joblib::JobCoordinator;
use nix::sys::signal::{self, SigHandler, Signal};
use std::io;
use tracing::debug;

fn main() -> Result<()> {
    let args = ArgParser::parse();
    logging::init_logging(args.log_level)?;

    // operator interrupts must not take the supervisor (or its jobs) down;
    // children restore the default disposition before exec
    unsafe { signal::signal(Signal::SIGINT, SigHandler::SigIgn) }
        .context("failed to ignore SIGINT")?;
    debug!(?args, "starting supervisor");

    let mut coordinator = JobCoordinator::new();
    let stdin = io::stdin();
    let stdout = io::stdout();
    shell::run(
        &mut coordinator,
        stdin.lock(),
        &mut stdout.lock(),
        !args.no_prompt,
    )
    .context("operator stream failed")?;

    Ok(())
}
