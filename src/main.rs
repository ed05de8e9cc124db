//! LatexMake - Build LaTeX documents until every reference is resolved.

mod auxfile;
mod cli;
mod config;
mod error;
mod logger;
mod maker;
mod notify;
mod preview;
mod project;
mod texlog;
mod utils;

use anyhow::{Result, bail};
use clap::Parser;
use cli::Cli;
use config::Config;
use error::LatexMkError;
use logger::{Level, Logger};
use maker::LatexMaker;
use notify::Notifier;
use std::process;
use utils::exec::ProcessRunner;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = Level::from_flags(cli.quiet, cli.debug);

    let config = match Config::load(&cli) {
        Ok(config) => config,
        Err(err) => exit_with(&Logger::new(level, None), err.into()),
    };

    let notifier = if config.behavior.notify {
        match Notifier::detect() {
            Some(notifier) => Some(notifier),
            None => bail!(
                "Unable to use desktop notification ('-N', '--notify'): `notify-send` was not found"
            ),
        }
    } else {
        None
    };
    let logger = Logger::new(level, notifier);
    log!(logger, Debug, "args"; "{cli:?}");

    if let Err(err) = build(&cli, &config, &logger) {
        exit_with(&logger, err);
    }
    Ok(())
}

/// Resolve the document and build it.
fn build(cli: &Cli, config: &Config, logger: &Logger) -> error::Result<()> {
    let name = project::resolve(&config.root, cli.filename.as_deref(), logger)?;
    LatexMaker::new(config, name, logger, ProcessRunner).run()
}

/// Report a fatal error and terminate with status 1.
fn exit_with(logger: &Logger, err: LatexMkError) -> ! {
    // compile errors were already reported together with the log excerpt
    if !matches!(err, LatexMkError::Compile(_)) {
        log!(logger, Error, "error"; "{err}");
    }
    log!(logger, Error, "error"; "! Exiting...");
    process::exit(1);
}
