mod cli;
mod core;
mod error;
mod tui;

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::core::Runner;
use crate::error::AppError;

fn main() {
    if let Err(err) = run(Cli::parse()) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    init_tracing(cli.verbose, cli.log_file.as_deref(), cli.command.is_some())?;

    let runner = Runner::new(cli.locator());
    match cli.command {
        Some(Commands::Convert(args)) => match cli::convert(&runner, args).reason() {
            None => Ok(()),
            Some(reason) => Err(AppError::ConversionFailed { reason }),
        },
        Some(Commands::Engine) => {
            for line in cli::engine_lines(runner.locator()) {
                println!("{line}");
            }
            Ok(())
        }
        None => tui::run(runner),
    }
}

/// The TUI owns the terminal, so it only logs when given a file.
fn init_tracing(verbose: u8, log_file: Option<&Path>, headless: bool) -> Result<(), AppError> {
    let default_filter = match verbose {
        0 => "ffconvert=info",
        1 => "ffconvert=debug",
        _ => "ffconvert=trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    match log_file {
        Some(path) => {
            let file = File::create(path).map_err(|source| AppError::LogFile {
                path: path.to_path_buf(),
                source,
            })?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None if headless => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        None => {}
    }

    Ok(())
}
