// src/bin/wuforge.rs

use clap::Parser;
use colored::Colorize;
use wuforge::cli::{args::Cli, handlers};

/// Entry point: set up logging, parse arguments, dispatch, and report
/// errors with their full context chain.
fn main() {
    env_logger::init();

    if let Err(e) = handlers::dispatch(Cli::parse()) {
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}
