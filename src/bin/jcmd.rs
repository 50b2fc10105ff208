// src/bin/jcmd.rs

use clap::Parser;
use colored::*;
use jcmd::cli::{self, Cli};

/// The main entry point of the `jcmd` binary.
/// Sets up logging, parses arguments and runs the interpreter until `quit` or end of input.
fn main() {
    env_logger::init();

    // Only startup failures reach here; errors inside the loop are reported by the interpreter.
    if let Err(e) = cli::run(Cli::parse()) {
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}
