//! SARPLAN CLI entrypoint.
//!
//! Thin wrapper over the `cli` module: parse args, plan and run, and exit
//! non-zero when anything failed. For programmatic use, prefer the library
//! API (`sarplan::api`).

use clap::Parser;

mod cli;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = cli::CliArgs::parse();
    cli::run(args)
}
