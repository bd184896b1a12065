//! Command Line Interface (CLI) layer for SARPLAN.
//!
//! `args` defines the flags, `errors` the CLI-level failures and `runner`
//! turns a config file plus overrides into one `sarplan::api` run. Embedders
//! should call `sarplan::api` directly.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
