//! replwatch command-line front end
//!
//! Argument parsing, configuration, logging and the mapping from a check
//! report to a process exit code. The measurement itself lives in
//! `replwatch-core`.

pub mod app;
pub mod cli;
pub mod config;
pub mod logging;

pub use cli::Cli;
pub use config::Config;
