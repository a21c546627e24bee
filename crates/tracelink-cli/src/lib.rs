//! Tracelink CLI library.
//!
//! Configuration loading, artifact and link file handling, the `link`,
//! `analyze`, `run` and `config` commands, and summary formatting for the
//! `tracelink` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod pipeline;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
pub use pipeline::Pipeline;
