#![warn(clippy::uninlined_format_args)]

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod output;
pub mod paths;
pub mod report;
pub mod sweep;
pub mod tracing_setup;

pub use cli::{Cli, Commands};
pub use error::{Error, Result};
