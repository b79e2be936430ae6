//! # os-flavor-selector
//!
//! Retrieve the compute flavors visible to an OpenStack project, narrow them
//! down by name, VCPU and memory ranges, and present them either as an
//! interactive table or as line-oriented text/JSON.

pub mod cli;
pub mod config;
pub mod display;
pub mod errors;
pub mod interactive;
pub mod output;

// Re-export main public types
pub use errors::{CliError, Result};

// Re-export for CLI usage
pub use cli::{run_cli, Cli, OutputMode};
pub use config::Config;
