//! Command line interface for server_state_patcher.
//!
//! Parses the patch configuration, runs one session and turns the report into
//! console output and an exit code.

mod args;
pub mod commands;
mod output;

pub use args::{Args, RuntimeConfig};
pub use commands::{execute_command, exit_code};
pub use output::OutputManager;

use crate::error::Result;

/// Main CLI entry point
pub fn run() -> Result<i32> {
    let args = Args::parse_args();
    execute_command(args)
}
