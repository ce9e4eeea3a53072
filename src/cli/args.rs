//! Command line argument parsing.
//!
//! Every input of a patch session is a flag defaulting to the module's stock value,
//! so `server_state_patcher <PATH>` alone writes back the original operands.

use crate::config::{DEFAULT_CONSTANT, DEFAULT_DELAY, DEFAULT_DIVISOR, PatchConfig};
use clap::Parser;
use std::path::PathBuf;

/// Patch the sync delay constants of a compiled server-state module
#[derive(Parser, Debug)]
#[command(
    name = "server_state_patcher",
    version,
    about = "Patch the sync delay constants of a compiled server-state module",
    long_about = "Locate the sync delay instructions of a compiled server-state module by their
byte signatures and rewrite their operands in place. A full copy of the module is
written to <PATH>_backup before the first patch.

Usage:
  server_state_patcher citizen-server-state.dll --delay 75
  server_state_patcher citizen-server-state.dll --delay 100 --divisor 8
  server_state_patcher citizen-server-state.dll --patch-constant --constant-value 900
  server_state_patcher citizen-server-state.dll --dry-run --json"
)]
pub struct Args {
    /// Module to patch in place
    #[arg(index = 1, value_name = "PATH")]
    pub path: PathBuf,

    /// New sync delay value
    #[arg(long, value_name = "N", default_value_t = DEFAULT_DELAY, env = "PATCHER_DELAY")]
    pub delay: u32,

    /// Sync delay divisor; a power of two between 2 and 128
    #[arg(long, value_name = "N", default_value_t = DEFAULT_DIVISOR, env = "PATCHER_DIVISOR")]
    pub divisor: u32,

    /// Also patch the lowest sync delay distance constant
    #[arg(long)]
    pub patch_constant: bool,

    /// New lowest sync delay distance, used with --patch-constant
    #[arg(
        long,
        value_name = "F",
        default_value_t = DEFAULT_CONSTANT,
        env = "PATCHER_CONSTANT_VALUE",
        allow_negative_numbers = true
    )]
    pub constant_value: f32,

    /// Scan and report without writing a backup or patching
    #[arg(long)]
    pub dry_run: bool,

    /// Print the session report as JSON
    #[arg(long)]
    pub json: bool,

    /// Show the derived operand values
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl From<&Args> for PatchConfig {
    fn from(args: &Args) -> Self {
        Self {
            file_path: args.path.clone(),
            delay_value: args.delay,
            divisor: args.divisor,
            patch_constant: args.patch_constant,
            constant_value: args.constant_value,
            dry_run: args.dry_run,
        }
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
    /// Emit the report as JSON instead of text
    pub json: bool,
}

impl RuntimeConfig {
    /// Print message
    pub fn println(&self, message: &str) {
        let _ = self.output.println(message);
    }

    /// Print verbose message
    pub fn verbose_println(&self, message: &str) {
        let _ = self.output.verbose(message);
    }

    /// Print error message (always shown)
    pub fn error_println(&self, message: &str) {
        self.output.error(message);
    }

    /// Print warning message
    pub fn warning_println(&self, message: &str) {
        let _ = self.output.warn(message);
    }

    /// Print success message
    pub fn success_println(&self, message: &str) {
        let _ = self.output.success(message);
    }

    /// Print info message
    pub fn info_println(&self, message: &str) {
        let _ = self.output.info(message);
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        let _ = self.output.section(title);
    }

    /// Print indented text
    pub fn indent(&self, message: &str) {
        let _ = self.output.indent(message);
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.output.is_quiet()
    }
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        // JSON goes to stdout on its own
        let quiet = args.quiet || args.json;
        Self {
            output: super::OutputManager::new(args.verbose && !quiet, quiet),
            json: args.json,
        }
    }
}
