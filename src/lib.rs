//! # Server State Patcher
//!
//! Signature-based patcher for the sync delay constants compiled into the
//! server-state module.
//!
//! The patcher locates four literal instruction signatures in the module image and
//! rewrites their operands in place, so the sync delay, its divisor and the lowest
//! sync delay distance can be changed without rebuilding the module.
//!
//! ## Features
//!
//! - **Exact signature scanning**: every occurrence, overlapping ones included, in offset order
//! - **Backup first**: `<path>_backup` is written before the first patch touches the file
//! - **In-place writes**: replacements never change the file length
//! - **Partial outcomes**: missing signatures and failed sites are reported, not fatal
//!
//! ## Usage
//!
//! ```bash
//! server_state_patcher citizen-server-state.dll --delay 75 --divisor 8
//! server_state_patcher citizen-server-state.dll --patch-constant --constant-value 900
//! server_state_patcher citizen-server-state.dll --dry-run --json
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Core modules
pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod file;
pub mod pow2;
pub mod scan;
pub mod session;
pub mod signature;

// Re-export main types for public API
pub use cli::Args;
pub use config::{PatchConfig, PatchPlan};
pub use error::{ConfigError, PatchError, Result};
pub use session::{ConfiguredSession, PatchOutcome, PatchReport, SessionPhase, run_session};
pub use signature::{KNOWN_SIGNATURES, Signature};
