//! Error types for patch sessions.
//!
//! Configuration and I/O problems are fatal for a session and surface as
//! [`PatchError`]. Per-site write failures are also expressed as [`PatchError`]
//! values, but the orchestrator records them in the report instead of aborting.

use std::{io, path::PathBuf};
use thiserror::Error;

/// Context of opening the target for a site write
pub const PATCH_SITE_OPEN: &str = "opening patch site in";
/// Context of reading the target length before a site write
pub const PATCH_SITE_METADATA: &str = "reading length for patch site in";
/// Context of seeking to a patch site
pub const PATCH_SITE_SEEK: &str = "seeking to patch site in";
/// Context of writing a patch site
pub const PATCH_SITE_WRITE: &str = "writing patch site in";
/// Context of flushing a patch site
pub const PATCH_SITE_FLUSH: &str = "flushing patch site in";

const PATCH_SITE_CONTEXTS: [&str; 5] = [
    PATCH_SITE_OPEN,
    PATCH_SITE_METADATA,
    PATCH_SITE_SEEK,
    PATCH_SITE_WRITE,
    PATCH_SITE_FLUSH,
];

/// Result type alias for patcher operations
pub type Result<T> = std::result::Result<T, PatchError>;

/// Main error type for all patcher operations
#[derive(Error, Debug)]
pub enum PatchError {
    /// Invalid session configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Power-of-two arithmetic errors
    #[error("Arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),

    /// Byte decoding errors
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// File system error with path context.
    ///
    /// Created by the [`ErrorExt`] trait's `fs_context` method.
    #[error("{context} {path}: {error}")]
    Fs {
        /// Operation that failed (e.g. "reading target file")
        context: &'static str,
        /// Path that was being accessed
        path: PathBuf,
        /// The underlying I/O error
        error: io::Error,
    },

    /// A replacement would run past the end of the file
    #[error(
        "replacement of {len} bytes at offset {offset:#x} exceeds file length {file_len:#x}"
    )]
    SiteOutOfBounds {
        /// Target offset
        offset: u64,
        /// Replacement length
        len: usize,
        /// Current length of the file
        file_len: u64,
    },

    /// A signature produced an operand of a different encoding than it declares
    #[error("signature '{signature}' produced an operand of the wrong encoding")]
    OperandMismatch {
        /// Name of the signature
        signature: &'static str,
    },

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration errors, reported before any file is touched
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Divisor has more than one bit set, or is zero
    #[error("divisor must be a power of two, got {divisor}")]
    DivisorNotPowerOfTwo {
        /// Rejected divisor
        divisor: u32,
    },

    /// Divisor does not fit the one-byte shift immediate
    #[error("divisor can't be bigger than 1 byte: {divisor} is outside 1 < divisor < 255")]
    DivisorOutOfRange {
        /// Rejected divisor
        divisor: u32,
    },

    /// No target file was given
    #[error("target file path is empty")]
    MissingPath,

    /// Constant replacement is not a finite float
    #[error("constant value must be finite, got {value}")]
    NonFiniteConstant {
        /// Rejected value
        value: f32,
    },
}

/// Power-of-two arithmetic errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArithmeticError {
    /// Argument is not a power of two
    #[error("invalid argument: {value} is not a power of two")]
    InvalidArgument {
        /// Rejected value
        value: i64,
    },
}

/// Byte codec errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Not enough bytes to decode a value
    #[error("need {expected} bytes to decode, got {actual}")]
    TooShort {
        /// Required width
        expected: usize,
        /// Bytes available
        actual: usize,
    },
}

impl PatchError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            PatchError::Config(ConfigError::DivisorNotPowerOfTwo { .. })
            | PatchError::Arithmetic(_) => vec![
                "Pick a divisor that is a power of two: 2, 4, 8, 16, 32, 64 or 128".to_string(),
            ],
            PatchError::Config(ConfigError::DivisorOutOfRange { .. }) => vec![
                "The divisor is encoded as a shift immediate; keep it between 2 and 128"
                    .to_string(),
            ],
            PatchError::Fs { path, context, .. } if context.contains("backup") => vec![
                format!(
                    "Check that the directory containing {} is writable",
                    path.display()
                ),
                "No patch was written; the target file is unchanged".to_string(),
            ],
            PatchError::Fs { path, .. } => vec![
                format!("Verify that {} exists and is readable", path.display()),
                "Close any process that holds the module open".to_string(),
            ],
            PatchError::SiteOutOfBounds { .. } => vec![
                "The file changed since it was scanned; restore it from the _backup copy"
                    .to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }

    /// Whether this error aborts a whole session rather than a single site.
    ///
    /// Errors raised while writing a single site are recorded in the report and the
    /// session continues with the remaining sites.
    pub fn is_fatal(&self) -> bool {
        match self {
            PatchError::SiteOutOfBounds { .. } => false,
            PatchError::Fs { context, .. } => !PATCH_SITE_CONTEXTS.contains(context),
            _ => true,
        }
    }
}

/// Extension trait for filesystem operations with automatic path context.
pub trait ErrorExt<T> {
    /// Add filesystem context to an I/O error.
    ///
    /// The `context` should be a present-tense verb phrase describing the operation,
    /// e.g., "reading target file", "writing backup file".
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|error| PatchError::Fs {
            context,
            path: path.into(),
            error,
        })
    }
}
