//! Session configuration and the values derived from it.

use crate::error::{ConfigError, Result};
use crate::pow2::{is_power_of_two, shift_amount_for};
use serde::Serialize;
use std::path::PathBuf;

/// Default sync delay of the unpatched module (`mov edi, 32h`)
pub const DEFAULT_DELAY: u32 = 50;

/// Default divisor of the unpatched module (`shr rdi, 2`)
pub const DEFAULT_DIVISOR: u32 = 4;

/// Default lowest sync delay distance constant (35.0 * 35.0)
pub const DEFAULT_CONSTANT: f32 = 1225.0;

/// Configuration for a patch session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatchConfig {
    /// Module to patch in place
    pub file_path: PathBuf,
    /// New sync delay value
    pub delay_value: u32,
    /// Sync delay divisor; a power of two with `1 < divisor < 255`
    pub divisor: u32,
    /// Also patch the lowest sync delay distance constant
    pub patch_constant: bool,
    /// Replacement for the distance constant, used only with `patch_constant`
    pub constant_value: f32,
    /// Scan and report without writing a backup or touching the file
    pub dry_run: bool,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            file_path: PathBuf::new(),
            delay_value: DEFAULT_DELAY,
            divisor: DEFAULT_DIVISOR,
            patch_constant: false,
            constant_value: DEFAULT_CONSTANT,
            dry_run: false,
        }
    }
}

/// Operand values computed from a validated [`PatchConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PatchPlan {
    /// New sync delay
    pub delay: u32,
    /// Divisor the shift encodes
    pub divisor: u32,
    /// Right-shift amount equivalent to dividing by `divisor`
    pub shift: u8,
    /// `delay / divisor`, the value the compiler folded into a constant
    pub divided_delay: u32,
    /// Replacement distance constant, present only when opted in
    pub constant: Option<f32>,
}

impl PatchConfig {
    /// Create a configuration for `file_path` with default values
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            ..Self::default()
        }
    }

    /// Check the configuration before anything touches the filesystem.
    ///
    /// The divisor must be a power of two and fit the one-byte shift immediate. An
    /// opted-in distance constant must be finite.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.file_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingPath);
        }

        if !is_power_of_two(i64::from(self.divisor)) {
            return Err(ConfigError::DivisorNotPowerOfTwo {
                divisor: self.divisor,
            });
        }

        if self.divisor <= 1 || self.divisor >= 255 {
            return Err(ConfigError::DivisorOutOfRange {
                divisor: self.divisor,
            });
        }

        if self.patch_constant && !self.constant_value.is_finite() {
            return Err(ConfigError::NonFiniteConstant {
                value: self.constant_value,
            });
        }

        Ok(())
    }

    /// Validate and derive the operand values to write.
    pub fn plan(&self) -> Result<PatchPlan> {
        self.validate()?;

        let shift = shift_amount_for(i64::from(self.divisor))?;
        let shift = u8::try_from(shift).map_err(|_| ConfigError::DivisorOutOfRange {
            divisor: self.divisor,
        })?;

        let plan = PatchPlan {
            delay: self.delay_value,
            divisor: self.divisor,
            shift,
            divided_delay: self.delay_value / self.divisor,
            constant: self.patch_constant.then_some(self.constant_value),
        };

        log::debug!("Derived patch plan: {:?}", plan);
        Ok(plan)
    }
}
