//! Command execution and exit code mapping.

mod patch;

use crate::cli::{Args, RuntimeConfig};
use crate::error::Result;
use crate::session::{PatchOutcome, PatchReport};

use patch::execute_patch;

/// Exit code for a fully successful session
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for fatal errors and sessions where no write succeeded
pub const EXIT_FAILURE: i32 = 1;
/// Exit code for sessions where only some writes succeeded
pub const EXIT_PARTIAL: i32 = 2;

/// Execute the patch command based on parsed arguments.
///
/// Configuration errors are reported by the session before any file is opened.
pub fn execute_command(args: Args) -> Result<i32> {
    let config = RuntimeConfig::from(&args);

    match execute_patch(&args, &config) {
        Ok(report) => Ok(exit_code(&report)),
        Err(e) => {
            config.error_println(&format!("Patching {} failed: {}", args.path.display(), e));

            let suggestions = e.recovery_suggestions();
            if !suggestions.is_empty() && !config.is_quiet() {
                config.println("\nRecovery suggestions:");
                for suggestion in suggestions {
                    config.println(&format!("  • {}", suggestion));
                }
            }

            Ok(EXIT_FAILURE)
        }
    }
}

/// Map a session report to the process exit code
pub fn exit_code(report: &PatchReport) -> i32 {
    match report.outcome {
        PatchOutcome::Complete => EXIT_SUCCESS,
        PatchOutcome::Partial => EXIT_PARTIAL,
        PatchOutcome::Failed => EXIT_FAILURE,
    }
}
