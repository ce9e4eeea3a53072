//! Server State Patcher - rewrite the sync delay constants of a compiled module.
//!
//! This binary parses the patch configuration from the command line, runs one
//! patch session and maps its outcome to the process exit code.

use server_state_patcher::cli;
use server_state_patcher::cli::OutputManager;
use std::process;

fn main() {
    env_logger::init();

    match cli::run() {
        Ok(exit_code) => {
            process::exit(exit_code);
        }
        Err(e) => {
            // Never quiet for fatal errors
            let output = OutputManager::new(false, false);
            output.error(&format!("Fatal error: {e}"));

            let suggestions = e.recovery_suggestions();
            if !suggestions.is_empty() {
                let _ = output.println("\nRecovery suggestions:");
                for suggestion in suggestions {
                    let _ = output.indent(&suggestion);
                }
            }

            process::exit(1);
        }
    }
}
