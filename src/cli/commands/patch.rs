//! Patch command implementation.
//!
//! Drives one session phase by phase so progress can be shown between phases.

use crate::cli::{Args, RuntimeConfig};
use crate::config::PatchConfig;
use crate::error::Result;
use crate::session::{ConfiguredSession, PatchOutcome, PatchReport, PatternReport};

/// Execute the patch command
pub(super) fn execute_patch(args: &Args, config: &RuntimeConfig) -> Result<PatchReport> {
    let session = ConfiguredSession::new(PatchConfig::from(args))?;

    config.section(&format!("Patching {}", args.path.display()));

    let plan = session.plan();
    config.verbose_println(&format!(
        "Sync delay {} ({:#x}), divisor {} (shift {}), divided delay {} ({:#x})",
        plan.delay, plan.delay, plan.divisor, plan.shift, plan.divided_delay, plan.divided_delay
    ));
    match plan.constant {
        Some(constant) => {
            config.verbose_println(&format!("Lowest sync delay distance -> {}", constant))
        }
        None => config.verbose_println("Lowest sync delay distance left untouched"),
    }

    let loaded = session.load()?;
    if let Some(backup) = loaded.backup_path() {
        config.info_println(&format!("Backup written to {}", backup.display()));
    }

    let scanned = loaded.scan();
    for scan in scanned.scans() {
        config.println(&format!(
            "Found {} match(es) for {} ({})",
            scan.matches.len(),
            scan.signature.name,
            scan.signature.description
        ));
    }

    let report = scanned.apply()?.report();

    if config.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(report);
    }

    for pattern in &report.patterns {
        print_pattern(pattern, report.dry_run, config);
    }

    match report.outcome {
        PatchOutcome::Complete => config.success_println(&report.summary()),
        PatchOutcome::Partial => config.warning_println(&report.summary()),
        PatchOutcome::Failed => config.error_println(&report.summary()),
    }

    if !report.success
        && let Some(backup) = &report.backup_path
    {
        config.indent(&format!(
            "Restore the original module from {} if needed",
            backup.display()
        ));
    }

    Ok(report)
}

fn print_pattern(pattern: &PatternReport, dry_run: bool, config: &RuntimeConfig) {
    if !pattern.applied {
        config.verbose_println(&pattern.format_result());
        return;
    }

    if let Some(warning) = &pattern.warning {
        config.warning_println(warning);
        return;
    }

    for site in &pattern.sites {
        let original = site
            .original
            .map(|value| value.to_string())
            .unwrap_or_else(|| "?".to_string());

        if dry_run {
            config.indent(&format!(
                "Would patch {} {} -> {} at offset {:#x} [{}]",
                pattern.description, original, site.replacement, site.offset, site.replacement_bytes
            ));
        } else if site.written {
            config.success_println(&format!(
                "Patched {} {} -> {} at offset {:#x}",
                pattern.description, original, site.replacement, site.offset
            ));
            config.indent(&format!("Raw bytes: {}", site.replacement_bytes));
        } else if let Some(error) = &site.error {
            config.error_println(&format!(
                "Failed to patch {} at offset {:#x}: {}",
                pattern.description, site.offset, error
            ));
        }
    }
}
