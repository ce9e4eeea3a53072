//! Per-pattern and per-session patch outcomes.

use super::SessionPhase;
use crate::scan::format_hex;
use crate::signature::OperandValue;
use serde::Serialize;
use std::path::PathBuf;

/// Outcome of one patch site
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteReport {
    /// Offset of the match in the file
    pub offset: usize,
    /// Operand found at the site before patching
    pub original: Option<OperandValue>,
    /// Operand written (or to be written in a dry run)
    pub replacement: OperandValue,
    /// Replacement bytes as spaced hex
    pub replacement_bytes: String,
    /// Whether the write succeeded
    pub written: bool,
    /// Failure cause when the write did not succeed
    pub error: Option<String>,
}

impl SiteReport {
    pub(crate) fn new(
        offset: usize,
        original: Option<OperandValue>,
        replacement: OperandValue,
        bytes: &[u8],
    ) -> Self {
        Self {
            offset,
            original,
            replacement,
            replacement_bytes: format_hex(bytes),
            written: false,
            error: None,
        }
    }

    /// Whether this site counts as a failed write
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Outcome for one signature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternReport {
    /// Signature name
    pub name: String,
    /// Instruction the signature contains
    pub description: String,
    /// Signature bytes as spaced hex
    pub pattern: String,
    /// Number of matches in the file
    pub matches_found: usize,
    /// Number of sites successfully written
    pub patches_applied: usize,
    /// False when the plan leaves this signature untouched
    pub applied: bool,
    /// False if any attempted write failed
    pub success: bool,
    /// Set when the signature was applied but not found
    pub warning: Option<String>,
    /// Every patch site, in ascending offset order
    pub sites: Vec<SiteReport>,
}

impl PatternReport {
    /// Number of attempted writes that failed
    pub fn failures(&self) -> usize {
        self.sites.iter().filter(|site| site.failed()).count()
    }

    /// Format the pattern line for display
    pub fn format_result(&self) -> String {
        let status = if !self.applied {
            "not applied"
        } else if self.matches_found == 0 {
            "not found"
        } else if self.success {
            "patched"
        } else {
            "failed"
        };

        format!(
            "{} ({}): {} match(es), {} patched [{}]",
            self.name, self.description, self.matches_found, self.patches_applied, status
        )
    }
}

/// Overall classification of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOutcome {
    /// No attempted write failed
    Complete,
    /// Some writes succeeded and some failed
    Partial,
    /// Writes were attempted and none succeeded
    Failed,
}

/// Final report of a patch session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatchReport {
    /// Patched file
    pub file_path: PathBuf,
    /// Backup written before patching, absent in a dry run
    pub backup_path: Option<PathBuf>,
    /// Whether writes were skipped
    pub dry_run: bool,
    /// Phase the session ended in
    pub phase: SessionPhase,
    /// One entry per signature, in table order
    pub patterns: Vec<PatternReport>,
    /// Logical AND of every attempted write
    pub success: bool,
    /// Classification of the write results
    pub outcome: PatchOutcome,
}

impl PatchReport {
    pub(crate) fn new(
        file_path: PathBuf,
        backup_path: Option<PathBuf>,
        dry_run: bool,
        patterns: Vec<PatternReport>,
    ) -> Self {
        let failed: usize = patterns.iter().map(PatternReport::failures).sum();
        let applied: usize = patterns.iter().map(|p| p.patches_applied).sum();

        let outcome = match (failed, applied) {
            (0, _) => PatchOutcome::Complete,
            (_, 0) => PatchOutcome::Failed,
            _ => PatchOutcome::Partial,
        };

        Self {
            file_path,
            backup_path,
            dry_run,
            phase: SessionPhase::Reported,
            patterns,
            success: failed == 0,
            outcome,
        }
    }

    /// Warnings collected for signatures that were not found
    pub fn warnings(&self) -> Vec<&str> {
        self.patterns
            .iter()
            .filter_map(|p| p.warning.as_deref())
            .collect()
    }

    /// Total number of sites written
    pub fn patches_applied(&self) -> usize {
        self.patterns.iter().map(|p| p.patches_applied).sum()
    }

    /// Look up a pattern report by signature name
    pub fn pattern(&self, name: &str) -> Option<&PatternReport> {
        self.patterns.iter().find(|p| p.name == name)
    }

    /// Summary line for display
    pub fn summary(&self) -> String {
        match (self.dry_run, self.outcome) {
            (true, _) => format!(
                "Dry run: {} site(s) would be patched",
                self.patterns
                    .iter()
                    .filter(|p| p.applied)
                    .map(|p| p.sites.len())
                    .sum::<usize>()
            ),
            (false, PatchOutcome::Complete) => "All patches applied successfully!".to_string(),
            (false, PatchOutcome::Partial) => format!(
                "Some patches failed to apply ({} written)",
                self.patches_applied()
            ),
            (false, PatchOutcome::Failed) => "No patch could be written".to_string(),
        }
    }
}
