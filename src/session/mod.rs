//! Patch session state machine.
//!
//! A session moves through `Configured -> Loaded -> Scanned -> Patched -> Reported`.
//! Each phase is its own type and every transition consumes the previous one, so a
//! write can only happen after the file was loaded and backed up, and the backup is
//! taken exactly once per session.
//!
//! Configuration and load failures abort the session. Signatures without matches
//! and failed site writes are recorded in the [`PatchReport`] and the session
//! carries on with the remaining signatures and sites.

mod report;

pub use report::{PatchOutcome, PatchReport, PatternReport, SiteReport};

use crate::config::{PatchConfig, PatchPlan};
use crate::error::Result;
use crate::file::{self, Buffer};
use crate::scan::{self, Match, format_hex};
use crate::signature::{KNOWN_SIGNATURES, Signature};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Phase of a patch session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum SessionPhase {
    /// Configuration validated, nothing touched yet
    Configured,
    /// File read into memory and backed up
    Loaded,
    /// Every signature scanned
    Scanned,
    /// Replacements written
    Patched,
    /// Outcomes aggregated
    Reported,
}

/// A validated session that has not touched the filesystem
#[derive(Debug, Clone)]
pub struct ConfiguredSession {
    config: PatchConfig,
    plan: PatchPlan,
    signatures: Vec<Signature>,
}

impl ConfiguredSession {
    /// Validate `config` and prepare a session over the known signatures.
    ///
    /// Fails with a configuration error before any file is opened.
    pub fn new(config: PatchConfig) -> Result<Self> {
        let plan = config.plan()?;

        Ok(Self {
            config,
            plan,
            signatures: KNOWN_SIGNATURES.to_vec(),
        })
    }

    /// Replace the signature table
    pub fn with_signatures(mut self, signatures: Vec<Signature>) -> Self {
        self.signatures = signatures;
        self
    }

    /// Operand values this session writes
    pub fn plan(&self) -> &PatchPlan {
        &self.plan
    }

    /// Session configuration
    pub fn config(&self) -> &PatchConfig {
        &self.config
    }

    /// Always [`SessionPhase::Configured`]
    pub fn phase(&self) -> SessionPhase {
        SessionPhase::Configured
    }

    /// Read the target file, writing `<path>_backup` first unless this is a dry run.
    pub fn load(self) -> Result<LoadedSession> {
        let path = self.config.file_path.as_path();

        let (buffer, backup_path) = if self.config.dry_run {
            (file::load(path)?, None)
        } else {
            (file::load_with_backup(path)?, Some(file::backup_path(path)))
        };

        Ok(LoadedSession {
            session: self,
            buffer,
            backup_path,
        })
    }
}

/// A session holding the file contents in memory
#[derive(Debug)]
pub struct LoadedSession {
    session: ConfiguredSession,
    buffer: Buffer,
    backup_path: Option<PathBuf>,
}

impl LoadedSession {
    /// The loaded file contents
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Backup written during load
    pub fn backup_path(&self) -> Option<&Path> {
        self.backup_path.as_deref()
    }

    /// Always [`SessionPhase::Loaded`]
    pub fn phase(&self) -> SessionPhase {
        SessionPhase::Loaded
    }

    /// Scan for every signature, including ones the plan will not apply.
    ///
    /// Match counts of unapplied signatures are still part of the report.
    pub fn scan(self) -> ScannedSession {
        let LoadedSession {
            session,
            buffer,
            backup_path,
        } = self;

        let scans = session
            .signatures
            .iter()
            .map(|signature| {
                let matches = scan::find_all(&buffer, signature.pattern);
                log::debug!(
                    "Found {} match(es) for {} ({}): {}",
                    matches.len(),
                    signature.name,
                    signature.description,
                    format_hex(signature.pattern)
                );
                SignatureScan {
                    signature: *signature,
                    matches,
                }
            })
            .collect();

        ScannedSession {
            config: session.config,
            plan: session.plan,
            backup_path,
            scans,
        }
    }
}

/// Matches found for one signature
#[derive(Debug, Clone)]
pub struct SignatureScan {
    /// The signature that was scanned for
    pub signature: Signature,
    /// Matches in ascending offset order
    pub matches: Vec<Match>,
}

/// A session with all signatures located
#[derive(Debug)]
pub struct ScannedSession {
    config: PatchConfig,
    plan: PatchPlan,
    backup_path: Option<PathBuf>,
    scans: Vec<SignatureScan>,
}

impl ScannedSession {
    /// Scan results in signature table order
    pub fn scans(&self) -> &[SignatureScan] {
        &self.scans
    }

    /// Always [`SessionPhase::Scanned`]
    pub fn phase(&self) -> SessionPhase {
        SessionPhase::Scanned
    }

    /// Write every applied signature's replacement at each of its matches.
    ///
    /// A failed write is logged and recorded; remaining sites are still attempted.
    /// In a dry run nothing is written.
    pub fn apply(self) -> Result<PatchedSession> {
        let path = self.config.file_path.as_path();
        let mut patterns = Vec::with_capacity(self.scans.len());

        for SignatureScan { signature, matches } in &self.scans {
            patterns.push(apply_signature(
                path,
                signature,
                matches,
                &self.plan,
                self.config.dry_run,
            )?);
        }

        Ok(PatchedSession {
            file_path: self.config.file_path,
            backup_path: self.backup_path,
            dry_run: self.config.dry_run,
            patterns,
        })
    }
}

fn apply_signature(
    path: &Path,
    signature: &Signature,
    matches: &[Match],
    plan: &PatchPlan,
    dry_run: bool,
) -> Result<PatternReport> {
    let mut report = PatternReport {
        name: signature.name.to_string(),
        description: signature.description.to_string(),
        pattern: format_hex(signature.pattern),
        matches_found: matches.len(),
        patches_applied: 0,
        applied: false,
        success: true,
        warning: None,
        sites: Vec::new(),
    };

    let (Some(value), Some(bytes)) = (signature.operand_for(plan), signature.replacement(plan)?)
    else {
        log::debug!("Leaving {} untouched", signature.name);
        return Ok(report);
    };
    report.applied = true;

    if matches.is_empty() {
        let warning = format!("Pattern '{}' not found, couldn't patch", signature.name);
        log::warn!("{warning}");
        report.warning = Some(warning);
        return Ok(report);
    }

    for found in matches {
        let original = signature.decode_operand(&found.bytes).ok();
        let mut site = SiteReport::new(found.offset, original, value, &bytes);

        if !dry_run {
            match file::write_at(path, found.offset as u64, &bytes) {
                Ok(()) => {
                    site.written = true;
                    report.patches_applied += 1;
                    log::info!(
                        "Patched {} -> {} at offset {:#x}",
                        signature.description,
                        value,
                        found.offset
                    );
                }
                Err(e) => {
                    log::error!(
                        "Failed to patch {} at offset {:#x}: {}",
                        signature.name,
                        found.offset,
                        e
                    );
                    site.error = Some(e.to_string());
                    report.success = false;
                }
            }
        }

        report.sites.push(site);
    }

    Ok(report)
}

/// A session whose writes have all been attempted
#[derive(Debug)]
pub struct PatchedSession {
    file_path: PathBuf,
    backup_path: Option<PathBuf>,
    dry_run: bool,
    patterns: Vec<PatternReport>,
}

impl PatchedSession {
    /// Always [`SessionPhase::Patched`]
    pub fn phase(&self) -> SessionPhase {
        SessionPhase::Patched
    }

    /// Aggregate per-signature outcomes into the final report
    pub fn report(self) -> PatchReport {
        PatchReport::new(self.file_path, self.backup_path, self.dry_run, self.patterns)
    }
}

/// Run a whole session: validate, load with backup, scan, patch and report.
pub fn run_session(config: PatchConfig) -> Result<PatchReport> {
    let report = ConfiguredSession::new(config)?.load()?.scan().apply()?.report();

    log::debug!(
        "Session for {:?} finished: {:?}",
        report.file_path,
        report.outcome
    );
    Ok(report)
}
