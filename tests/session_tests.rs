#[cfg(test)]
mod tests {
    use server_state_patcher::cli::commands::{EXIT_PARTIAL, exit_code};
    use server_state_patcher::file::backup_path;
    use server_state_patcher::signature::{
        DIVIDED_SYNC_DELAY, LOWEST_SYNC_DISTANCE, SYNC_DELAY, SYNC_DELAY_SHIFT,
    };
    use server_state_patcher::{
        ConfiguredSession, PatchConfig, PatchError, PatchOutcome, run_session,
    };
    use std::fs::{self, OpenOptions};
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Build a fake module of `len` filler bytes with signatures placed at offsets
    fn write_module(dir: &TempDir, sites: &[(usize, &[u8])], len: usize) -> PathBuf {
        let mut data = vec![0x90; len];
        for (offset, bytes) in sites {
            data[*offset..*offset + bytes.len()].copy_from_slice(bytes);
        }

        let path = dir.path().join("citizen-server-state.dll");
        fs::write(&path, data).unwrap();
        path
    }

    fn all_sites() -> Vec<(usize, &'static [u8])> {
        vec![
            (100, SYNC_DELAY.pattern),
            (200, SYNC_DELAY_SHIFT.pattern),
            (300, DIVIDED_SYNC_DELAY.pattern),
            (400, LOWEST_SYNC_DISTANCE.pattern),
        ]
    }

    fn read_at(path: &Path, offset: usize, len: usize) -> Vec<u8> {
        fs::read(path).unwrap()[offset..offset + len].to_vec()
    }

    #[test]
    fn test_delay_written_at_match() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_module(&dir, &[(100, SYNC_DELAY.pattern)], 512);

        let config = PatchConfig {
            delay_value: 75,
            ..PatchConfig::new(&path)
        };
        let report = run_session(config).unwrap();

        assert_eq!(read_at(&path, 100, 5), [0xBF, 0x4B, 0x00, 0x00, 0x00]);
        // bytes after the operand are untouched
        assert_eq!(read_at(&path, 105, 11), &SYNC_DELAY.pattern[5..]);
        assert_eq!(report.pattern("sync delay").unwrap().patches_applied, 1);
    }

    #[test]
    fn test_divisor_eight_writes_shift_three() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_module(&dir, &[(200, SYNC_DELAY_SHIFT.pattern)], 512);

        let config = PatchConfig {
            divisor: 8,
            ..PatchConfig::new(&path)
        };
        run_session(config).unwrap();

        assert_eq!(read_at(&path, 200, 4), [0x48, 0xC1, 0xEF, 0x03]);
    }

    #[test]
    fn test_default_divided_delay_is_twelve() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_module(&dir, &[(300, DIVIDED_SYNC_DELAY.pattern)], 512);

        run_session(PatchConfig::new(&path)).unwrap();

        assert_eq!(read_at(&path, 301, 4), [0x0C, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_full_session_patches_every_signature() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_module(&dir, &all_sites(), 1024);
        let original = fs::read(&path).unwrap();

        let config = PatchConfig {
            delay_value: 100,
            divisor: 16,
            patch_constant: true,
            constant_value: 900.0,
            ..PatchConfig::new(&path)
        };
        let report = run_session(config).unwrap();

        assert!(report.success);
        assert_eq!(report.outcome, PatchOutcome::Complete);
        assert_eq!(report.patches_applied(), 4);
        assert_eq!(read_at(&path, 100, 5), [0xBF, 100, 0, 0, 0]);
        assert_eq!(read_at(&path, 200, 4), [0x48, 0xC1, 0xEF, 4]);
        assert_eq!(read_at(&path, 300, 5), [0xB8, 6, 0, 0, 0]);
        assert_eq!(read_at(&path, 400, 4), 900.0f32.to_le_bytes());
        assert_eq!(fs::read(&path).unwrap().len(), original.len());
    }

    #[test]
    fn test_every_match_is_patched() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_module(
            &dir,
            &[(16, SYNC_DELAY.pattern), (64, SYNC_DELAY.pattern)],
            128,
        );

        let config = PatchConfig {
            delay_value: 75,
            ..PatchConfig::new(&path)
        };
        let report = run_session(config).unwrap();

        let pattern = report.pattern("sync delay").unwrap();
        assert_eq!(pattern.matches_found, 2);
        assert_eq!(pattern.patches_applied, 2);
        let offsets: Vec<usize> = pattern.sites.iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![16, 64]);
        assert_eq!(read_at(&path, 65, 1), [0x4B]);
    }

    #[test]
    fn test_constant_scanned_but_not_applied_without_opt_in() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_module(&dir, &all_sites(), 1024);

        let report = run_session(PatchConfig::new(&path)).unwrap();

        let constant = report.pattern("lowest sync delay distance").unwrap();
        assert_eq!(constant.matches_found, 1);
        assert!(!constant.applied);
        assert_eq!(constant.patches_applied, 0);
        assert_eq!(constant.warning, None);
        assert_eq!(read_at(&path, 400, 16), LOWEST_SYNC_DISTANCE.pattern);
    }

    #[test]
    fn test_backup_matches_original() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_module(&dir, &all_sites(), 1024);
        let original = fs::read(&path).unwrap();

        let report = run_session(PatchConfig {
            delay_value: 75,
            ..PatchConfig::new(&path)
        })
        .unwrap();

        assert_eq!(report.backup_path, Some(backup_path(&path)));
        assert_eq!(fs::read(backup_path(&path)).unwrap(), original);
        assert_ne!(fs::read(&path).unwrap(), original);
    }

    #[test]
    fn test_backup_survives_failed_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_module(&dir, &all_sites(), 1024);
        let original = fs::read(&path).unwrap();

        let scanned = ConfiguredSession::new(PatchConfig::new(&path))
            .unwrap()
            .load()
            .unwrap()
            .scan();

        // the module disappears between scanning and patching
        fs::remove_file(&path).unwrap();
        let report = scanned.apply().unwrap().report();

        assert!(!report.success);
        assert_eq!(report.outcome, PatchOutcome::Failed);
        assert_eq!(report.patches_applied(), 0);
        assert!(!path.exists());
        assert_eq!(fs::read(backup_path(&path)).unwrap(), original);
    }

    #[test]
    fn test_file_shrinking_after_scan_is_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_module(
            &dir,
            &[(100, SYNC_DELAY.pattern), (400, DIVIDED_SYNC_DELAY.pattern)],
            512,
        );

        let scanned = ConfiguredSession::new(PatchConfig {
            delay_value: 75,
            ..PatchConfig::new(&path)
        })
        .unwrap()
        .load()
        .unwrap()
        .scan();

        // the site at 400 now lies past the end of the file
        OpenOptions::new()
            .write(true)
            .open(&path)
            .unwrap()
            .set_len(300)
            .unwrap();
        let report = scanned.apply().unwrap().report();

        assert!(!report.success);
        assert_eq!(report.outcome, PatchOutcome::Partial);
        assert_eq!(exit_code(&report), EXIT_PARTIAL);
        assert_eq!(exit_code(&report), 2);

        let delay = report.pattern("sync delay").unwrap();
        assert!(delay.success);
        assert!(delay.sites[0].written);
        assert_eq!(read_at(&path, 100, 5), [0xBF, 0x4B, 0x00, 0x00, 0x00]);

        let divided = report.pattern("divided sync delay").unwrap();
        assert!(!divided.success);
        assert_eq!(divided.failures(), 1);
        assert!(divided.sites[0].error.is_some());
        assert_eq!(fs::read(&path).unwrap().len(), 300);
    }

    #[test]
    fn test_missing_pattern_only_warns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_module(&dir, &[(100, SYNC_DELAY.pattern)], 512);

        let report = run_session(PatchConfig {
            delay_value: 75,
            ..PatchConfig::new(&path)
        })
        .unwrap();

        assert!(report.success);
        assert_eq!(report.outcome, PatchOutcome::Complete);

        let shift = report.pattern("sync delay shift").unwrap();
        assert_eq!(shift.matches_found, 0);
        assert!(shift.warning.is_some());
        assert_eq!(report.warnings().len(), 2);
    }

    #[test]
    fn test_invalid_divisor_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_module(&dir, &all_sites(), 1024);
        let original = fs::read(&path).unwrap();

        for divisor in [3, 1, 256] {
            let err = run_session(PatchConfig {
                divisor,
                ..PatchConfig::new(&path)
            })
            .unwrap_err();
            assert!(matches!(err, PatchError::Config(_)), "{divisor}");
        }

        assert_eq!(fs::read(&path).unwrap(), original);
        assert!(!backup_path(&path).exists());
    }

    #[test]
    fn test_missing_module_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.dll");

        let err = run_session(PatchConfig::new(&path)).unwrap_err();

        assert!(matches!(err, PatchError::Fs { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_report_serializes_to_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_module(&dir, &all_sites(), 1024);

        let report = run_session(PatchConfig {
            delay_value: 75,
            dry_run: true,
            ..PatchConfig::new(&path)
        })
        .unwrap();
        let json: serde_json::Value = serde_json::to_value(&report).unwrap();

        assert_eq!(json["outcome"], "complete");
        assert_eq!(json["dry_run"], true);
        assert_eq!(json["patterns"][0]["matches_found"], 1);
        assert_eq!(json["patterns"][0]["sites"][0]["replacement"], 75);
        assert_eq!(
            json["patterns"][0]["sites"][0]["replacement_bytes"],
            "BF 4B 00 00 00"
        );
    }
}
