//! Loading target modules and writing patch sites back to disk.
//!
//! Loading for a patch session always writes a full `<path>_backup` copy before
//! returning. Each site write is an independent open/seek/write cycle on the
//! original file; nothing is rolled back if a later write fails, so the backup is
//! the only recovery point.

use crate::error::{
    ErrorExt, PATCH_SITE_FLUSH, PATCH_SITE_METADATA, PATCH_SITE_OPEN, PATCH_SITE_SEEK,
    PATCH_SITE_WRITE, PatchError, Result,
};
use std::{
    ffi::OsString,
    fs::{self, OpenOptions},
    io::{Seek, SeekFrom, Write},
    ops::Deref,
    path::{Path, PathBuf},
};

/// Suffix appended to the target path to form the backup path
pub const BACKUP_SUFFIX: &str = "_backup";

/// File contents loaded for scanning. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer(Vec<u8>);

impl Deref for Buffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Path of the backup written next to `path`.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut backup = OsString::from(path.as_os_str());
    backup.push(BACKUP_SUFFIX);
    PathBuf::from(backup)
}

/// Read the whole file without creating a backup.
pub fn load(path: &Path) -> Result<Buffer> {
    let data = fs::read(path).fs_context("reading target file", path)?;
    log::debug!("Read {} bytes from {:?}", data.len(), path);
    Ok(Buffer(data))
}

/// Read the whole file and write an exact copy to `<path>_backup`.
///
/// An existing backup is overwritten.
pub fn load_with_backup(path: &Path) -> Result<Buffer> {
    let buffer = load(path)?;

    let backup = backup_path(path);
    fs::write(&backup, &*buffer).fs_context("writing backup file", &backup)?;

    log::info!("Backed up {} bytes to {:?}", buffer.len(), backup);
    Ok(buffer)
}

/// Overwrite `bytes` at `offset` in the file at `path`.
///
/// The file is opened without truncation and never grows: a replacement that would
/// run past the end of the file is rejected before anything is written.
pub fn write_at(path: &Path, offset: u64, bytes: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .fs_context(PATCH_SITE_OPEN, path)?;

    let file_len = file
        .metadata()
        .fs_context(PATCH_SITE_METADATA, path)?
        .len();

    let end = offset.checked_add(bytes.len() as u64);
    if end.is_none_or(|end| end > file_len) {
        return Err(PatchError::SiteOutOfBounds {
            offset,
            len: bytes.len(),
            file_len,
        });
    }

    file.seek(SeekFrom::Start(offset))
        .fs_context(PATCH_SITE_SEEK, path)?;
    file.write_all(bytes)
        .fs_context(PATCH_SITE_WRITE, path)?;
    file.flush().fs_context(PATCH_SITE_FLUSH, path)?;

    log::debug!(
        "Wrote {} bytes at offset {:#x} in {:?}",
        bytes.len(),
        offset,
        path
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_path_appends_suffix() {
        assert_eq!(
            backup_path(Path::new("/srv/citizen-server-state.dll")),
            PathBuf::from("/srv/citizen-server-state.dll_backup")
        );
    }

    #[test]
    fn test_load_with_backup_copies_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("module.bin");
        let original: Vec<u8> = (0..=255).collect();
        fs::write(&path, &original).unwrap();

        let buffer = load_with_backup(&path).unwrap();

        assert_eq!(&*buffer, &original[..]);
        assert_eq!(fs::read(backup_path(&path)).unwrap(), original);
    }

    #[test]
    fn test_load_missing_file_fails_without_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.bin");

        let err = load_with_backup(&path).unwrap_err();

        assert!(matches!(err, PatchError::Fs { .. }));
        assert!(!backup_path(&path).exists());
    }

    #[test]
    fn test_write_at_overwrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("module.bin");
        fs::write(&path, [0u8; 8]).unwrap();

        write_at(&path, 2, &[0xBF, 0x4B]).unwrap();

        assert_eq!(fs::read(&path).unwrap(), [0, 0, 0xBF, 0x4B, 0, 0, 0, 0]);
    }

    #[test]
    fn test_write_at_never_extends_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("module.bin");
        fs::write(&path, [0u8; 4]).unwrap();

        let err = write_at(&path, 2, &[1, 2, 3]).unwrap_err();

        assert!(matches!(
            err,
            PatchError::SiteOutOfBounds {
                offset: 2,
                len: 3,
                file_len: 4
            }
        ));
        assert_eq!(fs::read(&path).unwrap(), [0u8; 4]);
    }

    #[test]
    fn test_write_at_missing_file_does_not_create_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.bin");

        let err = write_at(&path, 0, &[1]).unwrap_err();

        assert!(matches!(err, PatchError::Fs { .. }));
        assert!(!err.is_fatal());
        assert!(!path.exists());
    }
}
