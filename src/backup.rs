use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;

/// `20260125.xlsx` -> `20260125_backup.xlsx`, next to the document.
pub fn backup_path(document: &Path) -> PathBuf {
    let stem = document
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = match document.extension() {
        Some(ext) => format!("{stem}_backup.{}", ext.to_string_lossy()),
        None => format!("{stem}_backup"),
    };
    document.with_file_name(name)
}

fn file_digest(path: &Path) -> Result<String> {
    let data = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

/// Copy `document` to its backup slot, replacing any older backup, and check
/// the copy is byte-identical.
pub fn backup_file(document: &Path) -> Result<PathBuf> {
    let dest = backup_path(document);
    std::fs::copy(document, &dest)?;
    let digest = file_digest(document)?;
    if file_digest(&dest)? != digest {
        return Err(LedgerError::BackupMismatch(dest.display().to_string()));
    }
    debug!(backup = %dest.display(), sha256 = %digest, "backup taken");
    Ok(dest)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RollbackOutcome {
    Restored { document: PathBuf, backup: PathBuf },
    NoBackup { document: PathBuf },
}

impl RollbackOutcome {
    pub fn message(&self) -> String {
        match self {
            Self::Restored { document, backup } => format!(
                "Restored {} from {}",
                document.display(),
                backup.display()
            ),
            Self::NoBackup { document } => {
                format!("No backup for {}; nothing to roll back", document.display())
            }
        }
    }
}

impl Ledger<'_> {
    /// Put the backup back in place of the document and delete it. Only one
    /// generation is kept, so a second rollback is a no-op.
    pub fn rollback(&self, date: &str) -> Result<RollbackOutcome> {
        let document = self.document_path(date)?;
        let backup = backup_path(&document);
        if !backup.exists() {
            return Ok(RollbackOutcome::NoBackup { document });
        }

        std::fs::copy(&backup, &document)?;
        std::fs::remove_file(&backup)?;
        info!(date, document = %document.display(), "rolled back from backup");
        Ok(RollbackOutcome::Restored { document, backup })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::testutil::fixture;

    #[test]
    fn test_backup_path_suffix() {
        let p = backup_path(Path::new("/data/2026/0125/20260125.xlsx"));
        assert_eq!(p, PathBuf::from("/data/2026/0125/20260125_backup.xlsx"));
    }

    #[test]
    fn test_backup_creates_identical_copy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("20260125.xlsx");
        std::fs::write(&path, b"test content").unwrap();
        let backup = backup_file(&path).unwrap();
        assert!(backup.to_string_lossy().ends_with("_backup.xlsx"));
        assert_eq!(std::fs::read(&backup).unwrap(), b"test content");
    }

    #[test]
    fn test_backup_keeps_single_generation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("20260125.xlsx");
        std::fs::write(&path, b"first").unwrap();
        backup_file(&path).unwrap();
        std::fs::write(&path, b"second").unwrap();
        let backup = backup_file(&path).unwrap();
        assert_eq!(std::fs::read(&backup).unwrap(), b"second");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_rollback_without_backup_is_noop() {
        let (_dir, config, registry) = fixture();
        let ledger = Ledger::new(&config, &registry);
        let outcome = ledger.rollback("20260125").unwrap();
        assert!(matches!(outcome, RollbackOutcome::NoBackup { .. }));
        assert!(outcome.message().contains("No backup"));
    }

    #[test]
    fn test_rollback_restores_and_consumes_backup() {
        let (_dir, config, registry) = fixture();
        let ledger = Ledger::new(&config, &registry);
        let path = ledger.path_for("20260125").unwrap();
        std::fs::write(&path, b"old state").unwrap();
        backup_file(&path).unwrap();
        std::fs::write(&path, b"new state").unwrap();

        let outcome = ledger.rollback("20260125").unwrap();
        assert!(matches!(outcome, RollbackOutcome::Restored { .. }));
        assert_eq!(std::fs::read(&path).unwrap(), b"old state");
        assert!(!backup_path(&path).exists());

        let again = ledger.rollback("20260125").unwrap();
        assert!(matches!(again, RollbackOutcome::NoBackup { .. }));
        assert_eq!(std::fs::read(&path).unwrap(), b"old state");
    }
}
