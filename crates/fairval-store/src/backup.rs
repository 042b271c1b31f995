//! Timestamped copies of the store document.

use crate::error::Result;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const BACKUP_PREFIX: &str = "fair_values_config_backup_";

/// Where backups go and how many are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupPolicy {
    /// Backup directory
    pub dir: PathBuf,
    /// Number of most recent backups retained; 0 keeps all
    pub max_backups: usize,
}

impl BackupPolicy {
    /// Create a policy.
    pub fn new(dir: impl Into<PathBuf>, max_backups: usize) -> Self {
        Self {
            dir: dir.into(),
            max_backups,
        }
    }

    /// Copy `document` into the backup directory if it exists, then prune.
    ///
    /// Returns the path of the new backup, or `None` when there was nothing
    /// to back up.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the copy fails.
    pub fn backup(&self, document: &Path) -> Result<Option<PathBuf>> {
        if !document.exists() {
            return Ok(None);
        }
        fs::create_dir_all(&self.dir)?;

        let stamp = Utc::now().format("%Y%m%d_%H%M%S_%6f");
        let mut target = self.dir.join(format!("{BACKUP_PREFIX}{stamp}.json"));
        let mut n = 1;
        while target.exists() {
            target = self.dir.join(format!("{BACKUP_PREFIX}{stamp}_{n}.json"));
            n += 1;
        }

        fs::copy(document, &target)?;
        info!(backup = %target.display(), "Created fair value config backup");

        if let Err(e) = self.prune() {
            warn!(error = %e, "Failed to prune old backups");
        }
        Ok(Some(target))
    }

    /// Existing backups, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be read.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut backups: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(BACKUP_PREFIX) && n.ends_with(".json"))
            })
            .collect();
        backups.sort();
        Ok(backups)
    }

    /// Delete the oldest backups beyond `max_backups`. Returns how many were
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns an error if listing or deleting fails.
    pub fn prune(&self) -> Result<usize> {
        if self.max_backups == 0 {
            return Ok(0);
        }
        let backups = self.list()?;
        let excess = backups.len().saturating_sub(self.max_backups);
        for path in &backups[..excess] {
            fs::remove_file(path)?;
        }
        Ok(excess)
    }
}
