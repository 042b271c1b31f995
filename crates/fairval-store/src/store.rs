//! File-backed store with serialized, atomic writes.
//!
//! Every mutation is a read-modify-write of the whole document performed
//! while holding both an in-process mutex and an exclusive advisory lock on a
//! sidecar `<file>.lock`. The new document is written to a temporary file in
//! the same directory, synced, and renamed over the old one. Readers take no
//! lock; the rename means they see either the old or the new document.

use crate::DEFAULT_FILE_NAME;
use crate::backup::BackupPolicy;
use crate::document::{EffectiveValue, StoreDocument};
use crate::error::{Result, StoreError};
use crate::legacy::{self, LegacyImport};
use crate::source::{FairValueSource, PriorityOrder};
use fs4::fs_std::FileExt;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Where the store lives and how it is backed up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Path of the JSON document
    pub path: PathBuf,
    /// Backup policy; `None` disables backups
    pub backup: Option<BackupPolicy>,
}

impl StoreOptions {
    /// Options for a document at `path`, without backups.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            backup: None,
        }
    }

    /// Options for the default file name inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(DEFAULT_FILE_NAME))
    }

    /// Enable backups.
    pub fn with_backups(mut self, dir: impl Into<PathBuf>, max_backups: usize) -> Self {
        self.backup = Some(BackupPolicy::new(dir, max_backups));
        self
    }
}

/// Multi-source fair value store.
#[derive(Debug)]
pub struct FairValueStore {
    options: StoreOptions,
    writer: Mutex<()>,
}

struct FileLock {
    file: File,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(error = %e, "Failed to release store lock");
        }
    }
}

impl FairValueStore {
    /// Create a store; nothing is read until the first operation.
    pub const fn new(options: StoreOptions) -> Self {
        Self {
            options,
            writer: Mutex::new(()),
        }
    }

    /// Store at `path` without backups.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(StoreOptions::new(path))
    }

    /// Path of the document.
    pub fn path(&self) -> &Path {
        &self.options.path
    }

    /// Store options.
    pub const fn options(&self) -> &StoreOptions {
        &self.options
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .options
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| DEFAULT_FILE_NAME.into());
        name.push(".lock");
        self.options.path.with_file_name(name)
    }

    fn parent_dir(&self) -> PathBuf {
        match self.options.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Read and validate the whole document.
    ///
    /// A missing file is an empty store with the default priority.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ConfigCorrupt`] if the file is present but
    /// malformed or fails validation, and [`StoreError::Io`] if it cannot be
    /// read.
    pub fn load(&self) -> Result<StoreDocument> {
        let path = &self.options.path;
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No fair value config yet, starting empty");
                return Ok(StoreDocument::default());
            }
            Err(e) => return Err(e.into()),
        };

        let document: StoreDocument = serde_json::from_str(&contents)
            .map_err(|e| StoreError::corrupt(path, e.to_string()))?;
        document
            .validate()
            .map_err(|reason| StoreError::corrupt(path, reason))?;
        Ok(document)
    }

    /// Validate and write a whole document, replacing whatever is on disk.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ConfigCorrupt`] if the document fails
    /// validation (nothing is written), or an IO error.
    pub fn save(&self, document: &StoreDocument) -> Result<()> {
        document
            .validate()
            .map_err(|reason| StoreError::corrupt(self.path(), format!("refusing to save: {reason}")))?;
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let _lock = FileLock::acquire(&self.lock_path())?;
        self.write_locked(document)
    }

    fn write_locked(&self, document: &StoreDocument) -> Result<()> {
        if let Some(Err(e)) = self.options.backup.as_ref().map(|p| p.backup(&self.options.path)) {
            warn!(error = %e, "Could not create backup, saving anyway");
        }

        let dir = self.parent_dir();
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, document)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.options.path).map_err(|e| e.error)?;

        info!(
            path = %self.options.path.display(),
            tickers = document.ticker_count(),
            "Saved fair value config"
        );
        Ok(())
    }

    /// Apply `change` to the current document and persist the result.
    ///
    /// Nothing is written if `change` fails or leaves the document as it
    /// was.
    fn update<T>(&self, change: impl FnOnce(&mut StoreDocument) -> Result<T>) -> Result<T> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let _lock = FileLock::acquire(&self.lock_path())?;

        let before = self.load()?;
        let mut after = before.clone();
        let out = change(&mut after)?;
        if after != before {
            self.write_locked(&after)?;
        }
        Ok(out)
    }

    /// Value recorded by one source.
    ///
    /// # Errors
    ///
    /// See [`FairValueStore::load`].
    pub fn get(&self, source: FairValueSource, ticker: &str) -> Result<Option<f64>> {
        Ok(self.load()?.get(source, ticker))
    }

    /// Effective value for a ticker under the current priority order.
    ///
    /// # Errors
    ///
    /// See [`FairValueStore::load`].
    pub fn resolve(&self, ticker: &str) -> Result<Option<EffectiveValue>> {
        Ok(self.load()?.resolve(ticker))
    }

    /// Effective value for every known ticker.
    ///
    /// # Errors
    ///
    /// See [`FairValueStore::load`].
    pub fn combined(&self) -> Result<BTreeMap<String, EffectiveValue>> {
        Ok(self.load()?.combined())
    }

    /// Current priority order.
    ///
    /// # Errors
    ///
    /// See [`FairValueStore::load`].
    pub fn priority(&self) -> Result<PriorityOrder> {
        Ok(self.load()?.priority)
    }

    /// Record one value; only that source and ticker change.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidValue`] for a value that is not positive;
    /// nothing is written.
    pub fn set(&self, source: FairValueSource, ticker: &str, value: f64) -> Result<()> {
        self.update(|doc| doc.set(source, ticker, value))?;
        debug!(source = %source, ticker, value, "Recorded fair value");
        Ok(())
    }

    /// Merge many values into one source in a single write.
    ///
    /// # Errors
    ///
    /// Returns the first invalid entry; nothing is written.
    pub fn merge_source(&self, source: FairValueSource, values: &BTreeMap<String, f64>) -> Result<()> {
        self.update(|doc| doc.merge_source(source, values))
    }

    /// Replace one source's values entirely.
    ///
    /// # Errors
    ///
    /// Returns the first invalid entry; nothing is written.
    pub fn replace_source(
        &self,
        source: FairValueSource,
        values: &BTreeMap<String, f64>,
    ) -> Result<()> {
        self.update(|doc| doc.replace_source(source, values))?;
        info!(source = %source, count = values.len(), "Replaced fair value source");
        Ok(())
    }

    /// Remove one value, returning it if it was present.
    ///
    /// # Errors
    ///
    /// See [`FairValueStore::load`].
    pub fn remove(&self, source: FairValueSource, ticker: &str) -> Result<Option<f64>> {
        self.update(|doc| Ok(doc.remove(source, ticker)))
    }

    /// Persist a new priority order.
    ///
    /// # Errors
    ///
    /// See [`FairValueStore::load`]. Validation of the order itself happens
    /// when the [`PriorityOrder`] is built.
    pub fn set_priority(&self, order: PriorityOrder) -> Result<()> {
        self.update(|doc| {
            doc.priority = order;
            Ok(())
        })?;
        info!(priority = %order, "Updated source priority");
        Ok(())
    }

    /// Set the priority order from source names.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PriorityInvalid`] unless the names are a
    /// permutation of `dcf`, `manual` and `analyst`; the stored order is
    /// left in force.
    pub fn set_priority_names<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        self.set_priority(PriorityOrder::from_names(names)?)
    }

    /// Import a legacy `{"values": {...}}` file into the `dcf` source.
    ///
    /// # Errors
    ///
    /// Returns an error if the legacy file is unreadable or malformed, or
    /// the store cannot be updated.
    pub fn import_legacy_dcf<P: AsRef<Path>>(&self, path: P) -> Result<LegacyImport> {
        let import = legacy::read_wrapped(path)?;
        self.merge_source(FairValueSource::Dcf, &import.values)?;
        Ok(import)
    }

    /// Import a legacy flat analyst file into the `analyst` source.
    ///
    /// # Errors
    ///
    /// Returns an error if the legacy file is unreadable or malformed, or
    /// the store cannot be updated.
    pub fn import_legacy_analyst<P: AsRef<Path>>(&self, path: P) -> Result<LegacyImport> {
        let import = legacy::read_flat(path)?;
        self.merge_source(FairValueSource::Analyst, &import.values)?;
        Ok(import)
    }
}
