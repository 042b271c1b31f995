//! Default file locations.
//!
//! The store document lives in the platform config directory:
//! - Linux: `~/.config/fairval/`
//! - macOS: `~/Library/Application Support/fairval/`
//! - Windows: `%APPDATA%\fairval\`

use fairval_store::{DEFAULT_FILE_NAME, StoreOptions};
use fairval_valuation::{ConfigLoadError, SectorTable, SectorTableError, ValuationConfig};
use std::path::{Path, PathBuf};

/// Backups kept when `--backup-dir` is given without `--max-backups`.
pub(crate) const DEFAULT_MAX_BACKUPS: usize = 10;

/// Default config directory.
pub(crate) fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fairval")
}

/// Default store document path.
pub(crate) fn default_store_path() -> PathBuf {
    default_config_dir().join(DEFAULT_FILE_NAME)
}

/// Store options from the command-line overrides.
pub(crate) fn store_options(
    config: Option<&Path>,
    backup_dir: Option<&Path>,
    max_backups: Option<usize>,
) -> StoreOptions {
    let path = config.map_or_else(default_store_path, Path::to_path_buf);
    let options = StoreOptions::new(path);
    match backup_dir {
        Some(dir) => options.with_backups(dir, max_backups.unwrap_or(DEFAULT_MAX_BACKUPS)),
        None => options,
    }
}

/// Valuation constants, from a JSON file when given.
pub(crate) fn valuation_config(path: Option<&Path>) -> Result<ValuationConfig, ConfigLoadError> {
    path.map_or_else(|| Ok(ValuationConfig::default()), ValuationConfig::from_json_file)
}

/// `base` with the entries of a JSON or CSV table file merged on top.
pub(crate) fn sector_table(
    base: SectorTable,
    path: Option<&Path>,
) -> Result<SectorTable, SectorTableError> {
    let Some(path) = path else {
        return Ok(base);
    };
    let overrides = if path.extension().is_some_and(|ext| ext == "csv") {
        SectorTable::from_csv_file(path)?
    } else {
        SectorTable::from_json_file(path)?
    };
    let mut table = base;
    table.merge(overrides);
    Ok(table)
}
