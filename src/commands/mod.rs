pub mod analyze;
pub mod ask;
pub mod purge;
pub mod status;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::store::SqliteStore;
use crate::util::ensure_directory;

const DEFAULT_DB_FILE: &str = "clausewise.sqlite";

pub(crate) fn resolve_db_path(cache_root: &Path, db_path: Option<&Path>) -> PathBuf {
    db_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| cache_root.join(DEFAULT_DB_FILE))
}

pub(crate) fn open_store(cache_root: &Path, db_path: Option<&Path>) -> Result<SqliteStore> {
    let db_path = resolve_db_path(cache_root, db_path);
    if let Some(parent) = db_path.parent() {
        ensure_directory(parent)?;
    }
    SqliteStore::open(&db_path)
        .with_context(|| format!("failed to open analysis store {}", db_path.display()))
}
