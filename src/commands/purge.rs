use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::PurgeArgs;
use crate::commands::{open_store, resolve_db_path};
use crate::store::AnalysisStore;

pub fn run(args: PurgeArgs) -> Result<()> {
    let db_path = resolve_db_path(&args.cache_root, args.db_path.as_deref());
    if !db_path.exists() {
        warn!(path = %db_path.display(), "analysis store missing, nothing to purge");
        return Ok(());
    }

    let mut store = open_store(&args.cache_root, args.db_path.as_deref())?;
    let removed = if args.all {
        let mut removed = 0usize;
        for entry in store.list().context("failed to list stored analyses")? {
            if store
                .delete(&entry.document_id)
                .with_context(|| format!("failed to delete analysis {}", entry.document_id))?
            {
                removed += 1;
            }
        }
        removed
    } else {
        store
            .purge_expired(Utc::now())
            .context("failed to purge expired analyses")?
    };

    info!(path = %db_path.display(), removed, all = args.all, "purge complete");
    Ok(())
}
