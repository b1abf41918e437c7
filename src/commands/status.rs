use std::io::{self, Write};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::{open_store, resolve_db_path};
use crate::store::{AnalysisStore, StoreEntry};

pub fn run(args: StatusArgs) -> Result<()> {
    let db_path = resolve_db_path(&args.cache_root, args.db_path.as_deref());
    info!(cache_root = %args.cache_root.display(), "status requested");

    if !db_path.exists() {
        warn!(path = %db_path.display(), "analysis store missing");
        return Ok(());
    }

    let store = open_store(&args.cache_root, args.db_path.as_deref())?;
    let entries = store.list().context("failed to list stored analyses")?;
    let now = Utc::now();
    let expired = entries
        .iter()
        .filter(|entry| entry.expires_at <= now)
        .count();

    info!(
        path = %db_path.display(),
        analyses = entries.len(),
        expired,
        "store status"
    );

    if args.json {
        let mut output = io::BufWriter::new(io::stdout().lock());
        serde_json::to_writer_pretty(&mut output, &entries)
            .context("failed to serialize status json output")?;
        writeln!(output)?;
        output.flush()?;
        return Ok(());
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    for entry in &entries {
        writeln!(output, "{}", format_entry(entry, now))?;
    }
    output.flush()?;
    Ok(())
}

fn format_entry(entry: &StoreEntry, now: chrono::DateTime<Utc>) -> String {
    let expiry = if entry.expires_at <= now {
        "expired".to_string()
    } else {
        format!("expires {}", entry.expires_at.format("%Y-%m-%d %H:%M UTC"))
    };
    format!(
        "{}  {}  status={} clauses={}  {}",
        entry.document_id, entry.document_name, entry.status, entry.clause_count, expiry
    )
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    #[test]
    fn entries_show_expiry_state() {
        let stored_at = Utc
            .with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
            .single()
            .expect("valid timestamp");
        let entry = StoreEntry {
            document_id: "3f2a".to_string(),
            document_name: "lease".to_string(),
            status: "complete".to_string(),
            clause_count: 4,
            stored_at,
            expires_at: stored_at + Duration::hours(24),
        };

        assert_eq!(
            format_entry(&entry, stored_at),
            "3f2a  lease  status=complete clauses=4  expires 2026-03-02 09:00 UTC"
        );
        assert_eq!(
            format_entry(&entry, stored_at + Duration::hours(30)),
            "3f2a  lease  status=complete clauses=4  expired"
        );
    }
}
