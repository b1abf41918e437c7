use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::DocumentAnalysis;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAnalysis {
    pub analysis: DocumentAnalysis,
    pub stored_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl StoredAnalysis {
    pub fn new(analysis: DocumentAnalysis, stored_at: DateTime<Utc>, retention: Duration) -> Self {
        Self {
            analysis,
            stored_at,
            expires_at: stored_at + retention,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn entry(&self) -> StoreEntry {
        StoreEntry {
            document_id: self.analysis.document_id.clone(),
            document_name: self.analysis.document_name.clone(),
            status: self.analysis.status.as_str().to_string(),
            clause_count: self.analysis.clauses.len(),
            stored_at: self.stored_at,
            expires_at: self.expires_at,
        }
    }
}

/// Listing row; avoids loading every clause just to show what is stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreEntry {
    pub document_id: String,
    pub document_name: String,
    pub status: String,
    pub clause_count: usize,
    pub stored_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub trait AnalysisStore {
    /// Inserts or replaces the record for the analysis' document id.
    fn put(&mut self, record: StoredAnalysis) -> Result<(), StoreError>;
    fn get(&self, document_id: &str) -> Result<Option<StoredAnalysis>, StoreError>;
    /// Returns whether a record was removed.
    fn delete(&mut self, document_id: &str) -> Result<bool, StoreError>;
    /// Entries ordered by storage time, oldest first.
    fn list(&self) -> Result<Vec<StoreEntry>, StoreError>;
    fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<String>, StoreError>;

    fn purge_expired(&mut self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut removed = 0usize;
        for document_id in self.list_expired(now)? {
            if self.delete(&document_id)? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Process-local store for callers that do not need persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: HashMap<String, StoredAnalysis>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AnalysisStore for MemoryStore {
    fn put(&mut self, record: StoredAnalysis) -> Result<(), StoreError> {
        self.records
            .insert(record.analysis.document_id.clone(), record);
        Ok(())
    }

    fn get(&self, document_id: &str) -> Result<Option<StoredAnalysis>, StoreError> {
        Ok(self.records.get(document_id).cloned())
    }

    fn delete(&mut self, document_id: &str) -> Result<bool, StoreError> {
        Ok(self.records.remove(document_id).is_some())
    }

    fn list(&self) -> Result<Vec<StoreEntry>, StoreError> {
        let mut entries = self
            .records
            .values()
            .map(StoredAnalysis::entry)
            .collect::<Vec<StoreEntry>>();
        entries.sort_by(|left, right| {
            left.stored_at
                .cmp(&right.stored_at)
                .then_with(|| left.document_id.cmp(&right.document_id))
        });
        Ok(entries)
    }

    fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<String>, StoreError> {
        let mut expired = self
            .records
            .values()
            .filter(|record| record.is_expired(now))
            .map(|record| record.analysis.document_id.clone())
            .collect::<Vec<String>>();
        expired.sort();
        Ok(expired)
    }
}

/// SQLite-backed store; each analysis is kept as one JSON payload row.
pub struct SqliteStore {
    connection: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let connection = Connection::open(path)?;
        configure_connection(&connection)?;
        ensure_schema(&connection)?;
        Ok(Self { connection })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let connection = Connection::open_in_memory()?;
        ensure_schema(&connection)?;
        Ok(Self { connection })
    }
}

fn configure_connection(connection: &Connection) -> Result<(), StoreError> {
    connection.pragma_update(None, "journal_mode", "WAL")?;
    connection.pragma_update(None, "synchronous", "NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<(), StoreError> {
    connection.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS analyses (
          document_id TEXT PRIMARY KEY,
          document_name TEXT NOT NULL,
          status TEXT NOT NULL,
          clause_count INTEGER NOT NULL,
          stored_at TEXT NOT NULL,
          expires_at TEXT NOT NULL,
          payload TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_analyses_expires_at ON analyses(expires_at);
        ",
    )?;
    Ok(())
}

impl AnalysisStore for SqliteStore {
    fn put(&mut self, record: StoredAnalysis) -> Result<(), StoreError> {
        let payload = serde_json::to_string(&record.analysis)?;
        self.connection.execute(
            "INSERT OR REPLACE INTO analyses
               (document_id, document_name, status, clause_count, stored_at, expires_at, payload)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.analysis.document_id,
                record.analysis.document_name,
                record.analysis.status.as_str(),
                record.analysis.clauses.len() as i64,
                record.stored_at,
                record.expires_at,
                payload,
            ],
        )?;
        Ok(())
    }

    fn get(&self, document_id: &str) -> Result<Option<StoredAnalysis>, StoreError> {
        let row = self
            .connection
            .query_row(
                "SELECT payload, stored_at, expires_at FROM analyses WHERE document_id = ?1",
                params![document_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, DateTime<Utc>>(1)?,
                        row.get::<_, DateTime<Utc>>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((payload, stored_at, expires_at)) = row else {
            return Ok(None);
        };
        Ok(Some(StoredAnalysis {
            analysis: serde_json::from_str(&payload)?,
            stored_at,
            expires_at,
        }))
    }

    fn delete(&mut self, document_id: &str) -> Result<bool, StoreError> {
        let removed = self.connection.execute(
            "DELETE FROM analyses WHERE document_id = ?1",
            params![document_id],
        )?;
        Ok(removed > 0)
    }

    fn list(&self) -> Result<Vec<StoreEntry>, StoreError> {
        let mut statement = self.connection.prepare(
            "SELECT document_id, document_name, status, clause_count, stored_at, expires_at
             FROM analyses
             ORDER BY stored_at ASC, document_id ASC",
        )?;
        let rows = statement.query_map([], |row| {
            Ok(StoreEntry {
                document_id: row.get(0)?,
                document_name: row.get(1)?,
                status: row.get(2)?,
                clause_count: row.get::<_, i64>(3)?.max(0) as usize,
                stored_at: row.get(4)?,
                expires_at: row.get(5)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<String>, StoreError> {
        let mut statement = self.connection.prepare(
            "SELECT document_id FROM analyses WHERE expires_at <= ?1 ORDER BY document_id ASC",
        )?;
        let rows = statement.query_map(params![now], |row| row.get::<_, String>(0))?;

        let mut expired = Vec::new();
        for row in rows {
            expired.push(row?);
        }
        Ok(expired)
    }
}
