//! `store` — persistent calculation history over SQLite.
//!
//! One table, `calculations`, holding immutable records. The store exposes
//! create, list-recent, and delete-by-id only; records are never updated.
//! Each operation opens its own connection (WAL + busy timeout), so the
//! handle is cheap to clone and safe to use from concurrent requests.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Schema version stored in `PRAGMA user_version`.
/// Increment when the DDL changes; add a migration path in `init_db`.
const SCHEMA_VERSION: i64 = 1;

/// Default number of records returned by [`HistoryStore::list_recent`].
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No record with the requested id exists.
    #[error("calculation not found")]
    NotFound,

    #[error("storage error: {0}")]
    Storage(String),
}

/// Kind of calculation a history record was produced by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalcType {
    Evaluate,
    Differentiate,
    Integrate,
}

impl CalcType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalcType::Evaluate => "evaluate",
            CalcType::Differentiate => "differentiate",
            CalcType::Integrate => "integrate",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "evaluate" => Some(CalcType::Evaluate),
            "differentiate" => Some(CalcType::Differentiate),
            "integrate" => Some(CalcType::Integrate),
            _ => None,
        }
    }
}

/// One stored calculation. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationRecord {
    /// Store-assigned id; stable and never reused after deletion.
    pub id: i64,
    /// Original (or annotated, for derivative/integral requests) input text.
    pub input_expr: String,
    /// Rendered result.
    pub result: String,
    pub calc_type: CalcType,
    /// RFC 3339 UTC timestamp, set at creation; history sort key.
    pub created_at: String,
}

/// Fields supplied by the caller when persisting a calculation.
#[derive(Debug, Clone)]
pub struct NewCalculation {
    pub input_expr: String,
    pub result: String,
    pub calc_type: CalcType,
}

#[derive(Debug, Clone)]
pub struct HistoryStore {
    db_path: PathBuf,
}

impl HistoryStore {
    /// Open (creating if needed) the history database at `db_path` and make
    /// sure the schema exists.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self {
            db_path: db_path.into(),
        };
        store.init_db()?;
        Ok(store)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Append a new record, committing before returning. The returned record
    /// carries its assigned id; `AUTOINCREMENT` guarantees ids are never
    /// reused after deletion.
    pub fn create(&self, new: NewCalculation) -> Result<CalculationRecord, StoreError> {
        let created_at = now_iso8601();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO calculations (input_expr, result, calc_type, created_at) \
             VALUES (?1, ?2, ?3, ?4)",
            params![new.input_expr, new.result, new.calc_type.as_str(), created_at],
        )
        .map_err(|e| StoreError::Storage(format!("history: insert record: {e}")))?;

        Ok(CalculationRecord {
            id: conn.last_insert_rowid(),
            input_expr: new.input_expr,
            result: new.result,
            calc_type: new.calc_type,
            created_at,
        })
    }

    /// Most recent records, newest first, truncated to `limit`. Ties within
    /// one timestamp second fall back to insertion order (id descending).
    pub fn list_recent(&self, limit: usize) -> Result<Vec<CalculationRecord>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, input_expr, result, calc_type, created_at FROM calculations \
                 ORDER BY created_at DESC, id DESC LIMIT ?1",
            )
            .map_err(|e| StoreError::Storage(format!("history: prepare list_recent: {e}")))?;

        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(|e| StoreError::Storage(format!("history: query list_recent: {e}")))?;

        let mut records = Vec::new();
        for row in rows {
            let (id, input_expr, result, calc_type, created_at) =
                row.map_err(|e| StoreError::Storage(format!("history: map row: {e}")))?;
            let calc_type = CalcType::from_str(&calc_type).ok_or_else(|| {
                StoreError::Storage(format!("history: unknown calc_type '{calc_type}'"))
            })?;
            records.push(CalculationRecord {
                id,
                input_expr,
                result,
                calc_type,
                created_at,
            });
        }
        Ok(records)
    }

    /// Delete the record with the given id. Other records are unaffected.
    pub fn delete(&self, id: i64) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let affected = conn
            .execute("DELETE FROM calculations WHERE id = ?1", params![id])
            .map_err(|e| StoreError::Storage(format!("history: delete {id}: {e}")))?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Open a SQLite connection and apply recommended pragmas.
    ///
    /// Pragmas applied:
    /// - `journal_mode = WAL` — allows concurrent readers alongside a writer.
    /// - `busy_timeout = 5000` — wait up to 5 s before returning `SQLITE_BUSY`.
    fn conn(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.db_path).map_err(|e| {
            StoreError::Storage(format!("history: open {}: {e}", self.db_path.display()))
        })?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| StoreError::Storage(format!("history: set journal_mode WAL: {e}")))?;
        conn.pragma_update(None, "busy_timeout", 5000)
            .map_err(|e| StoreError::Storage(format!("history: set busy_timeout: {e}")))?;
        Ok(conn)
    }

    fn init_db(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Storage(format!("history: cannot create {}: {e}", parent.display()))
            })?;
        }

        let conn = self.conn()?;
        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .map_err(|e| StoreError::Storage(format!("history: read user_version: {e}")))?;
        if version >= SCHEMA_VERSION {
            return Ok(());
        }

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS calculations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                input_expr TEXT NOT NULL,
                result TEXT NOT NULL,
                calc_type TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            PRAGMA user_version = 1;
            ",
        )
        .map_err(|e| StoreError::Storage(format!("history: initialize schema: {e}")))
    }
}

/// Current UTC time as an RFC 3339 string with second precision, e.g.
/// `"2025-04-01T12:00:00Z"`.
fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calc_type_roundtrips_through_text() {
        for t in [CalcType::Evaluate, CalcType::Differentiate, CalcType::Integrate] {
            assert_eq!(CalcType::from_str(t.as_str()), Some(t));
        }
        assert_eq!(CalcType::from_str("other"), None);
    }

    #[test]
    fn calc_type_serializes_lowercase() {
        let json = serde_json::to_string(&CalcType::Differentiate).unwrap();
        assert_eq!(json, "\"differentiate\"");
    }
}
