//! SQLite-backed content store for a single tenant.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::types::Value;
use rusqlite::{Connection, params, params_from_iter};
use tracing::debug;

use crate::error::StoreError;
use crate::tenants::TenantId;
use crate::types::{MatchMode, NewRecord, Record, RecordId, RenameTarget, RepeaterRow, RepeaterValue};

/// Core tables every tenant database carries.
const CORE_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS records (
        id            INTEGER PRIMARY KEY,
        record_type   TEXT NOT NULL,
        status        TEXT NOT NULL DEFAULT 'published',
        title         TEXT NOT NULL DEFAULT '',
        body          TEXT NOT NULL DEFAULT '',
        guid          TEXT NOT NULL DEFAULT '',
        primary_image TEXT,
        created_at    TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_records_type ON records(record_type);
    CREATE INDEX IF NOT EXISTS idx_records_status ON records(status);

    CREATE TABLE IF NOT EXISTS terms (
        id       INTEGER PRIMARY KEY,
        taxonomy TEXT NOT NULL,
        name     TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_terms_taxonomy ON terms(taxonomy);
";

/// Tables owned by the optional custom-field subsystem. Their presence is the
/// field capability; a tenant provisioned without them no-ops all field work.
const FIELD_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS record_fields (
        record_id INTEGER NOT NULL,
        name      TEXT NOT NULL,
        value     TEXT NOT NULL,
        PRIMARY KEY (record_id, name)
    );
";

/// SQLite-backed content store for one tenant database.
#[derive(Debug)]
pub struct TenantStore {
    tenant: TenantId,
    conn: Mutex<Connection>,
}

impl TenantStore {
    /// Open or create the tenant database. Creates the core tables but never
    /// the field tables; those belong to [`TenantStore::provision_fields`].
    pub fn open(tenant: TenantId, path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;

        // Enable WAL mode for concurrent reads
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        conn.execute_batch(CORE_SCHEMA)?;

        debug!(tenant = %tenant, path = %path.display(), "tenant store opened");

        Ok(Self {
            tenant,
            conn: Mutex::new(conn),
        })
    }

    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    // =========================================================================
    // Capability probes
    // =========================================================================

    /// Whether the custom-field subsystem is present in this tenant database.
    pub fn has_field_support(&self) -> Result<bool, StoreError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'record_fields'",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Install the custom-field subsystem tables.
    pub fn provision_fields(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(FIELD_SCHEMA)?;
        debug!(tenant = %self.tenant, "field subsystem provisioned");
        Ok(())
    }

    // =========================================================================
    // Records
    // =========================================================================

    /// Insert a record, returning its ID.
    pub fn insert_record(&self, new: &NewRecord) -> Result<RecordId, StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO records (record_type, status, title, body, guid, primary_image, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                new.record_type,
                new.status,
                new.title,
                new.body,
                new.guid,
                new.primary_image,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Get a record by ID.
    pub fn get_record(&self, id: RecordId) -> Result<Option<Record>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let result = conn
            .query_row(
                "SELECT id, record_type, status, title, body, guid, primary_image, created_at
                 FROM records WHERE id = ?1",
                params![id],
                record_from_row,
            )
            .optional()?;
        Ok(result)
    }

    /// Count records of one type.
    pub fn count_records(&self, record_type: &str) -> Result<u64, StoreError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM records WHERE record_type = ?1",
            params![record_type],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Fetch one window of records of the given types, ordered by ID so an
    /// offset-based window is reproducible. Trashed records are skipped only
    /// when `include_all_statuses` is false.
    pub fn fetch_window(
        &self,
        record_types: &[&str],
        offset: u64,
        limit: u64,
        include_all_statuses: bool,
    ) -> Result<Vec<Record>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let placeholders = record_types.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let status_clause = if include_all_statuses {
            ""
        } else {
            " AND status != 'trashed'"
        };
        let sql = format!(
            "SELECT id, record_type, status, title, body, guid, primary_image, created_at
             FROM records WHERE record_type IN ({placeholders}){status_clause}
             ORDER BY id LIMIT ? OFFSET ?"
        );

        let mut values: Vec<Value> = record_types
            .iter()
            .map(|t| Value::from(t.to_string()))
            .collect();
        values.push(Value::from(limit as i64));
        values.push(Value::from(offset as i64));

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Replace the record body.
    pub fn set_body(&self, id: RecordId, body: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE records SET body = ?1 WHERE id = ?2",
            params![body, id],
        )?;
        if changed == 0 {
            return Err(StoreError::RecordNotFound(id));
        }
        Ok(())
    }

    /// Whether the record has a primary image assigned.
    pub fn has_primary_image(&self, id: RecordId) -> Result<bool, StoreError> {
        let conn = self.conn.lock().unwrap();
        let present: bool = conn.query_row(
            "SELECT primary_image IS NOT NULL AND primary_image != '' FROM records WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(present)
    }

    /// Assign a media reference as the record's primary image.
    pub fn set_primary_image(&self, id: RecordId, media_ref: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE records SET primary_image = ?1 WHERE id = ?2",
            params![media_ref, id],
        )?;
        if changed == 0 {
            return Err(StoreError::RecordNotFound(id));
        }
        Ok(())
    }

    // =========================================================================
    // Custom fields
    // =========================================================================

    /// Read a scalar field value. Absent fields read as `None`.
    pub fn read_field(&self, id: RecordId, name: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let result = conn
            .query_row(
                "SELECT value FROM record_fields WHERE record_id = ?1 AND name = ?2",
                params![id, name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(result)
    }

    /// Write a scalar field value, replacing any existing value.
    pub fn write_field(&self, id: RecordId, name: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO record_fields (record_id, name, value) VALUES (?1, ?2, ?3)",
            params![id, name, value],
        )?;
        Ok(())
    }

    /// Read a repeater field. Absent and empty values read as
    /// [`RepeaterValue::Absent`]; anything that does not decode as an array of
    /// string-valued rows reads as [`RepeaterValue::Malformed`].
    pub fn read_repeater(&self, id: RecordId, name: &str) -> Result<RepeaterValue, StoreError> {
        let raw = self.read_field(id, name)?;
        let Some(text) = raw else {
            return Ok(RepeaterValue::Absent);
        };
        if text.is_empty() {
            return Ok(RepeaterValue::Absent);
        }
        match serde_json::from_str::<Vec<RepeaterRow>>(&text) {
            Ok(rows) => Ok(RepeaterValue::Rows(rows)),
            Err(_) => Ok(RepeaterValue::Malformed),
        }
    }

    /// Write a repeater field wholesale.
    pub fn write_repeater(&self, id: RecordId, name: &str, rows: &[RepeaterRow]) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(rows)?;
        self.write_field(id, name, &encoded)
    }

    /// Append one row to a repeater field, creating the field when absent.
    /// Returns the new row count.
    pub fn append_repeater_row(
        &self,
        id: RecordId,
        name: &str,
        row: RepeaterRow,
    ) -> Result<usize, StoreError> {
        let mut rows = match self.read_repeater(id, name)? {
            RepeaterValue::Absent => Vec::new(),
            RepeaterValue::Rows(rows) => rows,
            RepeaterValue::Malformed => {
                return Err(StoreError::NotARepeater {
                    field: name.to_string(),
                });
            }
        };
        rows.push(row);
        self.write_repeater(id, name, &rows)?;
        Ok(rows.len())
    }

    // =========================================================================
    // Terms
    // =========================================================================

    /// Insert a taxonomy term.
    pub fn insert_term(&self, taxonomy: &str, name: &str) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO terms (taxonomy, name) VALUES (?1, ?2)",
            params![taxonomy, name],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Count terms in one taxonomy.
    pub fn count_terms(&self, taxonomy: &str) -> Result<u64, StoreError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM terms WHERE taxonomy = ?1",
            params![taxonomy],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // =========================================================================
    // Global rename
    // =========================================================================

    /// Rewrite a token across one column in a single statement. Returns the
    /// number of rows matched. Re-running with already-rewritten data matches
    /// nothing, so the operation is idempotent.
    pub fn global_rename(
        &self,
        target: RenameTarget,
        old: &str,
        new: &str,
        mode: MatchMode,
    ) -> Result<usize, StoreError> {
        let conn = self.conn.lock().unwrap();
        let (table, column) = target.column();

        let changed = match mode {
            MatchMode::Exact => conn.execute(
                &format!("UPDATE {table} SET {column} = ?1 WHERE {column} = ?2"),
                params![new, old],
            )?,
            _ => conn.execute(
                &format!(
                    "UPDATE {table} SET {column} = REPLACE({column}, ?1, ?2) \
                     WHERE {column} LIKE ?3 ESCAPE '\\'"
                ),
                params![old, new, mode.like_pattern(old)],
            )?,
        };

        Ok(changed)
    }
}

fn record_from_row(row: &rusqlite::Row<'_>) -> Result<Record, rusqlite::Error> {
    Ok(Record {
        id: row.get(0)?,
        record_type: row.get(1)?,
        status: row.get(2)?,
        title: row.get(3)?,
        body: row.get(4)?,
        guid: row.get(5)?,
        primary_image: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// Extension trait for optional query results.
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error>;
}

impl<T> OptionalExt<T> for Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
