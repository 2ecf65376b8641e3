use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use parking_lot::Mutex;
use quorum_plan::SchemaCatalog;
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params, params_from_iter, Connection};
use tracing::{debug, warn};

use super::SqlStore;
use crate::error::StoreError;
use crate::value::{Row, SqlValue};

/// A row of `meetings`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingRecord {
    pub number: i64,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub time_zone: String,
}

/// A row of `meeting_summaries`. `id` is assigned by the store when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRecord {
    pub id: Option<i64>,
    pub vector_id: Option<i64>,
    pub summary: String,
    pub meeting_number: i64,
    pub speaker: Option<String>,
}

/// A row of `meeting_subjects`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectRecord {
    pub name: String,
    pub meeting_number: i64,
}

/// SQLite-backed store.
///
/// Dates are stored as `YYYY-MM-DD` text and times as `HH:MM:SS`, so range
/// predicates on `meeting_date` compare lexicographically in calendar order.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open(path)?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create the catalog's tables.
    pub fn init_schema(&self, catalog: &SchemaCatalog) -> Result<(), StoreError> {
        self.conn.lock().execute_batch(catalog.ddl())?;
        debug!("initialized store schema");
        Ok(())
    }

    /// Insert a meeting unless its number is already present. Returns whether a row was written.
    pub fn insert_meeting(&self, meeting: &MeetingRecord) -> Result<bool, StoreError> {
        let changed = self.conn.lock().execute(
            "INSERT OR IGNORE INTO meetings (number, meeting_date, start_time, end_time, time_zone) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                meeting.number,
                meeting.date.format("%Y-%m-%d").to_string(),
                meeting.start_time.format("%H:%M:%S").to_string(),
                meeting.end_time.format("%H:%M:%S").to_string(),
                meeting.time_zone,
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn insert_summary(&self, summary: &SummaryRecord) -> Result<bool, StoreError> {
        let changed = self.conn.lock().execute(
            "INSERT OR IGNORE INTO meeting_summaries (id, vector_id, summary, meeting_number, speaker) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                summary.id,
                summary.vector_id,
                summary.summary,
                summary.meeting_number,
                summary.speaker,
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn insert_subject(&self, subject: &SubjectRecord) -> Result<bool, StoreError> {
        let changed = self.conn.lock().execute(
            "INSERT OR IGNORE INTO meeting_subjects (name, meeting_number) VALUES (?1, ?2)",
            params![subject.name, subject.meeting_number],
        )?;
        Ok(changed > 0)
    }
}

impl SqlStore for SqliteStore {
    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql).map_err(|err| {
            warn!(error = %err, sql, "failed to prepare statement");
            StoreError::from(err)
        })?;
        let width = stmt.column_count();
        let mut rows = stmt.query(params_from_iter(params.iter().map(to_driver)))?;

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(from_driver(row.get_ref(i)?));
            }
            out.push(values);
        }
        Ok(out)
    }
}

fn to_driver(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(n) => Value::Integer(*n),
        SqlValue::Real(r) => Value::Real(*r),
        SqlValue::Text(s) => Value::Text(s.clone()),
    }
}

fn from_driver(value: ValueRef<'_>) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(n) => SqlValue::Integer(n),
        ValueRef::Real(r) => SqlValue::Real(r),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            SqlValue::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}
