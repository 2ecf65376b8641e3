//! The relational-store collaborator.
//!
//! The engine treats the store as a synchronous request/response service:
//! one statement and its positional parameters in, ordered rows out. Pooling
//! and transaction scope belong to the implementation.

mod sqlite;

pub use sqlite::{MeetingRecord, SqliteStore, SubjectRecord, SummaryRecord};

use crate::error::StoreError;
use crate::value::{Row, SqlValue};

/// Calls block the caller until the store answers; implementations own any
/// pooling or timeout policy.
pub trait SqlStore {
    /// Run one statement. `params` bind to the statement's placeholders in order.
    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, StoreError>;
}

impl<T: SqlStore + ?Sized> SqlStore for &T {
    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, StoreError> {
        (**self).execute(sql, params)
    }
}

impl<T: SqlStore + ?Sized> SqlStore for Box<T> {
    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, StoreError> {
        (**self).execute(sql, params)
    }
}
