//! SQLite-backed record store for projects and parts
//!
//! This module provides the transactional storage the numbering engine sits on:
//! - Declares the unique constraints on `part_number` and `(project_id, numeric_id)`
//! - Opens every mutating unit of work with `BEGIN IMMEDIATE`, so the write
//!   lock is held from the first max-read until commit
//! - Exposes the engine-facing seams as the [`ProjectStore`] and
//!   [`PartRecordStore`] traits
//!
//! Records here are authoritative. A schema version mismatch is reported,
//! never silently rebuilt.

mod queries;
mod schema;
mod types;

pub use queries::PartQueries;
pub use types::*;

use std::fs;
use std::ops::Deref;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use thiserror::Error;
use tracing::debug;

use crate::core::identity::{PartId, ProjectId};

/// Database file name inside a workspace directory
pub const DATABASE_FILE: &str = "parts.db";

/// Current schema version
const SCHEMA_VERSION: i32 = 2;

/// Default time a writer waits for the database lock
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by the record store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("database schema version {found} is not supported (expected {expected})")]
    SchemaMismatch { found: i32, expected: i32 },

    #[error("database error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(err, message) = &value {
            let code = err.extended_code;
            if code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            {
                let detail = message.clone().unwrap_or_else(|| err.to_string());
                return StoreError::UniqueViolation(detail);
            }
        }
        StoreError::Sqlite(value)
    }
}

/// Read-only lookup of project records
pub trait ProjectStore {
    /// Load a project by key
    fn get_project(&self, id: ProjectId) -> StoreResult<Option<Project>>;
}

/// The part operations the numbering engine relies on.
///
/// Implementations must run inside a caller-managed transaction that holds
/// the project's write lock; the engine never coordinates on its own.
pub trait PartRecordStore {
    /// Highest `numeric_id` among the project's assemblies
    fn max_assembly_id(&self, project_id: ProjectId) -> StoreResult<Option<u32>>;

    /// Highest `numeric_id` in the project strictly inside the block that
    /// starts at `block_start`, whichever record holds it and wherever that
    /// record now hangs
    fn max_id_in_block(&self, project_id: ProjectId, block_start: u32)
        -> StoreResult<Option<u32>>;

    /// Load a part by key
    fn get_part(&self, id: PartId) -> StoreResult<Option<Part>>;

    /// Insert a fully numbered record.
    ///
    /// Fails with [`StoreError::UniqueViolation`] when the part number or the
    /// project's numeric id is already taken.
    fn insert_part(&self, record: &NewPart) -> StoreResult<Part>;
}

/// The store backed by SQLite
pub struct PartStore {
    conn: Connection,
}

impl PartStore {
    /// Open or create the database at `path`
    pub fn open(path: &Path, busy_timeout: Duration) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        // Busy timeout first: every statement below may need the write lock.
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch("PRAGMA foreign_keys=ON; PRAGMA journal_mode=WAL;")?;

        debug!(path = %path.display(), "opened part store");
        Self::from_connection(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        let store = Self { conn };
        store.init_schema()?;
        store.check_schema_version()?;
        Ok(store)
    }

    /// Begin a write transaction.
    ///
    /// `BEGIN IMMEDIATE` acquires the database write lock up front, which is
    /// the critical section for allocation: no other writer can read the
    /// same maximum until this transaction commits or rolls back.
    pub fn begin(&mut self) -> StoreResult<StoreTx<'_>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        Ok(StoreTx { tx })
    }

    /// Connection for read-only queries outside a write transaction
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

impl Deref for PartStore {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

/// A write transaction; rolls back when dropped without [`StoreTx::commit`]
pub struct StoreTx<'conn> {
    tx: Transaction<'conn>,
}

impl StoreTx<'_> {
    /// Commit all changes made in this transaction
    pub fn commit(self) -> StoreResult<()> {
        self.tx.commit()?;
        Ok(())
    }
}

impl Deref for StoreTx<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.tx
    }
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests;
