//! Read-only relational store
//!
//! Each query opens its own read-only SQLite connection and closes it when
//! done. There is no pool and no transaction scope: every call is a single
//! statement against an immutable snapshot.

use crate::error::{HyqaError, Result};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// One result cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob { bytes: usize },
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => f.write_str("NULL"),
            Cell::Integer(v) => write!(f, "{}", v),
            Cell::Real(v) => write!(f, "{}", v),
            Cell::Text(v) => f.write_str(v),
            Cell::Blob { bytes } => write!(f, "<blob {} bytes>", bytes),
        }
    }
}

impl From<ValueRef<'_>> for Cell {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Cell::Null,
            ValueRef::Integer(v) => Cell::Integer(v),
            ValueRef::Real(v) => Cell::Real(v),
            ValueRef::Text(v) => Cell::Text(String::from_utf8_lossy(v).into_owned()),
            ValueRef::Blob(v) => Cell::Blob { bytes: v.len() },
        }
    }
}

/// Columns and rows returned by a query
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RowSet {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Executes one SQL statement per call
pub trait RelationalStore: Send + Sync {
    fn query(&self, sql: &str) -> std::result::Result<RowSet, StoreError>;
}

/// SQLite file opened read-only per query
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Point the store at an existing database file
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(HyqaError::Resource {
                path: path.to_path_buf(),
                message: "Database file not found".to_string(),
            });
        }

        let store = Self {
            path: path.to_path_buf(),
        };

        // Fail at startup rather than on the first question
        let conn = store.connect().map_err(|e| HyqaError::Resource {
            path: path.to_path_buf(),
            message: format!("Cannot open database: {}", e),
        })?;
        let tables: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type IN ('table', 'view')",
            [],
            |row| row.get(0),
        )?;
        tracing::info!("Opened database {} ({} tables/views)", path.display(), tables);

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> std::result::Result<Connection, StoreError> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(conn)
    }
}

impl RelationalStore for SqliteStore {
    fn query(&self, sql: &str) -> std::result::Result<RowSet, StoreError> {
        let conn = self.connect()?;

        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut rows = Vec::new();
        let mut cursor = stmt.query([])?;
        while let Some(row) = cursor.next()? {
            let mut cells = Vec::with_capacity(width);
            for idx in 0..width {
                cells.push(Cell::from(row.get_ref(idx)?));
            }
            rows.push(cells);
        }

        Ok(RowSet { columns, rows })
    }
}
