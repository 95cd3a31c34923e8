//! SQLite-backed document store
//!
//! This module provides the workspace's persistent store:
//! - Board metadata (read fresh on every request)
//! - Uploaded sheets, stored as JSON table documents per board and kind
//! - User accounts and login sessions
//!
//! Every upload is a single insert. The most recent upload for a
//! board/kind pair is the one the analysis pipelines read.

mod boards;
mod schema;
mod tables;
mod types;
mod users;

pub use types::*;

use std::fs;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use miette::{IntoDiagnostic, Result};
use rusqlite::Connection;

use crate::core::board::TableKind;
use crate::core::table::Table;
use crate::core::workspace::Workspace;

/// Current schema version - store is recreated on version mismatch
const SCHEMA_VERSION: i32 = 2;

/// Read access to the latest uploaded table of each kind
///
/// This is the only thing the analysis pipelines need from storage.
pub trait TableSource {
    /// Most recently uploaded table for a board, or `None` if nothing was uploaded
    fn latest(&self, board_id: i64, kind: TableKind) -> Result<Option<Table>>;
}

/// The document store backed by SQLite
pub struct DocumentStore {
    conn: Connection,
}

impl DocumentStore {
    /// Open or create the store for a workspace
    pub fn open(workspace: &Workspace) -> Result<Self> {
        let path = workspace.store_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).into_diagnostic()?;
        }

        let conn = Connection::open(&path).into_diagnostic()?;

        // Enable WAL mode for better concurrent access
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .into_diagnostic()?;

        Self::from_connection(conn)
    }

    /// Open a throwaway in-memory store
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().into_diagnostic()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;").into_diagnostic()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let mut store = Self { conn };
        if store.needs_schema_rebuild() {
            store.reinitialize_schema()?;
        }
        Ok(store)
    }

    /// Check if schema version matches current version
    fn needs_schema_rebuild(&self) -> bool {
        let current_version: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        current_version != SCHEMA_VERSION
    }

    /// Drop all tables and reinitialize schema
    fn reinitialize_schema(&mut self) -> Result<()> {
        self.conn
            .execute_batch(
                r#"
                DROP TABLE IF EXISTS schema_version;
                DROP TABLE IF EXISTS sessions;
                DROP TABLE IF EXISTS users;
                DROP TABLE IF EXISTS table_documents;
                DROP TABLE IF EXISTS boards;
                "#,
            )
            .into_diagnostic()?;

        self.init_schema()
    }

    /// Row counts per table
    #[cfg(test)]
    pub fn statistics(&self) -> Result<StoreStats> {
        let count = |sql: &str| -> Result<usize> {
            self.conn
                .query_row(sql, [], |row| row.get::<_, i64>(0))
                .map(|n| n as usize)
                .into_diagnostic()
        };

        Ok(StoreStats {
            boards: count("SELECT COUNT(*) FROM boards")?,
            documents: count("SELECT COUNT(*) FROM table_documents")?,
            users: count("SELECT COUNT(*) FROM users")?,
        })
    }
}

/// Format a timestamp so that string order equals time order
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse datetime string to DateTime<Utc>
pub(crate) fn parse_datetime(s: String) -> DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc.timestamp_opt(0, 0).single().unwrap_or_default())
}
