//! Store type definitions
//!
//! Structs returned by store queries.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::auth::User;
use crate::core::board::TableKind;
use crate::core::table::Table;

/// Store statistics
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    pub boards: usize,
    pub documents: usize,
    pub users: usize,
}

/// Upload metadata recorded alongside a table document
#[derive(Debug, Clone)]
pub struct UploadMeta {
    pub original_filename: String,
    pub file_size: u64,
    pub uploaded_by: String,
}

/// A stored table document without its payload
#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    pub id: String,
    pub board_id: i64,
    pub board_name: String,
    pub file_type: TableKind,
    pub original_filename: String,
    pub file_size: u64,
    pub upload_date: DateTime<Utc>,
    pub uploaded_by: String,
    pub record_count: usize,
}

/// A stored table document with its decoded payload
#[derive(Debug, Clone)]
pub struct StoredTable {
    pub summary: TableSummary,
    pub table: Table,
}

/// Latest upload of each kind for one board
#[derive(Debug, Clone, Serialize)]
pub struct BoardStatus {
    pub board_id: i64,
    pub board_name: String,
    pub fmeca_in_db: bool,
    pub coverage_in_db: bool,
    pub fmeca_info: Option<TableSummary>,
    pub coverage_info: Option<TableSummary>,
}

/// A user row including the stored password hash
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
}
