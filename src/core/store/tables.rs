//! Table document operations

use chrono::Utc;
use miette::{IntoDiagnostic, Result};
use rusqlite::{params, OptionalExtension, Row};
use ulid::Ulid;

use super::{
    format_datetime, parse_datetime, BoardStatus, DocumentStore, StoredTable, TableSource,
    TableSummary, UploadMeta,
};
use crate::core::board::{Board, TableKind};
use crate::core::table::Table;

const SUMMARY_COLUMNS: &str = "d.id, d.board_id, b.name, d.kind, d.original_filename, \
     d.file_size, d.uploaded_at, d.uploaded_by, d.row_count";

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<TableSummary> {
    let kind: String = row.get(3)?;
    Ok(TableSummary {
        id: row.get(0)?,
        board_id: row.get(1)?,
        board_name: row.get(2)?,
        file_type: kind.parse().unwrap_or(TableKind::Fmeca),
        original_filename: row.get(4)?,
        file_size: row.get::<_, i64>(5)? as u64,
        upload_date: parse_datetime(row.get::<_, String>(6)?),
        uploaded_by: row.get(7)?,
        record_count: row.get::<_, i64>(8)? as usize,
    })
}

fn decode_document((summary, document): (TableSummary, String)) -> Result<StoredTable> {
    let table: Table = serde_json::from_str(&document)
        .map_err(|e| miette::miette!("Corrupt table document {}: {}", summary.id, e))?;
    Ok(StoredTable { summary, table })
}

impl DocumentStore {
    /// Store a decoded sheet as the newest table of its kind for a board
    ///
    /// A single unconditional insert. Concurrent uploads for the same
    /// board/kind both land; the later upload time wins on read.
    pub fn insert_table(
        &self,
        board: &Board,
        kind: TableKind,
        meta: &UploadMeta,
        table: &Table,
    ) -> Result<TableSummary> {
        let id = Ulid::new().to_string();
        let now = Utc::now();
        let document = serde_json::to_string(table).into_diagnostic()?;

        self.conn
            .execute(
                r#"INSERT INTO table_documents
                   (id, board_id, kind, original_filename, file_size, uploaded_by,
                    uploaded_at, row_count, document)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
                params![
                    id,
                    board.id,
                    kind.as_str(),
                    meta.original_filename,
                    meta.file_size as i64,
                    meta.uploaded_by,
                    format_datetime(&now),
                    table.row_count() as i64,
                    document,
                ],
            )
            .into_diagnostic()?;

        tracing::info!(
            board = %board.name,
            kind = %kind,
            rows = table.row_count(),
            id = %id,
            "stored table document"
        );

        Ok(TableSummary {
            id,
            board_id: board.id,
            board_name: board.name.clone(),
            file_type: kind,
            original_filename: meta.original_filename.clone(),
            file_size: meta.file_size,
            upload_date: now,
            uploaded_by: meta.uploaded_by.clone(),
            record_count: table.row_count(),
        })
    }

    /// Newest table of a kind for a board, with its payload
    pub fn latest_table(&self, board_id: i64, kind: TableKind) -> Result<Option<StoredTable>> {
        let sql = format!(
            "SELECT {}, d.document FROM table_documents d JOIN boards b ON b.id = d.board_id \
             WHERE d.board_id = ?1 AND d.kind = ?2 \
             ORDER BY d.uploaded_at DESC, d.rowid DESC LIMIT 1",
            SUMMARY_COLUMNS
        );

        let found = self
            .conn
            .query_row(&sql, params![board_id, kind.as_str()], |row| {
                Ok((summary_from_row(row)?, row.get::<_, String>(9)?))
            })
            .optional()
            .into_diagnostic()?;

        found.map(decode_document).transpose()
    }

    /// One stored table by document id, with its payload
    pub fn get_table(&self, id: &str) -> Result<Option<StoredTable>> {
        let sql = format!(
            "SELECT {}, d.document FROM table_documents d JOIN boards b ON b.id = d.board_id \
             WHERE d.id = ?1",
            SUMMARY_COLUMNS
        );

        let found = self
            .conn
            .query_row(&sql, params![id], |row| {
                Ok((summary_from_row(row)?, row.get::<_, String>(9)?))
            })
            .optional()
            .into_diagnostic()?;

        found.map(decode_document).transpose()
    }

    /// Whether any table of a kind was uploaded for a board
    pub fn has_table(&self, board_id: i64, kind: TableKind) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM table_documents WHERE board_id = ?1 AND kind = ?2",
                params![board_id, kind.as_str()],
                |row| row.get(0),
            )
            .into_diagnostic()?;
        Ok(count > 0)
    }

    /// Upload summaries for a board, newest first
    pub fn list_tables(
        &self,
        board_id: i64,
        kind: Option<TableKind>,
        limit: usize,
    ) -> Result<Vec<TableSummary>> {
        let sql = format!(
            "SELECT {} FROM table_documents d JOIN boards b ON b.id = d.board_id \
             WHERE d.board_id = ?1 AND (?2 IS NULL OR d.kind = ?2) \
             ORDER BY d.uploaded_at DESC, d.rowid DESC LIMIT ?3",
            SUMMARY_COLUMNS
        );

        let mut stmt = self.conn.prepare(&sql).into_diagnostic()?;
        let summaries = stmt
            .query_map(
                params![board_id, kind.map(|k| k.as_str()), limit as i64],
                summary_from_row,
            )
            .into_diagnostic()?
            .collect::<rusqlite::Result<Vec<_>>>()
            .into_diagnostic()?;
        Ok(summaries)
    }

    /// Delete one stored table document; returns false if the id is unknown
    pub fn delete_table(&self, id: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM table_documents WHERE id = ?1", params![id])
            .into_diagnostic()?;
        Ok(removed > 0)
    }

    /// Latest upload of each kind for a board
    pub fn board_status(&self, board: &Board) -> Result<BoardStatus> {
        let fmeca_info = self.latest_summary(board.id, TableKind::Fmeca)?;
        let coverage_info = self.latest_summary(board.id, TableKind::Coverage)?;
        Ok(BoardStatus {
            board_id: board.id,
            board_name: board.name.clone(),
            fmeca_in_db: fmeca_info.is_some(),
            coverage_in_db: coverage_info.is_some(),
            fmeca_info,
            coverage_info,
        })
    }

    fn latest_summary(&self, board_id: i64, kind: TableKind) -> Result<Option<TableSummary>> {
        Ok(self.list_tables(board_id, Some(kind), 1)?.into_iter().next())
    }
}

impl TableSource for DocumentStore {
    fn latest(&self, board_id: i64, kind: TableKind) -> Result<Option<Table>> {
        Ok(self.latest_table(board_id, kind)?.map(|stored| stored.table))
    }
}
