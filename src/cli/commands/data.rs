//! `hwatm data` command - stored sheet documents

use clap::{Args, Subcommand};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::helpers::{format_size, format_timestamp, truncate_str};
use crate::cli::output::{emit, emit_message, Listing};
use crate::cli::{Context, GlobalOpts};
use crate::core::store::TableSummary;
use crate::core::{BoardSelector, Table, TableKind};

#[derive(Debug, Subcommand)]
pub enum DataCommands {
    /// List uploads for a board, newest first
    List(DataListArgs),
    /// Print the rows of one stored sheet
    Show(DocumentArg),
    /// Delete one stored sheet (admin only)
    Delete(DocumentArg),
}

#[derive(Debug, Args)]
pub struct DataListArgs {
    /// Board id or name
    pub board: String,

    /// Only this sheet kind
    #[arg(long, short = 'k', value_enum)]
    pub kind: Option<TableKind>,

    /// Show at most this many uploads
    #[arg(long, default_value = "100")]
    pub limit: usize,

    /// Include the rows of each upload in JSON output
    #[arg(long)]
    pub include_data: bool,
}

#[derive(Debug, Args)]
pub struct DocumentArg {
    /// Document id (from `hwatm data list`)
    pub id: String,
}

/// One upload, optionally with its rows as column-keyed records
#[derive(Serialize)]
struct DataEntry {
    #[serde(flatten)]
    summary: TableSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Vec<serde_json::Map<String, serde_json::Value>>>,
}

#[derive(Serialize)]
struct DataListResponse {
    board_id: i64,
    board_name: String,
    count: usize,
    data: Vec<DataEntry>,
}

/// Rows as `{column: value}` objects; blank cells become null
fn to_records(table: &Table) -> Result<Vec<serde_json::Map<String, serde_json::Value>>> {
    let mut records = Vec::with_capacity(table.row_count());
    for row in 0..table.row_count() {
        let mut record = serde_json::Map::new();
        for (col, name) in table.columns.iter().enumerate() {
            let value = serde_json::to_value(table.cell(row, col)).into_diagnostic()?;
            record.insert(name.clone(), value);
        }
        records.push(record);
    }
    Ok(records)
}

pub fn run(cmd: DataCommands, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global)?;

    match cmd {
        DataCommands::List(args) => {
            ctx.current_user()?;
            let board = ctx.store.require_board(&BoardSelector::parse(&args.board))?;
            let summaries = ctx.store.list_tables(board.id, args.kind, args.limit)?;

            let mut listing =
                Listing::new(["ID", "KIND", "FILE", "SIZE", "ROWS", "UPLOADED", "BY"]);
            let mut entries = Vec::with_capacity(summaries.len());
            for summary in summaries {
                listing.push([
                    summary.id.clone(),
                    summary.file_type.to_string(),
                    truncate_str(&summary.original_filename, 32),
                    format_size(summary.file_size),
                    summary.record_count.to_string(),
                    format_timestamp(&summary.upload_date),
                    summary.uploaded_by.clone(),
                ]);

                let data = if args.include_data {
                    match ctx.store.get_table(&summary.id)? {
                        Some(stored) => Some(to_records(&stored.table)?),
                        None => None,
                    }
                } else {
                    None
                };
                entries.push(DataEntry { summary, data });
            }

            let message = format!("{} upload(s) for {}", entries.len(), board.name);
            let response = DataListResponse {
                board_id: board.id,
                board_name: board.name,
                count: entries.len(),
                data: entries,
            };
            emit(global, &response, &listing, Some(&message))
        }
        DataCommands::Show(arg) => {
            ctx.current_user()?;
            let stored = ctx
                .store
                .get_table(&arg.id)?
                .ok_or_else(|| miette::miette!("Data not found: {}", arg.id))?;

            let table = &stored.table;
            let mut listing = Listing::new(table.columns.iter().cloned());
            for row in 0..table.row_count() {
                listing.push((0..table.column_count()).map(|col| table.cell(row, col).display()));
            }
            let message = format!(
                "{} sheet for {} from {}: {} records",
                stored.summary.file_type.label(),
                stored.summary.board_name,
                stored.summary.original_filename,
                stored.summary.record_count
            );
            let response = DataEntry {
                data: Some(to_records(table)?),
                summary: stored.summary,
            };
            emit(global, &response, &listing, Some(&message))
        }
        DataCommands::Delete(arg) => {
            ctx.require_admin()?;
            if !ctx.store.delete_table(&arg.id)? {
                return Err(miette::miette!("Data not found: {}", arg.id));
            }
            tracing::info!(id = %arg.id, "deleted table document");
            emit_message(global, "Data deleted successfully")
        }
    }
}
