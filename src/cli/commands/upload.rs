//! `hwatm upload` command - store a sheet as the board's latest table

use std::path::{Path, PathBuf};

use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::format_size;
use crate::cli::output::{emit_message, print_json};
use crate::cli::{Context, GlobalOpts, OutputFormat};
use crate::core::store::UploadMeta;
use crate::core::table::decode_delimited;
use crate::core::{BoardSelector, TableKind};

#[derive(clap::Args, Debug)]
pub struct UploadArgs {
    /// Board id or name
    pub board: String,

    /// Which sheet this is
    #[arg(long, short = 'k', value_enum)]
    pub kind: TableKind,

    /// CSV or TSV file (header row first)
    pub file: PathBuf,

    /// Keep blank cells instead of filling them from the row above
    #[arg(long)]
    pub no_fill: bool,
}

/// Field delimiter implied by the file extension
fn delimiter_for(path: &Path) -> Result<u8> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    match ext.as_deref() {
        Some("csv") => Ok(b','),
        Some("tsv") | Some("tab") => Ok(b'\t'),
        _ => Err(miette::miette!(
            "Only delimited text files are allowed (.csv, .tsv): {}",
            path.display()
        )),
    }
}

pub fn run(args: UploadArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global)?;
    let user = ctx.require_admin()?;

    let delimiter = delimiter_for(&args.file)?;
    let board = ctx.store.require_board(&BoardSelector::parse(&args.board))?;

    let file_size = std::fs::metadata(&args.file).into_diagnostic()?.len();
    if file_size > ctx.config.max_upload_bytes {
        return Err(miette::miette!(
            "File too large: {} (limit {})",
            format_size(file_size),
            format_size(ctx.config.max_upload_bytes)
        ));
    }

    let bytes = std::fs::read(&args.file).into_diagnostic()?;
    let mut table = decode_delimited(bytes.as_slice(), delimiter)?;
    if table.column_count() == 0 {
        return Err(miette::miette!(
            "No header row found in {}",
            args.file.display()
        ));
    }
    if ctx.config.forward_fill && !args.no_fill {
        table.forward_fill();
    }

    let meta = UploadMeta {
        original_filename: args
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| args.file.display().to_string()),
        file_size,
        uploaded_by: user.username,
    };
    let summary = ctx.store.insert_table(&board, args.kind, &meta, &table)?;

    if global.format == OutputFormat::Json {
        return print_json(&summary);
    }
    emit_message(
        global,
        &format!(
            "Stored {} sheet for {}: {} records from {} (id {})",
            args.kind.label(),
            board.name,
            summary.record_count,
            summary.original_filename,
            summary.id
        ),
    )
}
