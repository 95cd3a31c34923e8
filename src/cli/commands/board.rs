//! `hwatm board` command - board registry

use clap::{Args, Subcommand};
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{format_size, format_timestamp, yes_no};
use crate::cli::output::{emit, emit_message, Listing};
use crate::cli::{Context, GlobalOpts, OutputFormat};
use crate::core::store::TableSummary;
use crate::core::BoardSelector;

#[derive(Debug, Subcommand)]
pub enum BoardCommands {
    /// List boards and which sheets they have
    List,
    /// Register a board (admin only)
    Add(BoardAddArgs),
    /// Delete a board and all of its sheets (admin only)
    Remove(BoardRemoveArgs),
    /// Set or clear a board's image URL (admin only)
    Image(BoardImageArgs),
    /// Latest stored sheet of each kind
    Status(BoardArg),
    /// Which sheets and image a board has
    Files(BoardArg),
}

#[derive(Debug, Args)]
pub struct BoardAddArgs {
    /// Board name (unique, case-insensitive)
    pub name: String,

    /// Image URL shown for the board
    #[arg(long)]
    pub image: Option<String>,
}

#[derive(Debug, Args)]
pub struct BoardRemoveArgs {
    /// Board id or name
    pub board: String,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Debug, Args)]
pub struct BoardImageArgs {
    /// Board id or name
    pub board: String,

    /// New image URL; omit to clear
    pub url: Option<String>,
}

#[derive(Debug, Args)]
pub struct BoardArg {
    /// Board id or name
    pub board: String,
}

pub fn run(cmd: BoardCommands, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global)?;

    match cmd {
        BoardCommands::List => {
            ctx.current_user()?;
            let infos = ctx.store.board_infos()?;

            let mut listing = Listing::new(["ID", "NAME", "FMECA", "COVERAGE", "IMAGE"]);
            for info in &infos {
                listing.push([
                    info.id.to_string(),
                    info.name.clone(),
                    yes_no(info.has_fmeca).to_string(),
                    yes_no(info.has_coverage).to_string(),
                    info.image.clone().unwrap_or_else(|| "-".into()),
                ]);
            }
            let summary = format!("{} board(s) found", infos.len());
            emit(global, &infos, &listing, Some(&summary))
        }
        BoardCommands::Add(args) => {
            ctx.require_admin()?;
            let board = ctx.store.add_board(&args.name, args.image.as_deref())?;
            tracing::info!(board = %board.name, id = board.id, "added board");

            if global.format == OutputFormat::Json {
                return crate::cli::output::print_json(&board);
            }
            emit_message(
                global,
                &format!("Added board {} (id {})", board.name, board.id),
            )
        }
        BoardCommands::Remove(args) => {
            ctx.require_admin()?;
            let board = ctx.store.require_board(&BoardSelector::parse(&args.board))?;

            if !args.yes {
                let confirmed = Confirm::with_theme(&ColorfulTheme::default())
                    .with_prompt(format!(
                        "Delete board '{}' and all of its uploaded sheets?",
                        board.name
                    ))
                    .default(false)
                    .interact()
                    .into_diagnostic()?;
                if !confirmed {
                    println!("{} Cancelled", style("!").yellow());
                    return Ok(());
                }
            }

            ctx.store.remove_board(board.id)?;
            emit_message(global, &format!("Removed board {}", board.name))
        }
        BoardCommands::Image(args) => {
            ctx.require_admin()?;
            let board = ctx.store.require_board(&BoardSelector::parse(&args.board))?;
            ctx.store.set_board_image(board.id, args.url.as_deref())?;
            let message = match &args.url {
                Some(url) => format!("Set image of {} to {}", board.name, url),
                None => format!("Cleared image of {}", board.name),
            };
            emit_message(global, &message)
        }
        BoardCommands::Status(arg) => {
            ctx.current_user()?;
            let board = ctx.store.require_board(&BoardSelector::parse(&arg.board))?;
            let status = ctx.store.board_status(&board)?;

            let mut listing = Listing::new(["KIND", "IN STORE", "UPLOADED", "BY", "ROWS", "FILE"]);
            push_latest(&mut listing, "fmeca", status.fmeca_info.as_ref());
            push_latest(&mut listing, "coverage", status.coverage_info.as_ref());
            emit(global, &status, &listing, None)
        }
        BoardCommands::Files(arg) => {
            ctx.current_user()?;
            let board = ctx.store.require_board(&BoardSelector::parse(&arg.board))?;
            let files = ctx.store.board_files(&board)?;

            let mut listing = Listing::new(["BOARD", "FMECA", "COVERAGE", "IMAGE"]);
            listing.push([
                files.board_name.clone(),
                yes_no(files.fmeca_exists).to_string(),
                yes_no(files.coverage_exists).to_string(),
                yes_no(files.image_exists).to_string(),
            ]);
            emit(global, &files, &listing, None)
        }
    }
}

fn push_latest(listing: &mut Listing, kind: &str, summary: Option<&TableSummary>) {
    match summary {
        Some(s) => listing.push([
            kind.to_string(),
            "yes".to_string(),
            format_timestamp(&s.upload_date),
            s.uploaded_by.clone(),
            s.record_count.to_string(),
            format!("{} ({})", s.original_filename, format_size(s.file_size)),
        ]),
        None => listing.push([kind, "no", "-", "-", "-", "-"]),
    }
}
