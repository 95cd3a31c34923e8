//! `hwatm atm-check` command - coverage designators missing from the FMECA

use miette::Result;

use crate::analysis::atm_report;
use crate::cli::output::{emit, Listing};
use crate::cli::{Context, GlobalOpts};
use crate::core::BoardSelector;

#[derive(clap::Args, Debug)]
pub struct AtmCheckArgs {
    /// Board id or name
    pub board: String,
}

pub fn run(args: AtmCheckArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global)?;
    ctx.current_user()?;
    let board = ctx.store.require_board(&BoardSelector::parse(&args.board))?;

    let response = atm_report(&ctx.store, board.id);

    let mut listing = Listing::new(["COMPONENT", "ATM COVERAGE"]);
    for missing in &response.missing_components {
        listing.push([missing.component.clone(), missing.atm_coverage.clone()]);
    }

    emit(global, &response, &listing, Some(&response.message))
}
