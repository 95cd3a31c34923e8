//! `hwatm fmeca` command - risk-band filtered FMECA rows with coverage verdicts

use miette::Result;

use crate::analysis::{fmeca_report, RiskBand};
use crate::cli::helpers::truncate_str;
use crate::cli::output::{emit, Listing};
use crate::cli::{Context, GlobalOpts};
use crate::core::BoardSelector;

#[derive(clap::Args, Debug)]
pub struct FmecaArgs {
    /// Board id or name
    pub board: String,

    /// Risk band: red (>=70), orange (>=60), yellow (>=50), green (<50) or all
    #[arg(long)]
    pub filter: Option<String>,
}

pub fn run(args: FmecaArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global)?;
    ctx.current_user()?;
    let board = ctx.store.require_board(&BoardSelector::parse(&args.board))?;

    let selector = args.filter.unwrap_or_else(|| ctx.config.default_filter.clone());
    let band = RiskBand::from_selector(&selector);
    let response = fmeca_report(&ctx.store, board.id, band);

    let wide = global.format.is_machine();
    let mut listing = Listing::new([
        "ID",
        "COMPONENT",
        "REFERENCE DESIGNATOR",
        "RPN",
        "ATM COVERAGE",
    ]);
    for record in &response.data {
        let designator = if wide {
            record.reference_designator.clone()
        } else {
            truncate_str(&record.reference_designator, 40)
        };
        listing.push([
            record.id.clone(),
            record.component.clone(),
            designator,
            record.rpn.clone(),
            record.atm_coverage.clone(),
        ]);
    }

    emit(global, &response, &listing, response.message.as_deref())
}
