//! ATM check: coverage designators with no FMECA counterpart

use std::collections::BTreeSet;

use serde::Serialize;

use super::columns::{CoverageColumns, FmecaColumns};
use super::designator::{extract, ExtractionMode};
use super::{AnalysisError, NOT_FOUND};
use crate::core::Table;

/// Tokens that come from blank or placeholder cells rather than real parts
const PLACEHOLDERS: [&str; 5] = ["NAN", "NONE", "NAT", "NULL", "NA"];

/// A coverage designator absent from the FMECA sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingComponent {
    pub component: String,
    pub atm_coverage: String,
}

/// Whether `token` is covered by any FMECA designator
///
/// Matches on equality, on `(TOKEN)` inside a member, or on a member's
/// whitespace-separated word.
fn is_present(token: &str, fmeca: &BTreeSet<String>) -> bool {
    if fmeca.contains(token) {
        return true;
    }
    let wrapped = format!("({})", token);
    fmeca
        .iter()
        .any(|member| member.contains(&wrapped) || member.split_whitespace().any(|w| w == token))
}

fn is_reportable(token: &str) -> bool {
    token.chars().count() > 1 && !PLACEHOLDERS.contains(&token)
}

/// Coverage designators missing from the FMECA sheet, sorted ascending
///
/// Each missing designator carries the verdict of the first coverage row
/// that produced it. A coverage table without rows reconciles cleanly.
pub fn reconcile(fmeca: &Table, coverage: &Table) -> Result<Vec<MissingComponent>, AnalysisError> {
    if coverage.is_empty() {
        return Ok(Vec::new());
    }

    let designator_col = FmecaColumns::designator_only(&fmeca.columns)?;
    let cov_cols = CoverageColumns::resolve(&coverage.columns)?;

    let fmeca_set: BTreeSet<String> = fmeca
        .column(designator_col)
        .flat_map(|cell| extract(cell, ExtractionMode::Loose))
        .collect();

    let coverage_rows: Vec<BTreeSet<String>> = coverage
        .column(cov_cols.candidate)
        .map(|cell| extract(cell, ExtractionMode::Strict))
        .collect();

    let missing: BTreeSet<String> = coverage_rows
        .iter()
        .flatten()
        .map(|token| token.trim().to_uppercase())
        .filter(|token| !is_present(token, &fmeca_set))
        .filter(|token| is_reportable(token))
        .collect();

    tracing::debug!(
        fmeca_designators = fmeca_set.len(),
        coverage_rows = coverage_rows.len(),
        missing = missing.len(),
        "reconciled designators"
    );

    Ok(missing
        .into_iter()
        .map(|component| {
            let atm_coverage = coverage_rows
                .iter()
                .position(|tokens| tokens.contains(&component))
                .map(|row| coverage.cell(row, cov_cols.verdict).display())
                .unwrap_or_else(|| NOT_FOUND.to_string());
            MissingComponent {
                component,
                atm_coverage,
            }
        })
        .collect())
}
