//! Designator cross-referencing between a board's FMECA and coverage sheets
//!
//! Two pipelines share a column resolver and a designator extractor:
//! - [`risk_filter`] filters FMECA rows by RPN band and attaches a coverage verdict
//! - [`reconcile`] lists coverage designators that have no FMECA counterpart
//!
//! [`report`] wraps both behind a [`TableSource`](crate::core::TableSource)
//! lookup and never fails; every problem becomes a message on the response.

pub mod columns;
pub mod designator;
pub mod reconcile;
pub mod report;
pub mod risk_filter;

pub use columns::{CoverageColumns, FmecaColumns};
pub use designator::{extract_loose, extract_strict};
pub use reconcile::{reconcile, MissingComponent};
pub use report::{atm_report, fmeca_report, AtmResponse, FilterResponse};
pub use risk_filter::{filter_and_enrich, FmecaRecord, RiskBand};

use thiserror::Error;

use crate::core::TableKind;

/// Verdict used when no coverage row mentions a designator
pub const NOT_FOUND: &str = "Not Found";

/// Input-shape problems that degrade a pipeline to an empty result
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("No {} data found in database", .0.label())]
    NoData(TableKind),

    #[error("Cannot locate {} columns: {}", .kind.label(), .missing.join(", "))]
    UnresolvedColumns {
        kind: TableKind,
        missing: Vec<&'static str>,
    },
}
