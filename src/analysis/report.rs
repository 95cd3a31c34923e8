//! Pipeline boundary: load a board's sheets and build response shapes
//!
//! These functions never fail. Store errors are logged and treated as a
//! missing sheet; every other problem is carried in the response message.

use serde::Serialize;

use super::reconcile::{reconcile, MissingComponent};
use super::risk_filter::{filter_and_enrich, FmecaRecord, RiskBand};
use super::AnalysisError;
use crate::core::{Table, TableKind, TableSource};

/// Result of `hwatm fmeca`
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterResponse {
    pub data: Vec<FmecaRecord>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FilterResponse {
    fn degraded(message: String) -> Self {
        Self {
            data: Vec::new(),
            count: 0,
            message: Some(message),
        }
    }
}

/// Result of `hwatm atm-check`
#[derive(Debug, Clone, Default, Serialize)]
pub struct AtmResponse {
    pub missing_components: Vec<MissingComponent>,
    pub message: String,
}

impl AtmResponse {
    fn degraded(message: String) -> Self {
        Self {
            missing_components: Vec::new(),
            message,
        }
    }
}

fn load<S: TableSource + ?Sized>(source: &S, board_id: i64, kind: TableKind) -> Option<Table> {
    match source.latest(board_id, kind) {
        Ok(table) => table,
        Err(e) => {
            tracing::warn!(board_id, kind = %kind, error = %e, "table lookup failed");
            None
        }
    }
}

fn describe(err: &AnalysisError) -> String {
    match err {
        AnalysisError::NoData(_) => err.to_string(),
        other => format!("Error: {}", other),
    }
}

/// Band-filtered FMECA rows with coverage verdicts for one board
pub fn fmeca_report<S: TableSource + ?Sized>(
    source: &S,
    board_id: i64,
    band: RiskBand,
) -> FilterResponse {
    tracing::debug!(board_id, band = %band, "FMECA report requested");

    let outcome = load(source, board_id, TableKind::Fmeca)
        .ok_or(AnalysisError::NoData(TableKind::Fmeca))
        .and_then(|fmeca| {
            let coverage = load(source, board_id, TableKind::Coverage)
                .ok_or(AnalysisError::NoData(TableKind::Coverage))?;
            filter_and_enrich(&fmeca, &coverage, band)
        });

    match outcome {
        Ok(data) => FilterResponse {
            count: data.len(),
            message: Some(format!("Found {} records", data.len())),
            data,
        },
        Err(e) => {
            tracing::warn!(board_id, error = %e, "FMECA report degraded");
            FilterResponse::degraded(describe(&e))
        }
    }
}

/// Coverage designators missing from the FMECA sheet for one board
pub fn atm_report<S: TableSource + ?Sized>(source: &S, board_id: i64) -> AtmResponse {
    tracing::debug!(board_id, "ATM check requested");

    let (Some(fmeca), Some(coverage)) = (
        load(source, board_id, TableKind::Fmeca),
        load(source, board_id, TableKind::Coverage),
    ) else {
        return AtmResponse::degraded("No data found in database".to_string());
    };
    // A header-only FMECA sheet would report every coverage designator as missing
    if fmeca.is_empty() && !coverage.is_empty() {
        tracing::warn!(board_id, "ATM check degraded: FMECA sheet has no rows");
        return AtmResponse::degraded("No data found in database".to_string());
    }

    match reconcile(&fmeca, &coverage) {
        Ok(missing) if missing.is_empty() => AtmResponse {
            missing_components: missing,
            message: "🎉 ATM Check: All coverage values are present in FMECA".to_string(),
        },
        Ok(missing) => AtmResponse {
            message: format!(
                "ATM Check: {} values found in coverage but missing in FMECA",
                missing.len()
            ),
            missing_components: missing,
        },
        Err(e) => {
            tracing::warn!(board_id, error = %e, "ATM check degraded");
            AtmResponse::degraded(describe(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// In-memory table source keyed by board and kind
    #[derive(Default)]
    struct MemorySource {
        tables: HashMap<(i64, TableKind), Table>,
        broken: bool,
    }

    impl MemorySource {
        fn with(mut self, board_id: i64, kind: TableKind, table: Table) -> Self {
            self.tables.insert((board_id, kind), table);
            self
        }
    }

    impl TableSource for MemorySource {
        fn latest(&self, board_id: i64, kind: TableKind) -> miette::Result<Option<Table>> {
            if self.broken {
                return Err(miette::miette!("store unavailable"));
            }
            Ok(self.tables.get(&(board_id, kind)).cloned())
        }
    }

    fn fmeca_table() -> Table {
        Table::from_strings(
            &["ID", "Component", "Reference Designator", "RPN"],
            &[
                &["1", "Resistor", "R101 C22", "75"],
                &["2", "Capacitor", "C5", "62"],
                &["3", "Diode", "D1", "40"],
            ],
        )
    }

    fn coverage_table() -> Table {
        Table::from_strings(
            &["CRD", "Result"],
            &[&["(R101)", "Pass"], &["C5A", "Fail"], &["D1", "Pass"]],
        )
    }

    fn board() -> MemorySource {
        MemorySource::default()
            .with(1, TableKind::Fmeca, fmeca_table())
            .with(1, TableKind::Coverage, coverage_table())
    }

    #[test]
    fn test_fmeca_report_found_records() {
        let response = fmeca_report(&board(), 1, RiskBand::All);
        assert_eq!(response.count, 3);
        assert_eq!(response.message.as_deref(), Some("Found 3 records"));
        assert_eq!(response.data[0].atm_coverage, "Pass");
        // candidate C5A does not occur in "C5"
        assert_eq!(response.data[1].atm_coverage, "Not Found");
    }

    #[test]
    fn test_fmeca_report_missing_tables() {
        let only_coverage =
            MemorySource::default().with(1, TableKind::Coverage, coverage_table());
        let response = fmeca_report(&only_coverage, 1, RiskBand::All);
        assert_eq!(
            response.message.as_deref(),
            Some("No FMECA data found in database")
        );
        assert!(response.data.is_empty());

        let only_fmeca = MemorySource::default().with(1, TableKind::Fmeca, fmeca_table());
        let response = fmeca_report(&only_fmeca, 1, RiskBand::All);
        assert_eq!(
            response.message.as_deref(),
            Some("No coverage data found in database")
        );
    }

    #[test]
    fn test_store_failure_treated_as_not_found() {
        let source = MemorySource {
            broken: true,
            ..board()
        };
        let response = fmeca_report(&source, 1, RiskBand::Red);
        assert_eq!(response.count, 0);
        assert_eq!(
            response.message.as_deref(),
            Some("No FMECA data found in database")
        );

        let atm = atm_report(&source, 1);
        assert_eq!(atm.message, "No data found in database");
    }

    #[test]
    fn test_unresolvable_columns_become_message() {
        let source = MemorySource::default()
            .with(
                1,
                TableKind::Fmeca,
                Table::from_strings(&["Part"], &[&["R1"]]),
            )
            .with(1, TableKind::Coverage, coverage_table());
        let response = fmeca_report(&source, 1, RiskBand::All);
        assert!(response
            .message
            .as_deref()
            .unwrap()
            .starts_with("Error: Cannot locate FMECA columns"));
    }

    #[test]
    fn test_atm_report_lists_missing() {
        let response = atm_report(&board(), 1);
        assert_eq!(
            response.message,
            "ATM Check: 1 values found in coverage but missing in FMECA"
        );
        assert_eq!(response.missing_components[0].component, "C5A");
        assert_eq!(response.missing_components[0].atm_coverage, "Fail");
    }

    #[test]
    fn test_atm_report_all_clear() {
        let source = MemorySource::default()
            .with(1, TableKind::Fmeca, fmeca_table())
            .with(
                1,
                TableKind::Coverage,
                Table::from_strings(&["CRD", "Result"], &[]),
            );
        let response = atm_report(&source, 1);
        assert!(response.missing_components.is_empty());
        assert_eq!(
            response.message,
            "🎉 ATM Check: All coverage values are present in FMECA"
        );
    }

    #[test]
    fn test_atm_report_header_only_fmeca() {
        let source = MemorySource::default()
            .with(
                1,
                TableKind::Fmeca,
                Table::from_strings(&["ID", "Component", "Reference Designator", "RPN"], &[]),
            )
            .with(
                1,
                TableKind::Coverage,
                Table::from_strings(&["CRD", "Result"], &[&["R1 R2", "Pass"]]),
            );
        let response = atm_report(&source, 1);
        assert!(response.missing_components.is_empty());
        assert_eq!(response.message, "No data found in database");

        // Both sheets empty still reads as all clear
        let source = MemorySource::default()
            .with(
                1,
                TableKind::Fmeca,
                Table::from_strings(&["ID", "Component", "Reference Designator", "RPN"], &[]),
            )
            .with(1, TableKind::Coverage, Table::from_strings(&["CRD", "Result"], &[]));
        assert_eq!(
            atm_report(&source, 1).message,
            "🎉 ATM Check: All coverage values are present in FMECA"
        );
    }

    #[test]
    fn test_other_board_is_isolated() {
        let response = atm_report(&board(), 2);
        assert_eq!(response.message, "No data found in database");
    }

    #[test]
    fn test_response_json_shape() {
        let json = serde_json::to_value(atm_report(&board(), 1)).unwrap();
        assert_eq!(json["missing_components"][0]["component"], "C5A");
        assert_eq!(json["missing_components"][0]["atm_coverage"], "Fail");

        let json = serde_json::to_value(fmeca_report(&board(), 1, RiskBand::Red)).unwrap();
        assert_eq!(json["count"], 1);
        assert_eq!(json["data"][0]["ID"], "1");
        assert_eq!(json["data"][0]["RPN"], "75");
    }
}
