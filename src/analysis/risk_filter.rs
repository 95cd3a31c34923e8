//! RPN band filtering with coverage enrichment

use std::cmp::Ordering;

use serde::Serialize;

use super::columns::{CoverageColumns, FmecaColumns};
use super::designator::{extract, ExtractionMode};
use super::{AnalysisError, NOT_FOUND};
use crate::core::table::format_number;
use crate::core::{Table, TableKind};

/// RPN band selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskBand {
    /// RPN >= 70
    Red,
    /// 60 <= RPN < 70
    Orange,
    /// 50 <= RPN < 60
    Yellow,
    /// RPN < 50
    Green,
    /// No filtering
    All,
}

impl RiskBand {
    /// Parse a selector; anything unrecognized means no filtering
    pub fn from_selector(selector: &str) -> Self {
        match selector.trim().to_lowercase().as_str() {
            "red" => RiskBand::Red,
            "orange" => RiskBand::Orange,
            "yellow" => RiskBand::Yellow,
            "green" => RiskBand::Green,
            _ => RiskBand::All,
        }
    }

    /// Band a numeric score falls in
    pub fn of(score: f64) -> Self {
        if score >= 70.0 {
            RiskBand::Red
        } else if score >= 60.0 {
            RiskBand::Orange
        } else if score >= 50.0 {
            RiskBand::Yellow
        } else {
            RiskBand::Green
        }
    }

    /// Rows with a missing score only pass the `All` band
    pub fn admits(&self, score: Option<f64>) -> bool {
        match (self, score) {
            (RiskBand::All, _) => true,
            (_, None) => false,
            (band, Some(s)) => RiskBand::of(s) == *band,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskBand::Red => "red",
            RiskBand::Orange => "orange",
            RiskBand::Yellow => "yellow",
            RiskBand::Green => "green",
            RiskBand::All => "all",
        }
    }
}

impl std::fmt::Display for RiskBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One surviving FMECA row with its coverage verdict, as display strings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FmecaRecord {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Component")]
    pub component: String,
    #[serde(rename = "Reference_Designator")]
    pub reference_designator: String,
    #[serde(rename = "RPN")]
    pub rpn: String,
    #[serde(rename = "ATM_Coverage")]
    pub atm_coverage: String,
}

/// Descending by score; missing scores sort last
fn by_score_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Filter FMECA rows by band, sort by RPN and attach coverage verdicts
///
/// Each coverage row's candidate designators are matched as substrings of
/// the upper-cased designator text of every surviving row. Coverage rows are
/// applied in order, so a later match overwrites an earlier verdict.
pub fn filter_and_enrich(
    fmeca: &Table,
    coverage: &Table,
    band: RiskBand,
) -> Result<Vec<FmecaRecord>, AnalysisError> {
    if fmeca.is_empty() {
        return Err(AnalysisError::NoData(TableKind::Fmeca));
    }
    if coverage.is_empty() {
        return Err(AnalysisError::NoData(TableKind::Coverage));
    }

    let cols = FmecaColumns::resolve(&fmeca.columns)?;
    let cov_cols = CoverageColumns::resolve(&coverage.columns)?;

    struct Candidate {
        row: usize,
        score: Option<f64>,
        designators: String,
        verdict: String,
    }

    let mut survivors: Vec<Candidate> = (0..fmeca.row_count())
        .map(|row| Candidate {
            row,
            score: fmeca.cell(row, cols.risk).as_number(),
            designators: fmeca.cell(row, cols.designator).display().to_uppercase(),
            verdict: NOT_FOUND.to_string(),
        })
        .filter(|c| band.admits(c.score))
        .collect();

    survivors.sort_by(|a, b| by_score_desc(a.score, b.score));

    for row in 0..coverage.row_count() {
        let tokens = extract(coverage.cell(row, cov_cols.candidate), ExtractionMode::Strict);
        if tokens.is_empty() {
            continue;
        }
        let verdict = coverage.cell(row, cov_cols.verdict).display();
        for token in &tokens {
            for candidate in survivors
                .iter_mut()
                .filter(|c| c.designators.contains(token.as_str()))
            {
                candidate.verdict = verdict.clone();
            }
        }
    }

    tracing::debug!(
        band = %band,
        rows = fmeca.row_count(),
        kept = survivors.len(),
        "filtered FMECA rows"
    );

    Ok(survivors
        .into_iter()
        .map(|c| FmecaRecord {
            id: fmeca.cell(c.row, cols.id).display(),
            component: fmeca.cell(c.row, cols.component).display(),
            reference_designator: c.designators,
            rpn: c.score.map_or_else(|| "-".to_string(), format_number),
            atm_coverage: c.verdict,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmeca(rows: &[&[&str]]) -> Table {
        Table::from_strings(&["ID", "Component", "Reference Designator", "RPN"], rows)
    }

    fn coverage(rows: &[&[&str]]) -> Table {
        Table::from_strings(&["CRD", "Result"], rows)
    }

    #[test]
    fn test_band_from_selector() {
        assert_eq!(RiskBand::from_selector("red"), RiskBand::Red);
        assert_eq!(RiskBand::from_selector(" Yellow "), RiskBand::Yellow);
        assert_eq!(RiskBand::from_selector("purple"), RiskBand::All);
        assert_eq!(RiskBand::from_selector(""), RiskBand::All);
    }

    #[test]
    fn test_bands_partition_scores() {
        let bands = [
            RiskBand::Red,
            RiskBand::Orange,
            RiskBand::Yellow,
            RiskBand::Green,
        ];
        for score in [-5.0, 0.0, 49.9, 50.0, 59.99, 60.0, 69.5, 70.0, 71.0, 500.0] {
            let hits = bands.iter().filter(|b| b.admits(Some(score))).count();
            assert_eq!(hits, 1, "score {} should fall in exactly one band", score);
            assert!(RiskBand::All.admits(Some(score)));
        }
        assert!(bands.iter().all(|b| !b.admits(None)));
        assert!(RiskBand::All.admits(None));
    }

    #[test]
    fn test_red_filter_sorted_descending() {
        let fm = fmeca(&[
            &["1", "Res", "R1", "45"],
            &["2", "Res", "R2", "70"],
            &["3", "Res", "R3", "71"],
            &["4", "Res", "R4", "bad"],
        ]);
        let cov = coverage(&[&["R9", "Pass"]]);

        let records = filter_and_enrich(&fm, &cov, RiskBand::Red).unwrap();
        let rpns: Vec<&str> = records.iter().map(|r| r.rpn.as_str()).collect();
        assert_eq!(rpns, ["71", "70"]);
        assert_eq!(records[0].id, "3");
    }

    #[test]
    fn test_missing_scores_sort_last() {
        let fm = fmeca(&[
            &["1", "A", "R1", "n/a"],
            &["2", "B", "R2", "10"],
            &["3", "C", "R3", ""],
            &["4", "D", "R4", "90"],
        ]);
        let cov = coverage(&[&["R9", "Pass"]]);

        let records = filter_and_enrich(&fm, &cov, RiskBand::All).unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["4", "2", "1", "3"]);
        assert_eq!(records[2].rpn, "-");
    }

    #[test]
    fn test_enrichment_substring_match() {
        let fm = fmeca(&[
            &["1", "Cap", "c22a, c23", "65"],
            &["2", "Res", "R101", "55"],
        ]);
        let cov = coverage(&[&["C22", "Pass"]]);

        let records = filter_and_enrich(&fm, &cov, RiskBand::All).unwrap();
        assert_eq!(records[0].reference_designator, "C22A, C23");
        assert_eq!(records[0].atm_coverage, "Pass");
        assert_eq!(records[1].atm_coverage, NOT_FOUND);
    }

    #[test]
    fn test_later_coverage_row_overwrites() {
        let fm = fmeca(&[&["1", "Res", "R101 R102", "80"]]);
        let cov = coverage(&[&["R101", "Pass"], &["R102", "Fail"]]);

        let records = filter_and_enrich(&fm, &cov, RiskBand::All).unwrap();
        assert_eq!(records[0].atm_coverage, "Fail");
    }

    #[test]
    fn test_non_numeric_score_still_enriched() {
        let fm = fmeca(&[&["1", "Res", "R5", "TBD"]]);
        let cov = coverage(&[&["R5", "Pass"]]);

        let records = filter_and_enrich(&fm, &cov, RiskBand::All).unwrap();
        assert_eq!(records[0].atm_coverage, "Pass");
        assert!(filter_and_enrich(&fm, &cov, RiskBand::Green)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_empty_tables_report_no_data() {
        let fm = fmeca(&[]);
        let cov = coverage(&[&["R1", "Pass"]]);
        assert_eq!(
            filter_and_enrich(&fm, &cov, RiskBand::All).unwrap_err(),
            AnalysisError::NoData(TableKind::Fmeca)
        );

        let fm = fmeca(&[&["1", "Res", "R1", "10"]]);
        assert_eq!(
            filter_and_enrich(&fm, &coverage(&[]), RiskBand::All).unwrap_err(),
            AnalysisError::NoData(TableKind::Coverage)
        );
    }

    #[test]
    fn test_unresolvable_columns() {
        let fm = Table::from_strings(&["Part", "Score"], &[&["R1", "10"]]);
        let cov = coverage(&[&["R1", "Pass"]]);
        assert!(matches!(
            filter_and_enrich(&fm, &cov, RiskBand::All),
            Err(AnalysisError::UnresolvedColumns {
                kind: TableKind::Fmeca,
                ..
            })
        ));
    }

    #[test]
    fn test_record_json_keys() {
        let record = FmecaRecord {
            id: "1".into(),
            component: "Res".into(),
            reference_designator: "R1".into(),
            rpn: "70".into(),
            atm_coverage: "Pass".into(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["Reference_Designator"], "R1");
        assert_eq!(json["ATM_Coverage"], "Pass");
    }
}
