//! Column resolution by header name
//!
//! Spreadsheet authors name columns inconsistently, so each role is found by
//! a keyword rule over the lower-cased header. Columns are scanned in order;
//! each column is offered to the rules in rule order and claimed by the first
//! role that is still open and matches. A role therefore takes the first
//! matching column, and a column serves at most one role.
//!
//! When roles are left open and the table has at least one column per role,
//! the open roles fall back to their fixed position (rule index).

use super::AnalysisError;
use crate::core::TableKind;

/// A role and the header predicate that claims a column for it
struct Rule {
    role: &'static str,
    matches: fn(&str) -> bool,
}

fn is_id(h: &str) -> bool {
    h.contains("id")
}

fn is_component(h: &str) -> bool {
    h.contains("component")
}

fn is_designator(h: &str) -> bool {
    h.contains("reference") && h.contains("designator")
}

fn is_rpn(h: &str) -> bool {
    h.contains("rpn")
}

fn is_crd(h: &str) -> bool {
    h.contains("crd")
}

fn is_result(h: &str) -> bool {
    h.contains("result")
}

const FMECA_RULES: [Rule; 4] = [
    Rule { role: "id", matches: is_id },
    Rule { role: "component", matches: is_component },
    Rule { role: "reference designator", matches: is_designator },
    Rule { role: "rpn", matches: is_rpn },
];

const COVERAGE_RULES: [Rule; 2] = [
    Rule { role: "crd", matches: is_crd },
    Rule { role: "result", matches: is_result },
];

/// Name pass only; one slot per rule
fn match_by_name<const N: usize>(columns: &[String], rules: &[Rule; N]) -> [Option<usize>; N] {
    let mut slots = [None; N];
    for (idx, header) in columns.iter().enumerate() {
        let header = header.to_lowercase();
        if let Some(slot) = rules
            .iter()
            .enumerate()
            .find(|(i, rule)| slots[*i].is_none() && (rule.matches)(&header))
            .map(|(i, _)| i)
        {
            slots[slot] = Some(idx);
        }
    }
    slots
}

/// Name pass followed by the positional fallback
fn resolve<const N: usize>(
    columns: &[String],
    rules: &[Rule; N],
    kind: TableKind,
) -> Result<[usize; N], AnalysisError> {
    let mut slots = match_by_name(columns, rules);

    if slots.iter().any(Option::is_none) && columns.len() >= N {
        for (i, slot) in slots.iter_mut().enumerate() {
            slot.get_or_insert(i);
        }
    }

    let missing: Vec<&'static str> = rules
        .iter()
        .zip(slots.iter())
        .filter(|(_, slot)| slot.is_none())
        .map(|(rule, _)| rule.role)
        .collect();
    if !missing.is_empty() {
        return Err(AnalysisError::UnresolvedColumns { kind, missing });
    }

    let mut resolved = [0; N];
    for (out, slot) in resolved.iter_mut().zip(slots) {
        *out = slot.unwrap_or_default();
    }

    tracing::debug!(?kind, columns = ?resolved, "resolved columns");
    Ok(resolved)
}

/// Column indexes of the four FMECA roles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FmecaColumns {
    pub id: usize,
    pub component: usize,
    pub designator: usize,
    pub risk: usize,
}

impl FmecaColumns {
    pub fn resolve(columns: &[String]) -> Result<Self, AnalysisError> {
        let [id, component, designator, risk] = resolve(columns, &FMECA_RULES, TableKind::Fmeca)?;
        Ok(Self {
            id,
            component,
            designator,
            risk,
        })
    }

    /// Designator column for reconciliation
    ///
    /// Only the designator rule is consulted by name; without a match the
    /// third column is used, or the first when there are fewer than three.
    pub fn designator_only(columns: &[String]) -> Result<usize, AnalysisError> {
        let by_name = columns
            .iter()
            .position(|h| is_designator(&h.to_lowercase()));

        match by_name {
            Some(idx) => Ok(idx),
            None if columns.len() >= 3 => Ok(2),
            None if !columns.is_empty() => Ok(0),
            None => Err(AnalysisError::UnresolvedColumns {
                kind: TableKind::Fmeca,
                missing: vec!["reference designator"],
            }),
        }
    }
}

/// Column indexes of the two coverage roles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageColumns {
    pub candidate: usize,
    pub verdict: usize,
}

impl CoverageColumns {
    pub fn resolve(columns: &[String]) -> Result<Self, AnalysisError> {
        let [candidate, verdict] = resolve(columns, &COVERAGE_RULES, TableKind::Coverage)?;
        Ok(Self { candidate, verdict })
    }
}
