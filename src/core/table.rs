//! Tabular documents decoded from uploaded sheets
//!
//! A [`Table`] is what the decoder hands to the store and what the analysis
//! pipelines read back: an ordered list of column names plus positional rows.

use std::io::Read;

use miette::{IntoDiagnostic, Result};
use serde::{Deserialize, Serialize};

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Empty,
}

impl CellValue {
    /// Build a cell from raw sheet text
    ///
    /// Only plain decimal literals become numbers, so codes like `1E5` or
    /// `0x10` stay text.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        if is_decimal_literal(trimmed) {
            if let Ok(n) = trimmed.parse::<f64>() {
                return CellValue::Number(n);
            }
        }
        CellValue::Text(raw.to_string())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// Display string used in reports
    pub fn display(&self) -> String {
        match self {
            CellValue::Number(n) => format_number(*n),
            CellValue::Text(s) => s.clone(),
            CellValue::Empty => String::new(),
        }
    }

    /// Numeric coercion; anything that does not parse is treated as missing
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            CellValue::Empty => None,
        };
        value.filter(|v| !v.is_nan())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// Format a number the way a spreadsheet shows it: whole numbers without a
/// trailing `.0`
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

fn is_decimal_literal(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    let mut parts = digits.splitn(2, '.');
    let int_part = parts.next().unwrap_or("");
    let frac_part = parts.next();

    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    match frac_part {
        None => true,
        Some(f) => !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()),
    }
}

static EMPTY_CELL: CellValue = CellValue::Empty;

/// A decoded sheet: named columns and positional rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { columns, rows }
    }

    /// Build a table from string literals, mostly for tests and fixtures
    pub fn from_strings(columns: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| CellValue::from_raw(c)).collect())
                .collect(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// True when the table has no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at (row, col); short rows read as empty past their end
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }

    /// All cells of one column, in row order
    pub fn column(&self, col: usize) -> impl Iterator<Item = &CellValue> + '_ {
        (0..self.rows.len()).map(move |row| self.cell(row, col))
    }

    /// Fill blank cells from the nearest non-blank cell above them
    ///
    /// Sheets with merged cells only carry the value in the first row of the
    /// merged range.
    pub fn forward_fill(&mut self) {
        let mut last: Vec<Option<CellValue>> = vec![None; self.columns.len()];
        for row in &mut self.rows {
            if row.len() < last.len() {
                row.resize(last.len(), CellValue::Empty);
            }
            for (col, cell) in row.iter_mut().enumerate().take(last.len()) {
                if cell.is_empty() {
                    if let Some(prev) = &last[col] {
                        *cell = prev.clone();
                    }
                } else {
                    last[col] = Some(cell.clone());
                }
            }
        }
    }
}

/// Decode delimited text (CSV/TSV) into a table; the first record is the header
pub fn decode_delimited<R: Read>(reader: R, delimiter: u8) -> Result<Table> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let columns: Vec<String> = rdr
        .headers()
        .into_diagnostic()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        let record = record
            .map_err(|e| miette::miette!("Parse error at row {}: {}", idx + 2, e))?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        rows.push(record.iter().map(CellValue::from_raw).collect());
    }

    Ok(Table { columns, rows })
}
