//! Reference-designator extraction from free-text cells
//!
//! A designator is 1-10 letters, 1-4 digits, then an optional letter and an
//! optional digit (`R101`, `C22A`, `U7B1`). Text is upper-cased and trimmed
//! before matching, and every pass is an independent regex whose matches are
//! unioned into one set.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::CellValue;

/// Loose pass 1: short designators wrapped in parentheses
static LOOSE_PARENTHESIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([A-Z]{1,3}\d{1,4}[A-Z]?\d?)\)").expect("valid pattern"));

/// Loose pass 2: standalone words
static LOOSE_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z]{1,10}\d{1,4}[A-Z]?\d?)\b").expect("valid pattern"));

/// Loose pass 3: anywhere, run over the text with whitespace removed
static LOOSE_ANYWHERE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]{1,10}\d{1,4}[A-Z]?\d?").expect("valid pattern"));

static STRICT_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z]{1,10}\d{1,4}(?:[A-Z]\d?)?)\b").expect("valid pattern")
});

static STRICT_PARENTHESIZED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(([A-Z]{1,10}\d{1,4}(?:[A-Z]\d?)?)\)").expect("valid pattern")
});

/// Which pattern set to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    /// FMECA designator text: three overlapping passes
    Loose,
    /// Coverage candidate text: word and parenthesized passes
    Strict,
}

fn normalize(text: &str) -> String {
    text.to_uppercase().trim().to_string()
}

fn captures_into(re: &Regex, text: &str, out: &mut BTreeSet<String>) {
    out.extend(
        re.captures_iter(text)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().to_string()),
    );
}

/// Designators in FMECA-style text
pub fn extract_loose(text: &str) -> BTreeSet<String> {
    let text = normalize(text);
    let mut found = BTreeSet::new();
    if text.is_empty() {
        return found;
    }

    captures_into(&LOOSE_PARENTHESIZED, &text, &mut found);
    captures_into(&LOOSE_WORD, &text, &mut found);

    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    found.extend(
        LOOSE_ANYWHERE
            .find_iter(&compact)
            .map(|m| m.as_str().to_string()),
    );

    found
}

/// Designators in coverage-style text
pub fn extract_strict(text: &str) -> BTreeSet<String> {
    let text = normalize(text);
    let mut found = BTreeSet::new();
    if text.is_empty() {
        return found;
    }

    captures_into(&STRICT_WORD, &text, &mut found);
    captures_into(&STRICT_PARENTHESIZED, &text, &mut found);
    found
}

/// Extract from a table cell; empty cells yield nothing
pub fn extract(cell: &CellValue, mode: ExtractionMode) -> BTreeSet<String> {
    if cell.is_empty() {
        return BTreeSet::new();
    }
    let text = cell.display();
    match mode {
        ExtractionMode::Loose => extract_loose(&text),
        ExtractionMode::Strict => extract_strict(&text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(extract_loose("").is_empty());
        assert!(extract_loose("   ").is_empty());
        assert!(extract_strict("").is_empty());
        assert!(extract(&CellValue::Empty, ExtractionMode::Loose).is_empty());
    }

    #[test]
    fn test_strict_multiple_with_free_text() {
        assert_eq!(
            extract_strict("Resistors: r101, R102; cap (C22A) test"),
            set(&["R101", "R102", "C22A"])
        );
    }

    #[test]
    fn test_strict_ignores_plain_words() {
        assert!(extract_strict("PASS / NOT TESTED").is_empty());
    }

    #[test]
    fn test_loose_parenthesized_and_words() {
        let found = extract_loose("Bypass cap (C5) near U7B1");
        assert!(found.contains("C5"));
        assert!(found.contains("U7B1"));
    }

    #[test]
    fn test_loose_rejoins_split_designators() {
        let found = extract_loose("R 101");
        assert!(found.contains("R101"));
        assert!(!extract_strict("R 101").contains("R101"));
    }

    #[test]
    fn test_extraction_is_idempotent_on_tokens() {
        for token in ["R101", "C22A", "U7B1", "IC12"] {
            assert_eq!(extract_loose(token), set(&[token]));
            assert_eq!(extract_strict(token), set(&[token]));
        }

        for text in ["R101, C22A (U3)", "Q1 Q2 and D10"] {
            for token in extract_strict(text) {
                assert_eq!(extract_strict(&token), set(&[token.as_str()]));
            }
        }
    }

    #[test]
    fn test_numeric_cell_has_no_designators() {
        assert!(extract(&CellValue::Number(101.0), ExtractionMode::Strict).is_empty());
        assert_eq!(
            extract(&CellValue::from("r5"), ExtractionMode::Strict),
            set(&["R5"])
        );
    }
}
