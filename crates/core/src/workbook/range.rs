//! `"Sheet!Range"` specifications used by data validations.
//!
//! Accepted range forms: a single cell (`B2`), a rectangle (`A1:C10`,
//! corners in any order), whole columns (`B:B`, `B:D`) and whole rows
//! (`2:2`, `2:5`). Letters are case-insensitive.

use std::sync::LazyLock;

use regex::Regex;

use super::column_index;

static CELL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$?([A-Za-z]{1,3})\$?([0-9]+)$").expect("valid regex"));
static COLUMN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$?([A-Za-z]{1,3})$").expect("valid regex"));
static ROW_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\$?([0-9]+)$").expect("valid regex"));

/// Why a range specification could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeSpecError {
    #[error("expected exactly one '!' separating sheet and range")]
    MissingSheetSeparator,

    #[error("sheet name is empty")]
    EmptySheetName,

    #[error("invalid cell range '{0}'")]
    InvalidRange(String),
}

/// Inclusive, zero-based rectangle of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub first_row: u32,
    pub last_row: u32,
    pub first_col: u32,
    pub last_col: u32,
}

impl CellRange {
    fn spanning(a: (u32, u32), b: (u32, u32)) -> Self {
        Self {
            first_row: a.0.min(b.0),
            last_row: a.0.max(b.0),
            first_col: a.1.min(b.1),
            last_col: a.1.max(b.1),
        }
    }
}

/// A parsed `"Sheet!Range"` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSpec {
    pub sheet: String,
    pub range: CellRange,
}

impl RangeSpec {
    pub fn parse(spec: &str) -> Result<Self, RangeSpecError> {
        let mut parts = spec.split('!');
        let (sheet, range) = match (parts.next(), parts.next(), parts.next()) {
            (Some(sheet), Some(range), None) => (sheet, range),
            _ => return Err(RangeSpecError::MissingSheetSeparator),
        };
        if sheet.is_empty() {
            return Err(RangeSpecError::EmptySheetName);
        }
        let range = parse_range(range.trim())
            .ok_or_else(|| RangeSpecError::InvalidRange(range.to_string()))?;
        Ok(Self {
            sheet: sheet.to_string(),
            range,
        })
    }
}

fn parse_range(text: &str) -> Option<CellRange> {
    match text.split_once(':') {
        None => {
            let cell = parse_cell(text)?;
            Some(CellRange::spanning(cell, cell))
        }
        Some((start, end)) => {
            if let (Some(a), Some(b)) = (parse_cell(start), parse_cell(end)) {
                return Some(CellRange::spanning(a, b));
            }
            if let (Some(a), Some(b)) = (parse_column(start), parse_column(end)) {
                return Some(CellRange {
                    first_row: 0,
                    last_row: u32::MAX,
                    first_col: a.min(b),
                    last_col: a.max(b),
                });
            }
            if let (Some(a), Some(b)) = (parse_row(start), parse_row(end)) {
                return Some(CellRange {
                    first_row: a.min(b),
                    last_row: a.max(b),
                    first_col: 0,
                    last_col: u32::MAX,
                });
            }
            None
        }
    }
}

/// `B12` -> `(11, 1)`.
fn parse_cell(text: &str) -> Option<(u32, u32)> {
    let caps = CELL_RE.captures(text)?;
    let col = column_index(&caps[1])?;
    let row = parse_row_number(&caps[2])?;
    Some((row, col))
}

fn parse_column(text: &str) -> Option<u32> {
    let caps = COLUMN_RE.captures(text)?;
    column_index(&caps[1])
}

fn parse_row(text: &str) -> Option<u32> {
    let caps = ROW_RE.captures(text)?;
    parse_row_number(&caps[1])
}

/// One-based row text -> zero-based index. Row 0 does not exist.
fn parse_row_number(text: &str) -> Option<u32> {
    text.parse::<u32>().ok()?.checked_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn single_column() {
        let spec = RangeSpec::parse("Data!B:B").unwrap();
        assert_eq!(spec.sheet, "Data");
        assert_eq!(spec.range.first_col, 1);
        assert_eq!(spec.range.last_col, 1);
        assert_eq!(spec.range.first_row, 0);
        assert_eq!(spec.range.last_row, u32::MAX);
    }

    #[test]
    fn multi_letter_columns() {
        let spec = RangeSpec::parse("Data!AA:AC").unwrap();
        assert_eq!((spec.range.first_col, spec.range.last_col), (26, 28));
    }

    #[test]
    fn single_cell() {
        let spec = RangeSpec::parse("Inputs!C7").unwrap();
        assert_eq!(
            spec.range,
            CellRange {
                first_row: 6,
                last_row: 6,
                first_col: 2,
                last_col: 2
            }
        );
    }

    #[test]
    fn rectangle_is_normalised() {
        let spec = RangeSpec::parse("Data!C10:a1").unwrap();
        assert_eq!(
            spec.range,
            CellRange {
                first_row: 0,
                last_row: 9,
                first_col: 0,
                last_col: 2
            }
        );
    }

    #[test]
    fn absolute_markers_are_accepted() {
        let spec = RangeSpec::parse("Data!$B$2:$B$9").unwrap();
        assert_eq!((spec.range.first_row, spec.range.last_row), (1, 8));
    }

    #[test]
    fn whole_rows() {
        let spec = RangeSpec::parse("Data!2:4").unwrap();
        assert_eq!((spec.range.first_row, spec.range.last_row), (1, 3));
        assert_eq!(spec.range.last_col, u32::MAX);
    }

    #[test]
    fn sheet_names_may_contain_spaces() {
        let spec = RangeSpec::parse("Q1 Budget!D:D").unwrap();
        assert_eq!(spec.sheet, "Q1 Budget");
    }

    #[test]
    fn missing_separator_is_malformed() {
        assert_matches!(
            RangeSpec::parse("B:B"),
            Err(RangeSpecError::MissingSheetSeparator)
        );
        assert_matches!(
            RangeSpec::parse("A!B!C"),
            Err(RangeSpecError::MissingSheetSeparator)
        );
    }

    #[test]
    fn empty_sheet_is_malformed() {
        assert_matches!(RangeSpec::parse("!B:B"), Err(RangeSpecError::EmptySheetName));
    }

    #[test]
    fn garbage_ranges_are_malformed() {
        for bad in ["Data!", "Data!B", "Data!B:", "Data!1B", "Data!A0", "Data!B:3", "Data!A1:B"] {
            assert_matches!(
                RangeSpec::parse(bad),
                Err(RangeSpecError::InvalidRange(_)),
                "{bad} should be rejected"
            );
        }
    }
}
