//! In-memory workbook model consumed by the validation rules.
//!
//! Only what structural validation needs: sheets in declaration order and,
//! per sheet, the populated cells keyed by position (row-major order), each
//! with its value and formula text.

pub mod range;
pub mod reader;

use std::collections::BTreeMap;
use std::fmt;

pub use range::{CellRange, RangeSpec, RangeSpecError};
pub use reader::{parse_workbook, WorkbookParseError};

// ---------------------------------------------------------------------------
// Cell positions
// ---------------------------------------------------------------------------

/// Zero-based cell position. Ordering is row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellPos {
    pub row: u32,
    pub col: u32,
}

impl CellPos {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// A1-style coordinate, e.g. `(0, 1)` -> `"B1"`.
    pub fn coordinate(&self) -> String {
        format!("{}{}", column_letters(self.col), self.row + 1)
    }
}

impl fmt::Display for CellPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.coordinate())
    }
}

/// Zero-based column index -> spreadsheet letters (`0 -> A`, `26 -> AA`).
pub fn column_letters(col: u32) -> String {
    let mut n = col as u64 + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push(b'A' + rem);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Spreadsheet letters -> zero-based column index. `None` for anything that
/// is not one or more ASCII letters or overflows the column space.
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    let mut n: u64 = 0;
    for b in letters.bytes() {
        if !b.is_ascii_alphabetic() {
            return None;
        }
        n = n * 26 + u64::from(b.to_ascii_uppercase() - b'A' + 1);
        if n > u64::from(u32::MAX) {
            return None;
        }
    }
    u32::try_from(n - 1).ok()
}

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

/// A cell's stored (cached) value.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    /// An error value such as `#DIV/0!`.
    Error(String),
}

impl CellValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Header text for the first row.
    ///
    /// Falsy values (empty, `""`, `0`, `FALSE`) are not headers. `TRUE`
    /// reads as `True`.
    pub fn header_text(&self) -> Option<String> {
        match self {
            Self::Empty | Self::Bool(false) => None,
            Self::Text(s) if s.is_empty() => None,
            Self::Number(n) if *n == 0.0 => None,
            Self::Text(s) => Some(s.clone()),
            Self::Number(n) => Some(n.to_string()),
            Self::Bool(true) => Some("True".to_string()),
            Self::Error(e) => Some(e.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    /// Formula text including the leading `=`, if the cell holds a formula.
    pub formula: Option<String>,
}

// ---------------------------------------------------------------------------
// Sheets and workbooks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    name: String,
    cells: BTreeMap<CellPos, Cell>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn set_value(&mut self, pos: CellPos, value: CellValue) {
        self.cells
            .entry(pos)
            .and_modify(|cell| cell.value = value.clone())
            .or_insert(Cell {
                value,
                formula: None,
            });
    }

    /// Attach formula text; a leading `=` is added when missing.
    pub fn set_formula(&mut self, pos: CellPos, formula: &str) {
        let text = if formula.starts_with('=') {
            formula.to_string()
        } else {
            format!("={formula}")
        };
        self.cells
            .entry(pos)
            .and_modify(|cell| cell.formula = Some(text.clone()))
            .or_insert(Cell {
                value: CellValue::Empty,
                formula: Some(text),
            });
    }

    pub fn cell(&self, pos: CellPos) -> Option<&Cell> {
        self.cells.get(&pos)
    }

    /// Populated cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (CellPos, &Cell)> {
        self.cells.iter().map(|(pos, cell)| (*pos, cell))
    }

    /// Cells holding a formula, row-major.
    pub fn formula_cells(&self) -> impl Iterator<Item = (CellPos, &str)> {
        self.cells
            .iter()
            .filter_map(|(pos, cell)| cell.formula.as_deref().map(|f| (*pos, f)))
    }

    /// Populated cells of one row, left to right.
    pub fn row(&self, row: u32) -> impl Iterator<Item = (CellPos, &Cell)> {
        self.cells
            .range(CellPos::new(row, 0)..=CellPos::new(row, u32::MAX))
            .map(|(pos, cell)| (*pos, cell))
    }

    /// Populated cells inside `range`, row-major.
    pub fn cells_in(&self, range: CellRange) -> impl Iterator<Item = (CellPos, &Cell)> {
        self.cells
            .range(CellPos::new(range.first_row, 0)..=CellPos::new(range.last_row, u32::MAX))
            .filter(move |(pos, _)| pos.col >= range.first_col && pos.col <= range.last_col)
            .map(|(pos, cell)| (*pos, cell))
    }
}

/// A parsed workbook: sheets in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_sheet(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(Sheet::name)
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn has_sheet(&self, name: &str) -> bool {
        self.sheet(name).is_some()
    }
}
