//! Spreadsheet bytes -> [`Workbook`].
//!
//! The container format (xlsx, xlsm, xls, ods) is detected from the bytes.
//! Values and formulas are read per sheet and merged by absolute position.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};

use super::{CellPos, CellValue, Sheet, Workbook};

/// The content could not be read as a workbook.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct WorkbookParseError(pub String);

/// Parse workbook bytes into the validation model.
pub fn parse_workbook(content: &[u8]) -> Result<Workbook, WorkbookParseError> {
    let mut source = open_workbook_auto_from_rs(Cursor::new(content))
        .map_err(|e| WorkbookParseError(e.to_string()))?;

    let mut workbook = Workbook::new();
    for name in source.sheet_names() {
        let values = source
            .worksheet_range(&name)
            .map_err(|e| WorkbookParseError(format!("sheet '{name}': {e}")))?;
        let formulas = source
            .worksheet_formula(&name)
            .map_err(|e| WorkbookParseError(format!("sheet '{name}' formulas: {e}")))?;

        let mut sheet = Sheet::new(name);
        load_values(&mut sheet, &values);
        load_formulas(&mut sheet, &formulas);
        workbook.push_sheet(sheet);
    }
    Ok(workbook)
}

fn load_values(sheet: &mut Sheet, range: &Range<Data>) {
    let Some((start_row, start_col)) = range.start() else {
        return;
    };
    for (row, col, data) in range.used_cells() {
        let value = match data {
            Data::Empty => continue,
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::Error(e) => CellValue::Error(e.to_string()),
            // Dates and durations are not numeric for range checks.
            other => CellValue::Text(other.to_string()),
        };
        sheet.set_value(absolute(start_row, start_col, row, col), value);
    }
}

fn load_formulas(sheet: &mut Sheet, range: &Range<String>) {
    let Some((start_row, start_col)) = range.start() else {
        return;
    };
    for (row, col, formula) in range.used_cells() {
        if formula.is_empty() {
            continue;
        }
        sheet.set_formula(absolute(start_row, start_col, row, col), formula);
    }
}

fn absolute(start_row: u32, start_col: u32, row: usize, col: usize) -> CellPos {
    CellPos::new(start_row + row as u32, start_col + col as u32)
}
