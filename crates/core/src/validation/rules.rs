//! The five rule categories.
//!
//! Each variant applies to a parsed [`Workbook`] and returns its findings
//! in sheet-declaration, then row-major, order. [`ValidationRule::plan`]
//! turns a [`RuleSet`] into the fixed execution order.

use indexmap::IndexMap;

use crate::rule_set::{DataValidation, RuleSet};
use crate::workbook::{RangeSpec, Workbook};

use super::result::{RangeLimit, ValidationError};

/// Formula text containing any of these is reported as broken.
pub const BROKEN_FORMULA_TOKENS: &[&str] = &["#REF!", "#NAME?", "#VALUE!", "#DIV/0!", "#N/A"];

/// One configured check.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationRule {
    RequiredSheets(Vec<String>),
    RequiredColumns(IndexMap<String, Vec<String>>),
    FormulaIntegrity(Vec<String>),
    DataRange(IndexMap<String, DataValidation>),
    /// Always on. A formula mentioning its own coordinate is flagged. This is
    /// a textual match: `A1` inside `A10` is a false positive and indirect
    /// cycles are not seen.
    CircularReference,
}

impl ValidationRule {
    /// Rules configured in `rules`, in execution order, followed by the
    /// circular-reference heuristic.
    pub fn plan(rules: &RuleSet) -> Vec<ValidationRule> {
        let mut plan = Vec::with_capacity(5);
        if let Some(sheets) = &rules.required_sheets {
            plan.push(Self::RequiredSheets(sheets.clone()));
        }
        if let Some(columns) = &rules.required_columns {
            plan.push(Self::RequiredColumns(columns.clone()));
        }
        if let Some(sheets) = &rules.formula_sheets {
            plan.push(Self::FormulaIntegrity(sheets.clone()));
        }
        if let Some(validations) = &rules.data_validations {
            plan.push(Self::DataRange(validations.clone()));
        }
        plan.push(Self::CircularReference);
        plan
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::RequiredSheets(_) => "required_sheets",
            Self::RequiredColumns(_) => "required_columns",
            Self::FormulaIntegrity(_) => "formula_sheets",
            Self::DataRange(_) => "data_validations",
            Self::CircularReference => "circular_references",
        }
    }

    pub fn apply(&self, workbook: &Workbook) -> Vec<ValidationError> {
        match self {
            Self::RequiredSheets(sheets) => check_required_sheets(workbook, sheets),
            Self::RequiredColumns(columns) => check_required_columns(workbook, columns),
            Self::FormulaIntegrity(sheets) => check_formulas(workbook, sheets),
            Self::DataRange(validations) => check_data_ranges(workbook, validations),
            Self::CircularReference => check_circular_references(workbook),
        }
    }
}

fn check_required_sheets(workbook: &Workbook, sheets: &[String]) -> Vec<ValidationError> {
    sheets
        .iter()
        .filter(|name| !workbook.has_sheet(name))
        .map(|name| ValidationError::MissingSheet {
            sheet: name.clone(),
        })
        .collect()
}

fn check_required_columns(
    workbook: &Workbook,
    columns: &IndexMap<String, Vec<String>>,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for (sheet_name, required) in columns {
        // Absent sheets are the business of `required_sheets`.
        let Some(sheet) = workbook.sheet(sheet_name) else {
            continue;
        };
        if sheet.is_empty() {
            errors.push(ValidationError::EmptySheet {
                sheet: sheet_name.clone(),
            });
            continue;
        }

        let headers: Vec<String> = sheet
            .row(0)
            .filter_map(|(_, cell)| cell.value.header_text())
            .collect();
        for column in required {
            if !headers.iter().any(|h| h == column) {
                errors.push(ValidationError::MissingColumn {
                    sheet: sheet_name.clone(),
                    column: column.clone(),
                });
            }
        }
    }
    errors
}

fn check_formulas(workbook: &Workbook, sheets: &[String]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for sheet_name in sheets {
        let Some(sheet) = workbook.sheet(sheet_name) else {
            continue;
        };
        for (pos, formula) in sheet.formula_cells() {
            if BROKEN_FORMULA_TOKENS.iter().any(|token| formula.contains(token)) {
                errors.push(ValidationError::BrokenFormula {
                    sheet: sheet_name.clone(),
                    cell: pos.coordinate(),
                    formula: formula.to_string(),
                });
            }
        }
    }
    errors
}

fn check_data_ranges(
    workbook: &Workbook,
    validations: &IndexMap<String, DataValidation>,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for (spec_text, validation) in validations {
        let spec = match RangeSpec::parse(spec_text) {
            Ok(spec) => spec,
            Err(e) => {
                errors.push(ValidationError::MalformedRangeSpec {
                    spec: spec_text.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };
        let Some(sheet) = workbook.sheet(&spec.sheet) else {
            continue;
        };
        let DataValidation::Range { min, max } = validation else {
            continue;
        };

        for (pos, cell) in sheet.cells_in(spec.range) {
            let Some(value) = cell.value.as_number() else {
                continue;
            };
            if let Some(min) = *min {
                if value < min {
                    errors.push(ValidationError::OutOfRange {
                        sheet: spec.sheet.clone(),
                        cell: pos.coordinate(),
                        value,
                        limit: RangeLimit::Min(min),
                    });
                }
            }
            if let Some(max) = *max {
                if value > max {
                    errors.push(ValidationError::OutOfRange {
                        sheet: spec.sheet.clone(),
                        cell: pos.coordinate(),
                        value,
                        limit: RangeLimit::Max(max),
                    });
                }
            }
        }
    }
    errors
}

fn check_circular_references(workbook: &Workbook) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for sheet in workbook.sheets() {
        for (pos, formula) in sheet.formula_cells() {
            let coordinate = pos.coordinate();
            if formula.to_uppercase().contains(&coordinate) {
                errors.push(ValidationError::CircularReferenceSuspected {
                    sheet: sheet.name().to_string(),
                    cell: coordinate,
                });
            }
        }
    }
    errors
}
