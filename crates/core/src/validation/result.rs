//! Validation error and result types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single finding. Everything except [`ValidationError::ParseFailure`]
/// is accumulated; none of them stop the other rules.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Failed to open Excel file: {0}")]
    ParseFailure(String),

    #[error("Missing required sheet: {sheet}")]
    MissingSheet { sheet: String },

    #[error("Missing required column '{column}' in sheet '{sheet}'")]
    MissingColumn { sheet: String, column: String },

    #[error("Sheet '{sheet}' is empty")]
    EmptySheet { sheet: String },

    #[error("Broken formula in {sheet}!{cell}: {formula}")]
    BrokenFormula {
        sheet: String,
        cell: String,
        formula: String,
    },

    #[error("Value {value} in {sheet}!{cell} is {limit}")]
    OutOfRange {
        sheet: String,
        cell: String,
        value: f64,
        limit: RangeLimit,
    },

    #[error("Error validating range {spec}: {reason}")]
    MalformedRangeSpec { spec: String, reason: String },

    #[error("Possible circular reference in {sheet}!{cell}")]
    CircularReferenceSuspected { sheet: String, cell: String },
}

/// Which bound a value crossed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeLimit {
    Min(f64),
    Max(f64),
}

impl fmt::Display for RangeLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Min(min) => write!(f, "below minimum {min}"),
            Self::Max(max) => write!(f, "above maximum {max}"),
        }
    }
}

/// Outcome of one validation run, attached to a version exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub passed: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    /// Render accumulated findings; passes iff there are none.
    pub fn from_errors(errors: &[ValidationError]) -> Self {
        Self {
            passed: errors.is_empty(),
            errors: errors.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn passed() -> Self {
        Self {
            passed: true,
            errors: Vec::new(),
        }
    }

    /// A run that could not inspect the content at all.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            errors: vec![message.into()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_cite_sheet_and_cell() {
        let err = ValidationError::OutOfRange {
            sheet: "Data".into(),
            cell: "B2".into(),
            value: 150.0,
            limit: RangeLimit::Max(100.0),
        };
        assert_eq!(err.to_string(), "Value 150 in Data!B2 is above maximum 100");

        let err = ValidationError::OutOfRange {
            sheet: "Data".into(),
            cell: "B3".into(),
            value: -0.5,
            limit: RangeLimit::Min(0.0),
        };
        assert_eq!(err.to_string(), "Value -0.5 in Data!B3 is below minimum 0");
    }

    #[test]
    fn structural_messages() {
        assert_eq!(
            ValidationError::MissingSheet { sheet: "Data".into() }.to_string(),
            "Missing required sheet: Data"
        );
        assert_eq!(
            ValidationError::MissingColumn {
                sheet: "Data".into(),
                column: "ID".into()
            }
            .to_string(),
            "Missing required column 'ID' in sheet 'Data'"
        );
        assert_eq!(
            ValidationError::EmptySheet { sheet: "Data".into() }.to_string(),
            "Sheet 'Data' is empty"
        );
        assert_eq!(
            ValidationError::CircularReferenceSuspected {
                sheet: "Calc".into(),
                cell: "A1".into()
            }
            .to_string(),
            "Possible circular reference in Calc!A1"
        );
    }

    #[test]
    fn result_passes_only_without_errors() {
        assert!(ValidationResult::from_errors(&[]).passed);
        assert_eq!(ValidationResult::from_errors(&[]), ValidationResult::passed());

        let result =
            ValidationResult::from_errors(&[ValidationError::ParseFailure("bad zip".into())]);
        assert!(!result.passed);
        assert_eq!(result.errors, ["Failed to open Excel file: bad zip"]);
    }

    #[test]
    fn result_serializes_as_passed_and_errors() {
        let json = serde_json::to_value(ValidationResult::passed()).unwrap();
        assert_eq!(json, serde_json::json!({"passed": true, "errors": []}));
    }
}
