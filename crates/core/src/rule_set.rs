//! Rule set configuration.
//!
//! Declarative only: which checks run and with what parameters. Stored as
//! JSON on a collection (and optionally overridden per document). Mapping
//! keys keep their configured order so reported errors are deterministic.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The checks configured for a document.
///
/// Every key is optional; an absent key means the rule category does not
/// run. The circular-reference heuristic is not configurable and always
/// runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_sheets: Option<Vec<String>>,

    /// Sheet name -> header names that must appear in the sheet's first row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_columns: Option<IndexMap<String, Vec<String>>>,

    /// Sheets whose formulas are scanned for error tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula_sheets: Option<Vec<String>>,

    /// `"Sheet!Range"` -> rule applied to every numeric cell in the range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_validations: Option<IndexMap<String, DataValidation>>,
}

/// A rule attached to a `data_validations` range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DataValidation {
    /// Inclusive numeric bounds; each side is optional and checked on its own.
    Range {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    /// Any other `type` value. Accepted so stored configuration keeps
    /// loading, but it checks nothing.
    #[serde(other)]
    Unsupported,
}

impl RuleSet {
    /// Parse a rule set from its stored JSON form.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, CoreError> {
        serde_json::from_value(value.clone())
            .map_err(|e| CoreError::Validation(format!("Invalid validation rules: {e}")))
    }

    /// Parse a rule set from JSON text (files, CLI arguments).
    pub fn from_json_str(text: &str) -> Result<Self, CoreError> {
        serde_json::from_str(text)
            .map_err(|e| CoreError::Validation(format!("Invalid validation rules: {e}")))
    }

    pub fn to_json(&self) -> serde_json::Value {
        // A struct of strings, numbers and maps with string keys always serializes.
        serde_json::to_value(self).unwrap_or_default()
    }

    /// `true` when no configurable check is present.
    pub fn is_empty(&self) -> bool {
        self.required_sheets.is_none()
            && self.required_columns.is_none()
            && self.formula_sheets.is_none()
            && self.data_validations.is_none()
    }
}
