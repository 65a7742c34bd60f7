//! Rule execution against uploaded workbook content.

use crate::rule_set::RuleSet;
use crate::workbook::{parse_workbook, Workbook};

use super::result::{ValidationError, ValidationResult};
use super::rules::ValidationRule;

/// Runs a [`RuleSet`] against workbook bytes.
///
/// Stateless and CPU-bound; callers on an async runtime should move it onto
/// a blocking thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationEngine;

impl ValidationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Parse `content` and apply `rules`.
    ///
    /// Unparseable content yields a single failure and no rule runs. Never
    /// returns an error: every problem is a finding in the result.
    pub fn validate(&self, content: &[u8], rules: &RuleSet) -> ValidationResult {
        match parse_workbook(content) {
            Ok(workbook) => self.validate_workbook(&workbook, rules),
            Err(e) => ValidationResult::from_errors(&[ValidationError::ParseFailure(e.0)]),
        }
    }

    /// Apply `rules` to an already parsed workbook.
    pub fn validate_workbook(&self, workbook: &Workbook, rules: &RuleSet) -> ValidationResult {
        ValidationResult::from_errors(&self.findings(workbook, rules))
    }

    /// All findings in rule order.
    pub fn findings(&self, workbook: &Workbook, rules: &RuleSet) -> Vec<ValidationError> {
        ValidationRule::plan(rules)
            .iter()
            .flat_map(|rule| rule.apply(workbook))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{SheetFixture, WorkbookFixture};
    use serde_json::json;

    fn rules(value: serde_json::Value) -> RuleSet {
        RuleSet::from_json(&value).unwrap()
    }

    fn data_sheet() -> SheetFixture {
        SheetFixture::new("Data")
            .header(&["ID", "Value"])
            .number("A2", 1.0)
            .number("B2", 150.0)
            .number("A3", 2.0)
            .number("B3", 50.0)
    }

    #[test]
    fn empty_rule_set_passes_clean_workbook() {
        let bytes = WorkbookFixture::new().sheet(data_sheet()).build();
        let result = ValidationEngine::new().validate(&bytes, &RuleSet::default());
        assert_eq!(result, ValidationResult::passed());
    }

    #[test]
    fn range_violation_fails_with_cell_reference() {
        let bytes = WorkbookFixture::new().sheet(data_sheet()).build();
        let result = ValidationEngine.validate(
            &bytes,
            &rules(json!({
                "required_sheets": ["Data"],
                "required_columns": {"Data": ["ID", "Value"]},
                "data_validations": {"Data!B:B": {"type": "range", "min": 0, "max": 100}}
            })),
        );
        assert!(!result.passed);
        assert_eq!(result.errors, ["Value 150 in Data!B2 is above maximum 100"]);
    }

    #[test]
    fn missing_sheet_is_reported_and_dependent_rules_skip() {
        let bytes = WorkbookFixture::new().sheet(data_sheet()).build();
        let result = ValidationEngine.validate(
            &bytes,
            &rules(json!({
                "required_sheets": ["Data", "Summary"],
                "required_columns": {"Summary": ["Total"]},
                "formula_sheets": ["Summary"],
                "data_validations": {"Summary!A:A": {"type": "range", "min": 0}}
            })),
        );
        assert_eq!(result.errors, ["Missing required sheet: Summary"]);
    }

    #[test]
    fn errors_accumulate_in_rule_order() {
        let bytes = WorkbookFixture::new()
            .sheet(data_sheet())
            .sheet(
                SheetFixture::new("Calc")
                    .formula("A1", "#REF!*2")
                    .formula("B1", "B1+1"),
            )
            .build();
        let result = ValidationEngine.validate(
            &bytes,
            &rules(json!({
                "data_validations": {
                    "Data!B:B": {"type": "range", "max": 100},
                    "Data": {"type": "range", "max": 100}
                },
                "formula_sheets": ["Calc"],
                "required_columns": {"Data": ["Date"]},
                "required_sheets": ["Notes"]
            })),
        );
        assert!(!result.passed);
        assert_eq!(result.errors.len(), 6);
        assert_eq!(result.errors[0], "Missing required sheet: Notes");
        assert_eq!(result.errors[1], "Missing required column 'Date' in sheet 'Data'");
        assert_eq!(result.errors[2], "Broken formula in Calc!A1: =#REF!*2");
        assert_eq!(result.errors[3], "Value 150 in Data!B2 is above maximum 100");
        assert!(result.errors[4].starts_with("Error validating range Data:"));
        assert_eq!(result.errors[5], "Possible circular reference in Calc!B1");
    }

    #[test]
    fn unparseable_content_is_a_single_failure() {
        let result = ValidationEngine.validate(
            b"PK\x03\x04 truncated",
            &rules(json!({"required_sheets": ["Data"]})),
        );
        assert!(!result.passed);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Failed to open Excel file: "));
    }

    #[test]
    fn empty_sheet_with_required_columns() {
        let bytes = WorkbookFixture::new().sheet(SheetFixture::new("Data")).build();
        let result = ValidationEngine.validate(
            &bytes,
            &rules(json!({"required_columns": {"Data": ["ID", "Value"]}})),
        );
        assert_eq!(result.errors, ["Sheet 'Data' is empty"]);
    }

    #[test]
    fn circular_reference_runs_without_configuration() {
        let bytes = WorkbookFixture::new()
            .sheet(SheetFixture::new("Sheet1").number("A1", 1.0).formula("C5", "SUM(A1:C5)"))
            .build();
        let result = ValidationEngine.validate(&bytes, &RuleSet::default());
        assert_eq!(result.errors, ["Possible circular reference in Sheet1!C5"]);
    }

    #[test]
    fn validation_is_deterministic() {
        let bytes = WorkbookFixture::new().sheet(data_sheet()).build();
        let rule_set = rules(json!({"data_validations": {"Data!A1:B3": {"type": "range", "min": 10}}}));
        let first = ValidationEngine.validate(&bytes, &rule_set);
        let second = ValidationEngine.validate(&bytes, &rule_set);
        assert_eq!(first, second);
        assert_eq!(
            first.errors,
            [
                "Value 1 in Data!A2 is below minimum 10",
                "Value 2 in Data!A3 is below minimum 10"
            ]
        );
    }
}
