//! Workbook validation engine.
//!
//! Provides the rule categories, the result types and a stateless engine
//! that parses workbook bytes and runs every configured rule, all without
//! storage or database dependencies.

pub mod engine;
pub mod result;
pub mod rules;

pub use engine::ValidationEngine;
pub use result::{RangeLimit, ValidationError, ValidationResult};
pub use rules::ValidationRule;
