//! RepoSync domain core.
//!
//! Pure logic shared by every other crate: the rule set, the workbook
//! reader, the validation engine, the checkout lock state machine, the
//! status resolver and the storage seam. Nothing in here touches the
//! filesystem or a clock it was not handed.

pub mod error;
pub mod hashing;
pub mod lock;
pub mod naming;
pub mod rule_set;
pub mod status;
pub mod storage;
pub mod types;
pub mod upload;
pub mod validation;
pub mod workbook;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
