//! Document display status.
//!
//! Derived, never stored: the lock wins; a document that never had a
//! version pass is pending; otherwise the latest version's validation
//! outcome decides.

use serde::{Deserialize, Serialize};

use crate::lock::LockState;

/// Well-known status strings, as exposed to presentation collaborators.
pub const STATUS_CHECKED_OUT: &str = "checked_out";
pub const STATUS_AVAILABLE: &str = "available";
pub const STATUS_VALIDATION_FAILED: &str = "validation_failed";
pub const STATUS_PENDING: &str = "pending";

// ---------------------------------------------------------------------------
// ValidationStatus
// ---------------------------------------------------------------------------

/// Validation lifecycle of a single version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Pending,
    Passed,
    Failed,
}

impl ValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }
}

// ---------------------------------------------------------------------------
// DocumentStatus
// ---------------------------------------------------------------------------

/// What a document list shows next to each file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    CheckedOut,
    Available,
    ValidationFailed,
    Pending,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckedOut => STATUS_CHECKED_OUT,
            Self::Available => STATUS_AVAILABLE,
            Self::ValidationFailed => STATUS_VALIDATION_FAILED,
            Self::Pending => STATUS_PENDING,
        }
    }
}

/// Resolve the display status.
///
/// `has_current` is whether the document has a current version; `latest`
/// is the validation status of its highest-numbered version (`None` when it
/// has no versions).
pub fn resolve(
    lock: &LockState,
    has_current: bool,
    latest: Option<ValidationStatus>,
) -> DocumentStatus {
    if lock.is_locked() {
        return DocumentStatus::CheckedOut;
    }
    if !has_current {
        return DocumentStatus::Pending;
    }
    match latest {
        Some(ValidationStatus::Passed) => DocumentStatus::Available,
        Some(ValidationStatus::Failed) => DocumentStatus::ValidationFailed,
        Some(ValidationStatus::Pending) | None => DocumentStatus::Pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn locked() -> LockState {
        LockState::Unlocked.acquire(1, Utc::now()).unwrap()
    }

    #[test]
    fn lock_takes_precedence() {
        for has_current in [false, true] {
            for latest in [
                None,
                Some(ValidationStatus::Pending),
                Some(ValidationStatus::Passed),
                Some(ValidationStatus::Failed),
            ] {
                assert_eq!(
                    resolve(&locked(), has_current, latest),
                    DocumentStatus::CheckedOut
                );
            }
        }
    }

    #[test]
    fn passed_latest_is_available() {
        assert_eq!(
            resolve(&LockState::Unlocked, true, Some(ValidationStatus::Passed)),
            DocumentStatus::Available
        );
    }

    #[test]
    fn failed_latest_after_a_current_version_is_validation_failed() {
        assert_eq!(
            resolve(&LockState::Unlocked, true, Some(ValidationStatus::Failed)),
            DocumentStatus::ValidationFailed
        );
    }

    #[test]
    fn never_promoted_is_pending() {
        assert_eq!(resolve(&LockState::Unlocked, false, None), DocumentStatus::Pending);
        assert_eq!(
            resolve(&LockState::Unlocked, false, Some(ValidationStatus::Failed)),
            DocumentStatus::Pending
        );
        assert_eq!(
            resolve(&LockState::Unlocked, false, Some(ValidationStatus::Pending)),
            DocumentStatus::Pending
        );
    }

    #[test]
    fn unvalidated_latest_is_pending() {
        assert_eq!(
            resolve(&LockState::Unlocked, true, Some(ValidationStatus::Pending)),
            DocumentStatus::Pending
        );
    }

    #[test]
    fn status_strings() {
        assert_eq!(DocumentStatus::CheckedOut.as_str(), "checked_out");
        assert_eq!(DocumentStatus::ValidationFailed.as_str(), "validation_failed");
        assert_eq!(
            serde_json::to_value(DocumentStatus::Available).unwrap(),
            serde_json::json!("available")
        );
        assert_eq!(ValidationStatus::Failed.as_str(), "failed");
    }
}
