//! Document entity model and DTOs.

use reposync_core::lock::LockState;
use reposync_core::rule_set::RuleSet;
use reposync_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::types::Json;
use sqlx::{FromRow, Row};

/// A version-controlled spreadsheet inside a collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: DbId,
    pub collection_id: DbId,
    /// Sanitized filename from the first upload.
    pub filename: String,
    /// Stored as the nullable `locked_by` / `locked_at` pair.
    pub lock: LockState,
    /// Latest version that passed validation.
    pub current_version_id: Option<DbId>,
    /// Replaces the collection rule set for this document when set.
    pub rules_override: Option<RuleSet>,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Document {
    /// Rule set to validate against: the override, else `collection_rules`.
    pub fn effective_rules<'a>(&'a self, collection_rules: &'a RuleSet) -> &'a RuleSet {
        self.rules_override.as_ref().unwrap_or(collection_rules)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Document {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let locked_by: Option<DbId> = row.try_get("locked_by")?;
        let locked_at: Option<Timestamp> = row.try_get("locked_at")?;
        let lock = match (locked_by, locked_at) {
            (Some(holder), Some(acquired_at)) => LockState::LockedBy {
                holder,
                acquired_at,
            },
            _ => LockState::Unlocked,
        };
        let rules_override = row
            .try_get::<Option<Json<RuleSet>>, _>("rules_override")?
            .map(|Json(rules)| rules);
        Ok(Self {
            id: row.try_get("id")?,
            collection_id: row.try_get("collection_id")?,
            filename: row.try_get("filename")?,
            lock,
            current_version_id: row.try_get("current_version_id")?,
            rules_override,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// DTO for creating a new document. Documents start unlocked.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDocument {
    pub collection_id: DbId,
    pub filename: String,
    pub created_by: DbId,
}
