//! Collection entity model and DTOs.

use reposync_core::rule_set::RuleSet;
use reposync_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::types::Json;
use sqlx::{FromRow, Row};

/// A group of documents sharing one validation rule set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Collection {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub created_by: DbId,
    pub rules: RuleSet,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl<'r> FromRow<'r, SqliteRow> for Collection {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let Json(rules) = row.try_get::<Json<RuleSet>, _>("rules")?;
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            created_by: row.try_get("created_by")?,
            rules,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// DTO for creating a new collection.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCollection {
    pub name: String,
    pub description: Option<String>,
    pub created_by: DbId,
    /// Defaults to an empty rule set if omitted.
    pub rules: Option<RuleSet>,
}

/// DTO for updating a collection. All fields optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCollection {
    pub name: Option<String>,
    pub description: Option<String>,
    pub rules: Option<RuleSet>,
}
