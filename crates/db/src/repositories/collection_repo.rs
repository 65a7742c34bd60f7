//! Repository for the `collections` table.

use chrono::Utc;
use reposync_core::types::DbId;
use sqlx::types::Json;

use crate::error::DbError;
use crate::models::collection::{Collection, CreateCollection, UpdateCollection};
use crate::DbPool;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, description, created_by, rules, created_at, updated_at";

/// Provides CRUD operations for collections.
pub struct CollectionRepo;

impl CollectionRepo {
    /// Insert a new collection. A missing rule set defaults to empty.
    pub async fn create(pool: &DbPool, input: &CreateCollection) -> Result<Collection, DbError> {
        let now = Utc::now();
        let rules = input.rules.clone().unwrap_or_default();
        let query = format!(
            "INSERT INTO collections (name, description, created_by, rules, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             RETURNING {COLUMNS}"
        );
        let collection = sqlx::query_as::<_, Collection>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.created_by)
            .bind(Json(&rules))
            .bind(now)
            .fetch_one(pool)
            .await?;
        tracing::debug!(collection_id = collection.id, name = %collection.name, "Collection created");
        Ok(collection)
    }

    pub async fn find_by_id(pool: &DbPool, id: DbId) -> Result<Option<Collection>, DbError> {
        let query = format!("SELECT {COLUMNS} FROM collections WHERE id = ?1");
        Ok(sqlx::query_as::<_, Collection>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?)
    }

    /// List all collections ordered by name.
    pub async fn list(pool: &DbPool) -> Result<Vec<Collection>, DbError> {
        let query = format!("SELECT {COLUMNS} FROM collections ORDER BY name, id");
        Ok(sqlx::query_as::<_, Collection>(&query).fetch_all(pool).await?)
    }

    /// Apply the non-`None` fields of `input`.
    ///
    /// Returns `None` if no collection with `id` exists.
    pub async fn update(
        pool: &DbPool,
        id: DbId,
        input: &UpdateCollection,
    ) -> Result<Option<Collection>, DbError> {
        let query = format!(
            "UPDATE collections SET
                name = COALESCE(?2, name),
                description = COALESCE(?3, description),
                rules = COALESCE(?4, rules),
                updated_at = ?5
             WHERE id = ?1
             RETURNING {COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Collection>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.rules.as_ref().map(Json))
            .bind(Utc::now())
            .fetch_optional(pool)
            .await?)
    }
}
