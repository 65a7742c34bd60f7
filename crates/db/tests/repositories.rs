//! Integration tests for the repository layer against a migrated SQLite
//! database:
//! - Collection CRUD and rule set updates
//! - Document creation, lock and current-version pointers
//! - Version insertion constraints (dense numbering, unique keys)
//! - One-time validation outcome
//! - Schema guards: versions are never deleted or rewritten
//! - Rows survive closing and reopening the database file

use assert_matches::assert_matches;
use chrono::Utc;
use reposync_core::lock::LockState;
use reposync_core::rule_set::RuleSet;
use reposync_core::status::ValidationStatus;
use reposync_core::validation::ValidationResult;
use reposync_db::models::collection::{CreateCollection, UpdateCollection};
use reposync_db::models::document::CreateDocument;
use reposync_db::models::version::CreateVersion;
use reposync_db::repositories::{CollectionRepo, DocumentRepo, VersionRepo};
use reposync_db::{create_pool, run_migrations, DbError, DbPool};
use sqlx::SqlitePool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_collection(name: &str) -> CreateCollection {
    CreateCollection {
        name: name.to_string(),
        description: None,
        created_by: 1,
        rules: None,
    }
}

fn new_version(document_id: i64, number: i32) -> CreateVersion {
    CreateVersion {
        document_id,
        version_number: number,
        storage_key: format!("documents/{document_id}/{document_id}_v{number}_x.xlsx"),
        file_size_bytes: 10,
        content_hash: "00".repeat(32),
        commit_message: format!("v{number}"),
        uploaded_by: 1,
        created_at: Utc::now(),
    }
}

async fn seed_document(pool: &DbPool) -> i64 {
    let collection = CollectionRepo::create(pool, &new_collection("Finance"))
        .await
        .unwrap();
    DocumentRepo::create(
        pool,
        &CreateDocument {
            collection_id: collection.id,
            filename: "budget.xlsx".into(),
            created_by: 1,
        },
    )
    .await
    .unwrap()
    .id
}

// ---------------------------------------------------------------------------
// Test: collections
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_collection_crud(pool: SqlitePool) {
    let created = CollectionRepo::create(&pool, &new_collection("Finance"))
        .await
        .unwrap();
    assert_eq!(created.id, 1);
    assert!(created.rules.is_empty());

    let rules = RuleSet::from_json_str(r#"{"required_sheets": ["Data"]}"#).unwrap();
    let updated = CollectionRepo::update(
        &pool,
        created.id,
        &UpdateCollection {
            rules: Some(rules.clone()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.rules, rules);
    assert_eq!(updated.name, "Finance");

    let found = CollectionRepo::find_by_id(&pool, created.id).await.unwrap();
    assert_eq!(found, Some(updated));

    assert!(CollectionRepo::update(&pool, 99, &UpdateCollection::default())
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_collections_list_by_name(pool: SqlitePool) {
    for name in ["Ops", "Finance", "HR"] {
        CollectionRepo::create(&pool, &new_collection(name)).await.unwrap();
    }
    let names: Vec<String> = CollectionRepo::list(&pool)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, ["Finance", "HR", "Ops"]);
}

// ---------------------------------------------------------------------------
// Test: documents
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_document_requires_collection(pool: SqlitePool) {
    let result = DocumentRepo::create(
        &pool,
        &CreateDocument {
            collection_id: 42,
            filename: "a.xlsx".into(),
            created_by: 1,
        },
    )
    .await;
    assert_matches!(result, Err(DbError::Constraint(msg)) if msg.contains("FOREIGN KEY"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_document_starts_unlocked_without_current(pool: SqlitePool) {
    let id = seed_document(&pool).await;
    let doc = DocumentRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(doc.lock, LockState::Unlocked);
    assert_eq!(doc.current_version_id, None);
    assert_eq!(doc.rules_override, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_document_lock_round_trip(pool: SqlitePool) {
    let id = seed_document(&pool).await;
    let locked = LockState::Unlocked.acquire(5, Utc::now()).unwrap();
    let doc = DocumentRepo::set_lock(&pool, id, locked).await.unwrap();
    assert_eq!(doc.lock.holder(), Some(5));

    assert_matches!(
        DocumentRepo::set_lock(&pool, 77, LockState::Unlocked).await,
        Err(DbError::NotFound { entity: "Document", id: 77 })
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_current_version_must_belong_to_document(pool: SqlitePool) {
    let a = seed_document(&pool).await;
    let b = seed_document(&pool).await;
    let version = VersionRepo::create(&pool, &new_version(a, 1)).await.unwrap();

    assert_matches!(
        DocumentRepo::set_current_version(&pool, b, version.id).await,
        Err(DbError::Constraint(msg)) if msg.contains("does not belong")
    );
    let doc = DocumentRepo::set_current_version(&pool, a, version.id)
        .await
        .unwrap();
    assert_eq!(doc.current_version_id, Some(version.id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rules_override_takes_precedence(pool: SqlitePool) {
    let id = seed_document(&pool).await;
    let override_rules = RuleSet::from_json_str(r#"{"formula_sheets": ["Calc"]}"#).unwrap();
    let doc = DocumentRepo::set_rules_override(&pool, id, Some(override_rules.clone()))
        .await
        .unwrap();
    let collection_rules = RuleSet::default();
    assert_eq!(doc.effective_rules(&collection_rules), &override_rules);

    let doc = DocumentRepo::set_rules_override(&pool, id, None).await.unwrap();
    assert_eq!(doc.effective_rules(&collection_rules), &collection_rules);
}

// ---------------------------------------------------------------------------
// Test: versions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_version_numbers_are_dense(pool: SqlitePool) {
    let id = seed_document(&pool).await;

    assert_eq!(VersionRepo::next_version_number(&pool, id).await.unwrap(), 1);
    VersionRepo::create(&pool, &new_version(id, 1)).await.unwrap();
    assert_matches!(
        VersionRepo::create(&pool, &new_version(id, 3)).await,
        Err(DbError::Constraint(_))
    );
    assert_matches!(
        VersionRepo::create(&pool, &new_version(id, 1)).await,
        Err(DbError::Constraint(_))
    );
    VersionRepo::create(&pool, &new_version(id, 2)).await.unwrap();
    assert_eq!(VersionRepo::count_for_document(&pool, id).await.unwrap(), 2);
    assert_eq!(VersionRepo::next_version_number(&pool, id).await.unwrap(), 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_storage_key_rejected(pool: SqlitePool) {
    let id = seed_document(&pool).await;
    VersionRepo::create(&pool, &new_version(id, 1)).await.unwrap();
    let mut clash = new_version(id, 2);
    clash.storage_key = new_version(id, 1).storage_key;
    assert_matches!(
        VersionRepo::create(&pool, &clash).await,
        Err(DbError::Constraint(msg)) if msg.contains("storage_key")
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_versions_listed_newest_first(pool: SqlitePool) {
    let id = seed_document(&pool).await;
    for n in 1..=3 {
        VersionRepo::create(&pool, &new_version(id, n)).await.unwrap();
    }
    let numbers: Vec<i32> = VersionRepo::list_by_document(&pool, id)
        .await
        .unwrap()
        .iter()
        .map(|v| v.version_number)
        .collect();
    assert_eq!(numbers, [3, 2, 1]);

    let latest = VersionRepo::find_latest(&pool, id).await.unwrap().unwrap();
    assert_eq!(latest.version_number, 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_validation_recorded_once(pool: SqlitePool) {
    let id = seed_document(&pool).await;
    let version = VersionRepo::create(&pool, &new_version(id, 1)).await.unwrap();
    assert_eq!(version.validation_status(), ValidationStatus::Pending);

    let failed = ValidationResult {
        passed: false,
        errors: vec!["Missing required sheet: Data".into()],
    };
    let recorded = VersionRepo::record_validation(&pool, version.id, &failed, Utc::now())
        .await
        .unwrap();
    assert_eq!(recorded.validation_status(), ValidationStatus::Failed);
    assert!(recorded.validated_at.is_some());

    assert_matches!(
        VersionRepo::record_validation(&pool, version.id, &ValidationResult::passed(), Utc::now())
            .await,
        Err(DbError::Constraint(_))
    );
    let stored = VersionRepo::find_by_id(&pool, version.id).await.unwrap().unwrap();
    assert_eq!(stored.validation, Some(failed));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_version_for_missing_document_rejected(pool: SqlitePool) {
    assert_matches!(
        VersionRepo::create(&pool, &new_version(404, 1)).await,
        Err(DbError::Constraint(_))
    );
    assert_eq!(VersionRepo::count_for_document(&pool, 404).await.unwrap(), 0);
}

// ---------------------------------------------------------------------------
// Test: schema guards
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_versions_cannot_be_deleted_or_rewritten(pool: SqlitePool) {
    let id = seed_document(&pool).await;
    let version = VersionRepo::create(&pool, &new_version(id, 1)).await.unwrap();

    let deleted = sqlx::query("DELETE FROM versions WHERE id = ?1")
        .bind(version.id)
        .execute(&pool)
        .await;
    assert!(deleted.is_err());

    let rewritten = sqlx::query("UPDATE versions SET storage_key = 'elsewhere' WHERE id = ?1")
        .bind(version.id)
        .execute(&pool)
        .await;
    assert!(rewritten.is_err());

    let stored = VersionRepo::find_by_id(&pool, version.id).await.unwrap().unwrap();
    assert_eq!(stored, version);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_only_empty_documents_are_deleted(pool: SqlitePool) {
    let empty = seed_document(&pool).await;
    let used = seed_document(&pool).await;
    VersionRepo::create(&pool, &new_version(used, 1)).await.unwrap();

    assert!(DocumentRepo::delete_if_empty(&pool, empty).await.unwrap());
    assert!(!DocumentRepo::delete_if_empty(&pool, used).await.unwrap());
    assert!(DocumentRepo::find_by_id(&pool, empty).await.unwrap().is_none());
    assert!(DocumentRepo::find_by_id(&pool, used).await.unwrap().is_some());
}

// ---------------------------------------------------------------------------
// Test: durability
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_rows_survive_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("reposync.db").display());

    let pool = create_pool(&url).await.unwrap();
    run_migrations(&pool).await.unwrap();
    let id = seed_document(&pool).await;
    let locked = LockState::Unlocked.acquire(3, Utc::now()).unwrap();
    DocumentRepo::set_lock(&pool, id, locked).await.unwrap();
    let version = VersionRepo::create(&pool, &new_version(id, 1)).await.unwrap();
    VersionRepo::record_validation(&pool, version.id, &ValidationResult::passed(), Utc::now())
        .await
        .unwrap();
    DocumentRepo::set_current_version(&pool, id, version.id)
        .await
        .unwrap();
    pool.close().await;

    let reopened = create_pool(&url).await.unwrap();
    run_migrations(&reopened).await.unwrap();
    let doc = DocumentRepo::find_by_id(&reopened, id).await.unwrap().unwrap();
    assert_eq!(doc.lock.holder(), Some(3));
    assert_eq!(doc.current_version_id, Some(version.id));
    assert_eq!(VersionRepo::count_for_document(&reopened, id).await.unwrap(), 1);
    assert_eq!(VersionRepo::next_version_number(&reopened, id).await.unwrap(), 2);
}
