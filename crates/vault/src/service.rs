//! Document service: the upload pipeline and read paths.
//!
//! Upload flow: admission checks -> lock check, numbering and storage
//! (critical section) -> validation on the blocking pool -> promotion
//! (critical section) -> events. Once a version exists it always receives
//! an outcome: anything that stops validation from running fails it.

use std::sync::Arc;

use reposync_core::rule_set::RuleSet;
use reposync_core::status::{resolve, DocumentStatus};
use reposync_core::storage::StorageProvider;
use reposync_core::types::{DbId, Timestamp};
use reposync_core::upload::validate_upload;
use reposync_core::validation::{ValidationEngine, ValidationResult};
use reposync_db::models::collection::{Collection, CreateCollection, UpdateCollection};
use reposync_db::models::document::{CreateDocument, Document};
use reposync_db::models::version::Version;
use reposync_db::repositories::{CollectionRepo, DocumentRepo};
use reposync_db::DbPool;
use reposync_events::{EventBus, EventKind, VaultEvent};
use serde::Serialize;

use crate::checkout::CheckoutLock;
use crate::config::VaultConfig;
use crate::error::{VaultError, VaultResult};
use crate::guard::DocumentGuards;
use crate::versions::VersionStore;

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Result of one upload. Validation failure is an outcome, not an error.
#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub document: Document,
    pub version: Version,
    pub validation: ValidationResult,
    /// The version became current.
    pub promoted: bool,
    /// The upload checked the document back in.
    pub checked_in: bool,
}

/// Everything a document listing shows for one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub document_id: DbId,
    pub collection_id: DbId,
    pub filename: String,
    pub status: DocumentStatus,
    pub checked_out_by: Option<DbId>,
    pub checked_out_at: Option<Timestamp>,
    pub current_version_number: Option<i32>,
    pub version_count: usize,
}

// ---------------------------------------------------------------------------
// DocumentService
// ---------------------------------------------------------------------------

pub struct DocumentService<S> {
    pool: DbPool,
    versions: VersionStore<S>,
    lock: CheckoutLock,
    engine: ValidationEngine,
    events: Arc<EventBus>,
    config: Arc<VaultConfig>,
}

impl<S: StorageProvider> DocumentService<S> {
    pub fn new(pool: DbPool, storage: Arc<S>, events: Arc<EventBus>, config: VaultConfig) -> Self {
        let guards = Arc::new(DocumentGuards::new());
        Self {
            versions: VersionStore::new(pool.clone(), storage, Arc::clone(&guards)),
            lock: CheckoutLock::new(pool.clone(), guards),
            pool,
            engine: ValidationEngine::new(),
            events,
            config: Arc::new(config),
        }
    }

    pub fn versions(&self) -> &VersionStore<S> {
        &self.versions
    }

    pub fn checkout_lock(&self) -> &CheckoutLock {
        &self.lock
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    // -- Collections --------------------------------------------------------

    pub async fn create_collection(&self, input: &CreateCollection) -> VaultResult<Collection> {
        let collection = CollectionRepo::create(&self.pool, input).await?;
        self.publish(
            EventKind::CollectionCreated {
                collection_id: collection.id,
                name: collection.name.clone(),
            },
            collection.created_by,
        );
        Ok(collection)
    }

    /// Replace a collection's rule set from its JSON form.
    pub async fn update_collection_rules(
        &self,
        collection_id: DbId,
        actor: DbId,
        rules: &serde_json::Value,
    ) -> VaultResult<Collection> {
        let rules = RuleSet::from_json(rules)?;
        let update = UpdateCollection {
            rules: Some(rules),
            ..Default::default()
        };
        let collection = CollectionRepo::update(&self.pool, collection_id, &update)
            .await?
            .ok_or_else(|| VaultError::not_found("Collection", collection_id))?;
        self.publish(
            EventKind::CollectionRulesUpdated {
                collection_id,
                rules: collection.rules.clone(),
            },
            actor,
        );
        Ok(collection)
    }

    pub async fn list_collections(&self) -> VaultResult<Vec<Collection>> {
        Ok(CollectionRepo::list(&self.pool).await?)
    }

    /// Set or clear (`None`) a document's rule set override.
    pub async fn set_document_rules(
        &self,
        document_id: DbId,
        rules: Option<&serde_json::Value>,
    ) -> VaultResult<Document> {
        let rules = rules.map(RuleSet::from_json).transpose()?;
        self.load_document(document_id).await?;
        Ok(DocumentRepo::set_rules_override(&self.pool, document_id, rules).await?)
    }

    // -- Uploads ------------------------------------------------------------

    /// First upload: creates the document in `collection_id` and its
    /// version 1. If the version cannot be created the document is removed
    /// again.
    pub async fn upload_new(
        &self,
        collection_id: DbId,
        uploader: DbId,
        filename: &str,
        commit_message: &str,
        content: Vec<u8>,
    ) -> VaultResult<UploadOutcome> {
        let filename = self.admit(filename, commit_message, &content)?;
        if CollectionRepo::find_by_id(&self.pool, collection_id).await?.is_none() {
            return Err(VaultError::not_found("Collection", collection_id));
        }

        let document = DocumentRepo::create(
            &self.pool,
            &CreateDocument {
                collection_id,
                filename: filename.clone(),
                created_by: uploader,
            },
        )
        .await?;
        let version = match self
            .versions
            .create_version(document.id, uploader, commit_message, &filename, &content)
            .await
        {
            Ok(version) => version,
            Err(e) => {
                self.discard_empty(document.id).await;
                return Err(e);
            }
        };
        drop(content);
        self.finish_upload(version, uploader, &filename).await
    }

    /// New version of an existing document. `uploader` must have it
    /// checked out.
    pub async fn upload_version(
        &self,
        document_id: DbId,
        uploader: DbId,
        filename: &str,
        commit_message: &str,
        content: Vec<u8>,
    ) -> VaultResult<UploadOutcome> {
        let filename = self.admit(filename, commit_message, &content)?;
        let version = self
            .versions
            .create_version(document_id, uploader, commit_message, &filename, &content)
            .await?;
        drop(content);
        self.finish_upload(version, uploader, &filename).await
    }

    fn admit(&self, filename: &str, commit_message: &str, content: &[u8]) -> VaultResult<String> {
        Ok(validate_upload(
            filename,
            commit_message,
            content.len() as u64,
            self.config.max_file_size,
            &self.config.allowed_extensions,
        )?)
    }

    async fn discard_empty(&self, document_id: DbId) {
        match DocumentRepo::delete_if_empty(&self.pool, document_id).await {
            Ok(removed) => tracing::debug!(document_id, removed, "Discarded document after failed upload"),
            Err(e) => tracing::warn!(document_id, error = %e, "Failed to discard empty document"),
        }
    }

    /// Validate a freshly created version and promote it.
    async fn finish_upload(
        &self,
        version: Version,
        uploader: DbId,
        filename: &str,
    ) -> VaultResult<UploadOutcome> {
        let document_id = version.document_id;
        self.publish(
            EventKind::FileUploaded {
                document_id,
                version_number: version.version_number,
                filename: filename.to_string(),
            },
            uploader,
        );

        let validation = match self.check_stored(&version).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(
                    document_id,
                    version_number = version.version_number,
                    error = %e,
                    "Stored version could not be validated",
                );
                ValidationResult::failed(format!("Could not validate stored content: {e}"))
            }
        };

        let promotion = self.versions.promote(version.id, &validation).await?;
        self.publish(
            EventKind::VersionValidated {
                document_id,
                version_id: version.id,
                version_number: version.version_number,
                passed: validation.passed,
                errors: validation.errors.clone(),
            },
            uploader,
        );
        if promotion.released {
            self.publish(
                EventKind::FileCheckedIn {
                    document_id,
                    automatic: true,
                },
                uploader,
            );
        }

        Ok(UploadOutcome {
            document: promotion.document,
            version: promotion.version,
            validation,
            promoted: promotion.promoted,
            checked_in: promotion.released,
        })
    }

    /// Read the stored bytes back and run the engine on them.
    async fn check_stored(&self, version: &Version) -> VaultResult<ValidationResult> {
        let rules = self.effective_rules(version.document_id).await?;
        let stored = self.versions.read(version).await?;
        self.validate(stored, rules).await
    }

    /// Run the engine on the blocking pool.
    async fn validate(&self, content: Vec<u8>, rules: RuleSet) -> VaultResult<ValidationResult> {
        let engine = self.engine;
        tokio::task::spawn_blocking(move || engine.validate(&content, &rules))
            .await
            .map_err(|e| VaultError::Internal(format!("Validation task failed: {e}")))
    }

    /// The document's override, else its collection's rule set.
    pub async fn effective_rules(&self, document_id: DbId) -> VaultResult<RuleSet> {
        let document = self.load_document(document_id).await?;
        let collection = CollectionRepo::find_by_id(&self.pool, document.collection_id)
            .await?
            .ok_or_else(|| VaultError::not_found("Collection", document.collection_id))?;
        Ok(document.effective_rules(&collection.rules).clone())
    }

    // -- Checkout -----------------------------------------------------------

    pub async fn checkout(&self, document_id: DbId, user: DbId) -> VaultResult<Document> {
        let document = self.lock.acquire(document_id, user).await?;
        self.publish(EventKind::FileCheckedOut { document_id }, user);
        Ok(document)
    }

    pub async fn checkin(&self, document_id: DbId, user: DbId) -> VaultResult<Document> {
        let document = self.lock.release(document_id, user).await?;
        self.publish(
            EventKind::FileCheckedIn {
                document_id,
                automatic: false,
            },
            user,
        );
        Ok(document)
    }

    fn publish(&self, kind: EventKind, actor: DbId) {
        self.events.publish(VaultEvent::new(kind, actor));
    }

    // -- Read paths ---------------------------------------------------------

    pub async fn document(&self, document_id: DbId) -> VaultResult<Document> {
        self.load_document(document_id).await
    }

    pub async fn status(&self, document_id: DbId) -> VaultResult<DocumentStatus> {
        let document = self.load_document(document_id).await?;
        self.resolve_status(&document).await
    }

    pub async fn summary(&self, document_id: DbId) -> VaultResult<DocumentSummary> {
        let document = self.load_document(document_id).await?;
        self.summarize(document).await
    }

    /// Summaries of every document in a collection, by filename.
    pub async fn list_documents(&self, collection_id: DbId) -> VaultResult<Vec<DocumentSummary>> {
        let documents = DocumentRepo::list_by_collection(&self.pool, collection_id).await?;
        let mut summaries = Vec::with_capacity(documents.len());
        for document in documents {
            summaries.push(self.summarize(document).await?);
        }
        Ok(summaries)
    }

    /// Version history, newest first.
    pub async fn history(&self, document_id: DbId) -> VaultResult<Vec<Version>> {
        self.load_document(document_id).await?;
        self.versions.history(document_id).await
    }

    /// Display filename and bytes of the current version.
    pub async fn download_current(&self, document_id: DbId) -> VaultResult<(String, Vec<u8>)> {
        let document = self.load_document(document_id).await?;
        let current = self
            .versions
            .current(&document)
            .await?
            .ok_or_else(|| VaultError::not_found("Current version of document", document_id))?;
        let bytes = self.versions.read(&current).await?;
        Ok((document.filename, bytes))
    }

    async fn summarize(&self, document: Document) -> VaultResult<DocumentSummary> {
        let status = self.resolve_status(&document).await?;
        let current_version_number = self
            .versions
            .current(&document)
            .await?
            .map(|v| v.version_number);
        let version_count = self.versions.count(document.id).await?;
        Ok(DocumentSummary {
            document_id: document.id,
            collection_id: document.collection_id,
            filename: document.filename,
            status,
            checked_out_by: document.lock.holder(),
            checked_out_at: document.lock.acquired_at(),
            current_version_number,
            version_count,
        })
    }

    async fn resolve_status(&self, document: &Document) -> VaultResult<DocumentStatus> {
        let latest = self.versions.latest(document.id).await?;
        Ok(resolve(
            &document.lock,
            document.current_version_id.is_some(),
            latest.as_ref().map(Version::validation_status),
        ))
    }

    async fn load_document(&self, document_id: DbId) -> VaultResult<Document> {
        DocumentRepo::find_by_id(&self.pool, document_id)
            .await?
            .ok_or_else(|| VaultError::not_found("Document", document_id))
    }
}
