//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! The service layer publishes one [`VaultEvent`] per state change; audit
//! consumers and the [`EventLogger`](crate::logger::EventLogger) subscribe.

use chrono::{DateTime, Utc};
use reposync_core::rule_set::RuleSet;
use reposync_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Event names
// ---------------------------------------------------------------------------

pub const EVENT_FILE_UPLOADED: &str = "file.uploaded";
pub const EVENT_FILE_CHECKED_OUT: &str = "file.checked_out";
pub const EVENT_FILE_CHECKED_IN: &str = "file.checked_in";
pub const EVENT_VERSION_VALIDATED: &str = "version.validated";
pub const EVENT_COLLECTION_CREATED: &str = "collection.created";
pub const EVENT_COLLECTION_RULES_UPDATED: &str = "collection.rules_updated";

// ---------------------------------------------------------------------------
// EventKind
// ---------------------------------------------------------------------------

/// What happened, with the identifiers an audit trail needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    CollectionCreated {
        collection_id: DbId,
        name: String,
    },
    CollectionRulesUpdated {
        collection_id: DbId,
        rules: RuleSet,
    },
    FileUploaded {
        document_id: DbId,
        version_number: i32,
        filename: String,
    },
    FileCheckedOut {
        document_id: DbId,
    },
    /// Explicit checkin, or the automatic one after a passing upload.
    FileCheckedIn {
        document_id: DbId,
        automatic: bool,
    },
    VersionValidated {
        document_id: DbId,
        version_id: DbId,
        version_number: i32,
        passed: bool,
        errors: Vec<String>,
    },
}

impl EventKind {
    /// Dot-separated event name, e.g. `"file.checked_out"`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CollectionCreated { .. } => EVENT_COLLECTION_CREATED,
            Self::CollectionRulesUpdated { .. } => EVENT_COLLECTION_RULES_UPDATED,
            Self::FileUploaded { .. } => EVENT_FILE_UPLOADED,
            Self::FileCheckedOut { .. } => EVENT_FILE_CHECKED_OUT,
            Self::FileCheckedIn { .. } => EVENT_FILE_CHECKED_IN,
            Self::VersionValidated { .. } => EVENT_VERSION_VALIDATED,
        }
    }

    /// The document the event concerns; `None` for collection events.
    pub fn document_id(&self) -> Option<DbId> {
        match self {
            Self::CollectionCreated { .. } | Self::CollectionRulesUpdated { .. } => None,
            Self::FileUploaded { document_id, .. }
            | Self::FileCheckedOut { document_id }
            | Self::FileCheckedIn { document_id, .. }
            | Self::VersionValidated { document_id, .. } => Some(*document_id),
        }
    }
}

/// An [`EventKind`] plus who caused it and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultEvent {
    #[serde(flatten)]
    pub kind: EventKind,
    pub actor_id: DbId,
    pub timestamp: DateTime<Utc>,
}

impl VaultEvent {
    pub fn new(kind: EventKind, actor_id: DbId) -> Self {
        Self {
            kind,
            actor_id,
            timestamp: Utc::now(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out of [`VaultEvent`]s to every live subscriber.
///
/// ```rust
/// use reposync_events::bus::{EventBus, EventKind, VaultEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(VaultEvent::new(EventKind::FileCheckedOut { document_id: 1 }, 7));
/// assert_eq!(rx.try_recv().unwrap().name(), "file.checked_out");
/// ```
pub struct EventBus {
    sender: broadcast::Sender<VaultEvent>,
}

impl EventBus {
    /// A bus buffering up to `capacity` unread events per subscriber; slower
    /// subscribers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers and return how many there were.
    pub fn publish(&self, event: VaultEvent) -> usize {
        tracing::trace!(event = event.name(), "Publishing event");
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<VaultEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
