//! Checkout lock state machine.
//!
//! A document is either unlocked or checked out by exactly one holder.
//! Transitions are pure functions returning the next state; callers apply
//! them inside the document's critical section together with any read that
//! depends on the lock (version count, promotion).

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Lock transition failures. Never retried by the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LockError {
    /// Checkout attempted on a document that is already checked out.
    #[error("Document is already checked out by user {holder}")]
    AlreadyLocked { holder: DbId },

    /// Release (or a write) attempted by someone who does not hold the lock.
    #[error("Document is not checked out by user {requester}")]
    NotLockHolder { requester: DbId },
}

// ---------------------------------------------------------------------------
// LockState
// ---------------------------------------------------------------------------

/// The single-writer lock carried by every document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LockState {
    #[default]
    Unlocked,
    LockedBy {
        holder: DbId,
        acquired_at: Timestamp,
    },
}

impl LockState {
    /// `Unlocked -> LockedBy(holder, now)`.
    ///
    /// Fails with [`LockError::AlreadyLocked`] for any existing holder,
    /// including `holder` itself.
    pub fn acquire(&self, holder: DbId, now: Timestamp) -> Result<LockState, LockError> {
        match self {
            Self::Unlocked => Ok(Self::LockedBy {
                holder,
                acquired_at: now,
            }),
            Self::LockedBy { holder: current, .. } => {
                Err(LockError::AlreadyLocked { holder: *current })
            }
        }
    }

    /// `LockedBy(holder, _) -> Unlocked`.
    pub fn release(&self, holder: DbId) -> Result<LockState, LockError> {
        match self {
            Self::LockedBy { holder: current, .. } if *current == holder => Ok(Self::Unlocked),
            _ => Err(LockError::NotLockHolder { requester: holder }),
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, Self::LockedBy { .. })
    }

    /// Current holder, if checked out.
    pub fn holder(&self) -> Option<DbId> {
        match self {
            Self::Unlocked => None,
            Self::LockedBy { holder, .. } => Some(*holder),
        }
    }

    pub fn acquired_at(&self) -> Option<Timestamp> {
        match self {
            Self::Unlocked => None,
            Self::LockedBy { acquired_at, .. } => Some(*acquired_at),
        }
    }

    /// Whether `holder` currently owns the lock.
    pub fn is_held_by(&self, holder: DbId) -> bool {
        self.holder() == Some(holder)
    }

    /// Whether `writer` may add a version to a document in this state.
    ///
    /// A document with no versions yet is being created by its first upload:
    /// its creator may write it while unlocked. Every other write needs the
    /// lock.
    pub fn permits_write(
        &self,
        writer: DbId,
        creator: DbId,
        existing_versions: usize,
    ) -> Result<(), LockError> {
        match self {
            Self::Unlocked if existing_versions == 0 && writer == creator => Ok(()),
            Self::LockedBy { holder, .. } if *holder == writer => Ok(()),
            _ => Err(LockError::NotLockHolder { requester: writer }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
