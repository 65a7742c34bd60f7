//! RepoSync service layer.
//!
//! Ties the pure core to storage, the repositories and the event bus:
//!
//! - [`CheckoutLock`]: single-writer checkout/checkin per document.
//! - [`VersionStore`]: dense version numbering, content persistence and
//!   promotion of validated versions.
//! - [`DocumentService`]: the upload pipeline and read paths built on both.

pub mod checkout;
pub mod config;
pub mod error;
pub mod guard;
pub mod service;
pub mod versions;

pub use checkout::CheckoutLock;
pub use config::VaultConfig;
pub use error::{VaultError, VaultResult};
pub use service::{DocumentService, DocumentSummary, UploadOutcome};
pub use versions::{Promotion, VersionStore};
