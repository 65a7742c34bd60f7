//! RepoSync event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`EventKind`] / [`VaultEvent`]: typed domain events for collections,
//!   uploads, checkouts, checkins and validations.
//! - [`EventLogger`]: background subscriber writing every event to the
//!   tracing log.

pub mod bus;
pub mod logger;

pub use bus::{EventBus, EventKind, VaultEvent};
pub use logger::EventLogger;
