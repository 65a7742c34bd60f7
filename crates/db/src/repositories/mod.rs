//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&DbPool` as the first argument.

pub mod collection_repo;
pub mod document_repo;
pub mod version_repo;

pub use collection_repo::CollectionRepo;
pub use document_repo::DocumentRepo;
pub use version_repo::VersionRepo;
