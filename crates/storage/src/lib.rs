//! [`StorageProvider`](reposync_core::storage::StorageProvider)
//! implementations for version content.

pub mod local;
pub mod memory;

pub use local::LocalStorage;
pub use memory::MemoryStorage;
