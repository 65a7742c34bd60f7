//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - An entity struct decoded from its table row
//! - A `Deserialize` create DTO for inserts
//! - An update DTO (all `Option` fields) where rows are patchable

pub mod collection;
pub mod document;
pub mod version;
