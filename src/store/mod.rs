//! Analysis persistence
//!
//! The plan state is a versioned document written with compare-and-swap;
//! each work unit has its own independently writable record. That split is
//! what lets concurrently running process steps coexist without losing
//! updates.

mod json_file;
mod memory;
mod store;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use store::{AnalysisStore, StoreError, VersionedState};
