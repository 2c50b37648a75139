//! Batch planning: filtering the file inventory and partitioning it into
//! per-directory work units
//!
//! The partition is deterministic: the same file set, in any input order,
//! always yields the same unit list.

mod filter;
mod plan;

pub use filter::FileFilter;
pub use plan::{directories_of, group_into_units, BatchPlan};
