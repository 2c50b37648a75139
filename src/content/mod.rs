//! Repository content access
//!
//! The pipeline never touches a repository directly; it goes through the
//! [`ContentSource`] trait so tests can script listings, contents, and
//! failures.

mod local;
mod mock;
mod source;

pub use local::LocalContentSource;
pub use mock::MockContentSource;
pub use source::{ContentError, ContentSource};
