//! Host action-list scheduling
//!
//! The host workflow engine owns a flat, index-addressed action list. This
//! module models the analysis commands on that list as a closed tagged union
//! and performs the init-time expansion through an explicit dependency graph
//! flattened in topological order, instead of splicing arrays with manual
//! offset arithmetic.

mod command;
mod graph;

pub use command::{ActionEntry, ActionPayload, AnalysisCommand};
pub use graph::{expand_action_list, TaskGraphError};
