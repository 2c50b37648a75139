//! Work-unit partitioning
//!
//! Every surviving file is assigned to the unit of its direct parent
//! directory, falling back to the nearest known ancestor; root-level files go
//! to the empty-path unit. Units are emitted shallowest-first.

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::filter::FileFilter;
use crate::model::WorkUnit;

fn depth_of(path: &str) -> usize {
    if path.is_empty() {
        0
    } else {
        path.split('/').count()
    }
}

fn parent_of(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((parent, _)) => parent,
        None => "",
    }
}

/// Derives the directory set of a file list: every ancestor prefix of every
/// file, ordered deepest first (lexicographic tie-break). The root is not a
/// named directory and is not included.
pub fn directories_of(files: &[String]) -> Vec<String> {
    let mut dirs = BTreeSet::new();

    for file in files {
        let mut dir = parent_of(file);
        while !dir.is_empty() {
            dirs.insert(dir.to_string());
            dir = parent_of(dir);
        }
    }

    let mut ordered: Vec<String> = dirs.into_iter().collect();
    ordered.sort_by(|a, b| depth_of(b).cmp(&depth_of(a)).then_with(|| a.cmp(b)));
    ordered
}

/// Partitions files into per-directory work units, shallowest-first
///
/// `known_dirs` is the directory set the assignment falls back through; a
/// file whose direct parent is absent from it lands on the nearest known
/// ancestor, or the root unit.
pub fn group_into_units(files: &[String], known_dirs: &[String]) -> Vec<WorkUnit> {
    let known: BTreeSet<&str> = known_dirs.iter().map(|s| s.as_str()).collect();
    let mut by_dir: BTreeMap<String, Vec<String>> = BTreeMap::new();

    let mut sorted: Vec<&String> = files.iter().collect();
    sorted.sort();
    sorted.dedup();

    for file in sorted {
        let mut dir = parent_of(file);
        while !dir.is_empty() && !known.contains(dir) {
            dir = parent_of(dir);
        }
        by_dir
            .entry(dir.to_string())
            .or_default()
            .push(file.clone());
    }

    let mut units: Vec<WorkUnit> = by_dir
        .into_iter()
        .map(|(directory, files)| WorkUnit { directory, files })
        .collect();

    units.sort_by(|a, b| {
        depth_of(&a.directory)
            .cmp(&depth_of(&b.directory))
            .then_with(|| a.directory.cmp(&b.directory))
    });

    units
}

/// The deterministic decomposition of a repository's file inventory
#[derive(Debug, Clone)]
pub struct BatchPlan {
    /// Surviving files, sorted
    pub files: Vec<String>,

    /// Directory list, deepest first
    pub directories: Vec<String>,

    /// Work units, shallowest first
    pub units: Vec<WorkUnit>,
}

impl BatchPlan {
    /// Filters the raw inventory and partitions the survivors
    pub fn build(raw_files: &[String], filter: &FileFilter) -> Self {
        let files = filter.filter(raw_files);
        let directories = directories_of(&files);
        let units = group_into_units(&files, &directories);

        debug!(
            raw = raw_files.len(),
            surviving = files.len(),
            directories = directories.len(),
            units = units.len(),
            "Built batch plan"
        );

        Self {
            files,
            directories,
            units,
        }
    }

    /// One execution step per work unit
    pub fn batch_count(&self) -> usize {
        self.units.len()
    }
}
