//! Init-time expansion of the host action list
//!
//! The original entries form an order-preserving chain. Expansion hangs
//! `batch_count` process nodes off the init node, a summary node off every
//! process node, and re-parents the original suffix after the summary node.
//! Flattening the graph in stable topological order (smallest node id first
//! among ready nodes) yields the new list; indices are assigned by
//! enumeration, never by offset arithmetic.

use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

use super::command::{ActionEntry, ActionPayload, AnalysisCommand};
use crate::model::RepoCoords;

#[derive(Debug, Error)]
pub enum TaskGraphError {
    #[error("No init command at action index {index}")]
    InitNotFound { index: usize },

    #[error("Analysis for {locator} is already scheduled on this action list")]
    AlreadyScheduled { locator: String },

    #[error("Action dependency graph contains a cycle")]
    Cycle,
}

/// Expands the action list around the init entry at `init_index`
///
/// Postconditions: result length is `actions.len() + batch_count + 1`,
/// entries up to and including the init are unchanged, the process entries
/// follow in unit order, then the summary, then the original suffix with
/// shifted indices. Re-invoking for coordinates that already have scheduled
/// process or summary entries is rejected rather than duplicated.
///
/// Every `index` field in the result equals its position. The prefix is
/// byte-identical only when the input already satisfies that; a list with
/// gapped or out-of-line indices has its payloads preserved and its indices
/// normalized.
pub fn expand_action_list(
    actions: &[ActionEntry],
    init_index: usize,
    repo: &RepoCoords,
    batch_count: usize,
) -> Result<Vec<ActionEntry>, TaskGraphError> {
    match actions.get(init_index).and_then(ActionEntry::as_analysis) {
        Some(AnalysisCommand::Init { .. }) => {}
        _ => return Err(TaskGraphError::InitNotFound { index: init_index }),
    }

    let already_scheduled = actions.iter().any(|entry| {
        matches!(
            entry.as_analysis(),
            Some(AnalysisCommand::Process { repo: r, .. } | AnalysisCommand::Summary { repo: r })
                if r == repo
        )
    });
    if already_scheduled {
        return Err(TaskGraphError::AlreadyScheduled {
            locator: repo.locator.clone(),
        });
    }

    // Node ids: original entries keep their positions, new nodes append.
    let original_count = actions.len();
    let process_base = original_count;
    let summary_id = original_count + batch_count;
    let node_count = summary_id + 1;

    let mut payloads: Vec<ActionPayload> = actions.iter().map(|e| e.action.clone()).collect();
    for unit_index in 0..batch_count {
        payloads.push(ActionPayload::Analysis(AnalysisCommand::Process {
            repo: repo.clone(),
            unit_index,
        }));
    }
    payloads.push(ActionPayload::Analysis(AnalysisCommand::Summary {
        repo: repo.clone(),
    }));

    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    let mut in_degree = vec![0usize; node_count];

    let mut add_edge = |successors: &mut Vec<Vec<usize>>, in_degree: &mut Vec<usize>, from: usize, to: usize| {
        successors[from].push(to);
        in_degree[to] += 1;
    };

    // Original chain, except the init's outgoing edge which the summary takes over
    for i in 0..original_count.saturating_sub(1) {
        if i != init_index {
            add_edge(&mut successors, &mut in_degree, i, i + 1);
        }
    }
    if init_index + 1 < original_count {
        add_edge(&mut successors, &mut in_degree, summary_id, init_index + 1);
    }

    // init fans out to the process nodes, which all feed the summary
    if batch_count == 0 {
        add_edge(&mut successors, &mut in_degree, init_index, summary_id);
    } else {
        for unit_index in 0..batch_count {
            let pid = process_base + unit_index;
            add_edge(&mut successors, &mut in_degree, init_index, pid);
            add_edge(&mut successors, &mut in_degree, pid, summary_id);
        }
    }

    // Stable Kahn: among ready nodes, always take the smallest id
    let mut ready: BTreeSet<usize> = (0..node_count).filter(|&n| in_degree[n] == 0).collect();
    let mut order = Vec::with_capacity(node_count);

    while let Some(&node) = ready.iter().next() {
        ready.remove(&node);
        order.push(node);
        for &next in &successors[node] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.insert(next);
            }
        }
    }

    if order.len() != node_count {
        return Err(TaskGraphError::Cycle);
    }

    let expanded: Vec<ActionEntry> = order
        .into_iter()
        .enumerate()
        .map(|(index, node)| ActionEntry {
            index,
            action: payloads[node].clone(),
        })
        .collect();

    debug!(
        original = original_count,
        batch_count,
        expanded = expanded.len(),
        "Expanded action list"
    );

    Ok(expanded)
}
