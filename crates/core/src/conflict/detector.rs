//! Conflict detection logic.
//!
//! Given one patch list per contributor, the detector identifies paths that
//! patches from more than one list target with differing content.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::models::{ConflictDetail, Patch};

/// Patches seen so far for one path.
#[derive(Default)]
struct PathEntry<'a> {
    groups: Vec<usize>,
    options: Vec<&'a str>,
}

/// Compare patch groups and return the conflicting paths.
///
/// A path conflicts when patches from at least two groups target it and
/// they carry at least two distinct hashes. Options are the distinct hashes
/// in flattened-input order; conflicts are ordered by the first appearance
/// of their path.
pub fn detect_conflicts(patch_groups: &[Vec<Patch>]) -> Vec<ConflictDetail> {
    info!(groups = patch_groups.len(), "detecting conflicts");

    let mut order: Vec<&str> = Vec::new();
    let mut by_path: HashMap<&str, PathEntry<'_>> = HashMap::new();

    for (group_idx, group) in patch_groups.iter().enumerate() {
        for patch in group {
            let path = patch.path.as_str();
            let entry = by_path.entry(path).or_insert_with(|| {
                order.push(path);
                PathEntry::default()
            });
            if !entry.groups.contains(&group_idx) {
                entry.groups.push(group_idx);
            }
            if !entry.options.contains(&patch.hash.as_str()) {
                entry.options.push(patch.hash.as_str());
            }
        }
    }

    let conflicts: Vec<ConflictDetail> = order
        .into_iter()
        .filter_map(|path| {
            let entry = by_path.get(path)?;
            if entry.groups.len() < 2 || entry.options.len() < 2 {
                return None;
            }
            debug!(
                path,
                groups = entry.groups.len(),
                options = entry.options.len(),
                "conflict detected"
            );
            Some(ConflictDetail::new(
                path,
                entry.options.iter().map(|h| h.to_string()).collect(),
            ))
        })
        .collect();

    info!(count = conflicts.len(), "conflict detection complete");
    conflicts
}
