//! Resolution defaults and the top-level resolve entry point.

use tracing::{debug, info};

use super::merger::resolve_conflicts;
use crate::models::{
    ConflictDetail, ConflictResolution, CustomConflictResolution, Patch, ResolvedPatchSet,
};

/// Seed one resolution per conflict, selecting its first option.
///
/// Conflicts without options are skipped since there is nothing to select.
pub fn initialize_resolutions(conflicts: &[ConflictDetail]) -> Vec<ConflictResolution> {
    conflicts
        .iter()
        .filter_map(|c| {
            c.options
                .first()
                .map(|first| ConflictResolution::new(c.path.clone(), first.clone()))
        })
        .collect()
}

/// Flatten `patch_groups`, merge them, and report unresolved conflict hashes.
///
/// Every option of a conflict with no entry in `resolutions` is reported as
/// unresolved, even though the merge still applies the first-option default
/// for that path.
pub fn generate_resolved_patch(
    patch_groups: &[Vec<Patch>],
    conflicts: &[ConflictDetail],
    resolutions: &[ConflictResolution],
    custom_resolutions: &[CustomConflictResolution],
) -> ResolvedPatchSet {
    let patches: Vec<Patch> = patch_groups.iter().flatten().cloned().collect();

    if patches.is_empty() {
        debug!("no patches to resolve");
        return ResolvedPatchSet::default();
    }

    if conflicts.is_empty() {
        debug!(patches = patches.len(), "no conflicts, all patches resolved");
        return ResolvedPatchSet {
            unresolved_conflicts: Vec::new(),
            resolved_patches: patches,
        };
    }

    let unresolved_conflicts = unresolved_hashes(conflicts, resolutions);
    let resolved_patches = resolve_conflicts(&patches, conflicts, resolutions, custom_resolutions);

    info!(
        resolved = resolved_patches.len(),
        unresolved = unresolved_conflicts.len(),
        "patch resolution complete"
    );

    ResolvedPatchSet {
        unresolved_conflicts,
        resolved_patches,
    }
}

/// Option hashes of conflicts whose path has no resolution, first-seen order.
fn unresolved_hashes(
    conflicts: &[ConflictDetail],
    resolutions: &[ConflictResolution],
) -> Vec<String> {
    let mut hashes: Vec<String> = Vec::new();
    for conflict in conflicts {
        if resolutions.iter().any(|r| r.path == conflict.path) {
            continue;
        }
        for option in &conflict.options {
            if !hashes.contains(option) {
                hashes.push(option.clone());
            }
        }
    }
    hashes
}
