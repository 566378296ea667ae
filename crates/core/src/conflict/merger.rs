//! Patch merge engine.
//!
//! Combines a flat patch list with the conflict list and the chosen
//! resolutions into a single merged patch list.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::models::{ConflictDetail, ConflictResolution, CustomConflictResolution, Patch};

/// Return the first patch whose hash equals `hash`.
pub fn find_patch_by_hash<'a>(patches: &'a [Patch], hash: &str) -> Option<&'a Patch> {
    patches.iter().find(|p| p.hash == hash)
}

/// Merge `patches` according to `conflicts`, `resolutions` and custom overrides.
///
/// Output order: patches on non-conflicting paths (input order), then one
/// selected patch per conflict (conflict order, identical patches collapsed),
/// then every custom patch in the order given. A custom patch is not
/// deduplicated against the patch selected for the same path.
///
/// With no conflicts the input is returned unchanged and custom resolutions
/// are not consulted.
pub fn resolve_conflicts(
    patches: &[Patch],
    conflicts: &[ConflictDetail],
    resolutions: &[ConflictResolution],
    custom_resolutions: &[CustomConflictResolution],
) -> Vec<Patch> {
    if conflicts.is_empty() {
        debug!(patches = patches.len(), "no conflicts, passing patches through");
        return patches.to_vec();
    }

    info!(
        patches = patches.len(),
        conflicts = conflicts.len(),
        resolutions = resolutions.len(),
        custom = custom_resolutions.len(),
        "resolving conflicts"
    );

    let conflicting: HashSet<&str> = conflicts.iter().map(|c| c.path.as_str()).collect();

    let mut merged: Vec<Patch> = patches
        .iter()
        .filter(|p| !conflicting.contains(p.path.as_str()))
        .cloned()
        .collect();

    let mut selected: Vec<&Patch> = Vec::new();
    for conflict in conflicts {
        match select_patch(patches, conflict, resolutions) {
            Some(patch) => {
                if !selected.contains(&patch) {
                    selected.push(patch);
                }
            }
            None => debug!(path = %conflict.path, "nothing selected for conflict"),
        }
    }

    merged.extend(selected.into_iter().cloned());
    merged.extend(custom_resolutions.iter().map(|c| c.patch.clone()));

    debug!(merged = merged.len(), "merge complete");
    merged
}

/// Pick the winning patch for one conflict.
///
/// A resolution naming a valid option wins even if its lookup misses; any
/// other case falls back to the first option.
fn select_patch<'a>(
    patches: &'a [Patch],
    conflict: &ConflictDetail,
    resolutions: &[ConflictResolution],
) -> Option<&'a Patch> {
    let resolution = resolutions.iter().find(|r| r.path == conflict.path);

    match resolution {
        Some(r) if conflict.has_option(&r.selected_hash) => {
            find_patch_by_hash(patches, &r.selected_hash)
        }
        _ => {
            let first = conflict.options.first()?;
            if let Some(r) = resolution {
                debug!(
                    path = %conflict.path,
                    selected = %r.selected_hash,
                    "selected hash is not a candidate, using first option"
                );
            }
            find_patch_by_hash(patches, first)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PatchOp;
    use serde_json::json;

    fn patch(op: PatchOp, path: &str, hash: &str) -> Patch {
        Patch::with_hash(op, path, Some(json!(hash)), hash)
    }

    fn sample() -> (Vec<Patch>, Vec<ConflictDetail>) {
        let patches = vec![
            patch(PatchOp::Add, "/a", "h1"),
            patch(PatchOp::Add, "/a", "h2"),
            patch(PatchOp::Replace, "/b", "h3"),
        ];
        let conflicts = vec![ConflictDetail::new("/a", vec!["h1".into(), "h2".into()])];
        (patches, conflicts)
    }

    fn hashes(patches: &[Patch]) -> Vec<&str> {
        patches.iter().map(|p| p.hash.as_str()).collect()
    }

    #[test]
    fn test_find_patch_by_hash() {
        let (patches, _) = sample();
        assert_eq!(find_patch_by_hash(&patches, "h2").map(|p| p.path.as_str()), Some("/a"));
        assert!(find_patch_by_hash(&patches, "missing").is_none());
        assert!(find_patch_by_hash(&[], "h1").is_none());
    }

    #[test]
    fn test_find_returns_first_match() {
        let patches = vec![
            patch(PatchOp::Add, "/first", "dup"),
            patch(PatchOp::Add, "/second", "dup"),
        ];
        assert_eq!(find_patch_by_hash(&patches, "dup").unwrap().path, "/first");
    }

    #[test]
    fn test_no_conflicts_passes_through() {
        let patches = vec![
            patch(PatchOp::Add, "/a", "h1"),
            patch(PatchOp::Add, "/a", "h1"),
            patch(PatchOp::Remove, "/z", "h9"),
        ];
        let custom = vec![CustomConflictResolution::new(
            "/a",
            patch(PatchOp::Replace, "/a", "c1"),
        )];
        let merged = resolve_conflicts(&patches, &[], &[], &custom);
        assert_eq!(merged, patches);
    }

    #[test]
    fn test_default_first_option() {
        let (patches, conflicts) = sample();
        let merged = resolve_conflicts(&patches, &conflicts, &[], &[]);
        assert_eq!(hashes(&merged), vec!["h3", "h1"]);
    }

    #[test]
    fn test_explicit_selection() {
        let (patches, conflicts) = sample();
        let resolutions = vec![ConflictResolution::new("/a", "h2")];
        let merged = resolve_conflicts(&patches, &conflicts, &resolutions, &[]);
        assert_eq!(hashes(&merged), vec!["h3", "h2"]);
    }

    #[test]
    fn test_invalid_selection_falls_back_to_first() {
        let (patches, conflicts) = sample();
        let resolutions = vec![ConflictResolution::new("/a", "h3")];
        let merged = resolve_conflicts(&patches, &conflicts, &resolutions, &[]);
        assert_eq!(hashes(&merged), vec!["h3", "h1"]);
    }

    #[test]
    fn test_valid_selection_with_lookup_miss_contributes_nothing() {
        let (patches, _) = sample();
        let conflicts = vec![ConflictDetail::new(
            "/a",
            vec!["h1".into(), "ghost".into()],
        )];
        let resolutions = vec![ConflictResolution::new("/a", "ghost")];
        let merged = resolve_conflicts(&patches, &conflicts, &resolutions, &[]);
        assert_eq!(hashes(&merged), vec!["h3"]);
    }

    #[test]
    fn test_empty_options_contribute_nothing() {
        let (patches, _) = sample();
        let conflicts = vec![ConflictDetail::new("/a", vec![])];
        let merged = resolve_conflicts(&patches, &conflicts, &[], &[]);
        assert_eq!(hashes(&merged), vec!["h3"]);
    }

    #[test]
    fn test_custom_appended_alongside_selection() {
        let (patches, conflicts) = sample();
        let custom_patch = patch(PatchOp::Replace, "/a", "custom");
        let custom = vec![CustomConflictResolution::new("/a", custom_patch.clone())];
        let merged = resolve_conflicts(&patches, &conflicts, &[], &custom);

        assert_eq!(hashes(&merged), vec!["h3", "h1", "custom"]);
        assert_eq!(merged.last(), Some(&custom_patch));
    }

    #[test]
    fn test_identical_selections_collapse() {
        let shared = patch(PatchOp::Add, "/a", "h1");
        let patches = vec![shared.clone(), patch(PatchOp::Add, "/a", "h2")];
        let conflicts = vec![
            ConflictDetail::new("/a", vec!["h1".into(), "h2".into()]),
            ConflictDetail::new("/a", vec!["h1".into()]),
        ];
        let merged = resolve_conflicts(&patches, &conflicts, &[], &[]);
        assert_eq!(merged, vec![shared]);
    }

    #[test]
    fn test_non_conflicting_order_preserved() {
        let patches = vec![
            patch(PatchOp::Add, "/z", "z"),
            patch(PatchOp::Add, "/a", "h1"),
            patch(PatchOp::Add, "/m", "m"),
            patch(PatchOp::Add, "/a", "h2"),
            patch(PatchOp::Add, "/b", "b"),
        ];
        let conflicts = vec![ConflictDetail::new("/a", vec!["h2".into(), "h1".into()])];
        let merged = resolve_conflicts(&patches, &conflicts, &[], &[]);
        assert_eq!(hashes(&merged), vec!["z", "m", "b", "h2"]);
    }
}
