//! Merge session state.
//!
//! A [`MergeSession`] holds everything an interactive shell tracks while a
//! user works through conflicts: the patch groups, the detected conflicts,
//! the resolutions chosen so far and any custom patches. The shell owns and
//! mutates the session; resolving it calls the pure merge functions.

use serde_json::Value;
use tracing::{debug, info};

use crate::apply::apply_patches;
use crate::conflict::{detect_conflicts, generate_resolved_patch, initialize_resolutions};
use crate::errors::{ConflictError, CoreError};
use crate::models::{
    ConflictDetail, ConflictResolution, CustomConflictResolution, Patch, ResolvedPatchSet,
};

#[derive(Debug, Clone, Default)]
pub struct MergeSession {
    patch_groups: Vec<Vec<Patch>>,
    conflicts: Vec<ConflictDetail>,
    resolutions: Vec<ConflictResolution>,
    custom_resolutions: Vec<CustomConflictResolution>,
}

impl MergeSession {
    /// Start a session over `patch_groups`, detecting conflicts between them.
    pub fn new(patch_groups: Vec<Vec<Patch>>) -> Self {
        let conflicts = detect_conflicts(&patch_groups);
        Self::with_conflicts(patch_groups, conflicts)
    }

    /// Start a session with a conflict list computed elsewhere.
    pub fn with_conflicts(patch_groups: Vec<Vec<Patch>>, conflicts: Vec<ConflictDetail>) -> Self {
        info!(
            groups = patch_groups.len(),
            conflicts = conflicts.len(),
            "merge session started"
        );
        Self {
            patch_groups,
            conflicts,
            resolutions: Vec::new(),
            custom_resolutions: Vec::new(),
        }
    }

    /// Take `resolutions` as given. Unlike [`select`](Self::select) these are
    /// not validated; the merge ignores ones that match no option.
    pub fn with_resolutions(mut self, resolutions: Vec<ConflictResolution>) -> Self {
        self.resolutions = resolutions;
        self
    }

    pub fn with_custom_resolutions(mut self, custom: Vec<CustomConflictResolution>) -> Self {
        self.custom_resolutions = custom;
        self
    }

    /// Seed first-option defaults for every conflict not already resolved.
    pub fn with_default_resolutions(mut self) -> Self {
        for default in initialize_resolutions(&self.conflicts) {
            if !self.resolutions.iter().any(|r| r.path == default.path) {
                self.resolutions.push(default);
            }
        }
        self
    }

    pub fn patch_groups(&self) -> &[Vec<Patch>] {
        &self.patch_groups
    }

    pub fn conflicts(&self) -> &[ConflictDetail] {
        &self.conflicts
    }

    pub fn resolutions(&self) -> &[ConflictResolution] {
        &self.resolutions
    }

    pub fn custom_resolutions(&self) -> &[CustomConflictResolution] {
        &self.custom_resolutions
    }

    /// All patches across groups, in group order.
    pub fn patches(&self) -> impl Iterator<Item = &Patch> {
        self.patch_groups.iter().flatten()
    }

    /// Conflict paths the user has not chosen for yet.
    pub fn pending_paths(&self) -> Vec<&str> {
        self.conflicts
            .iter()
            .filter(|c| !self.resolutions.iter().any(|r| r.path == c.path))
            .map(|c| c.path.as_str())
            .collect()
    }

    /// Record (or replace) the user's choice for `path`.
    pub fn select(&mut self, path: &str, hash: &str) -> Result<(), ConflictError> {
        let conflict = self
            .conflicts
            .iter()
            .find(|c| c.path == path)
            .ok_or_else(|| ConflictError::NotFound(path.to_string()))?;

        if !conflict.has_option(hash) {
            return Err(ConflictError::InvalidResolution {
                path: path.to_string(),
                hash: hash.to_string(),
            });
        }

        match self.resolutions.iter_mut().find(|r| r.path == path) {
            Some(existing) => existing.selected_hash = hash.to_string(),
            None => self.resolutions.push(ConflictResolution::new(path, hash)),
        }
        debug!(path, hash, "resolution selected");
        Ok(())
    }

    /// Record (or replace) the custom patch for `custom.path`.
    pub fn set_custom(&mut self, custom: CustomConflictResolution) {
        debug!(path = %custom.path, hash = %custom.patch.hash, "custom resolution set");
        match self
            .custom_resolutions
            .iter_mut()
            .find(|c| c.path == custom.path)
        {
            Some(existing) => *existing = custom,
            None => self.custom_resolutions.push(custom),
        }
    }

    /// Drop the custom patch for `path`. Returns whether one was present.
    pub fn clear_custom(&mut self, path: &str) -> bool {
        let before = self.custom_resolutions.len();
        self.custom_resolutions.retain(|c| c.path != path);
        before != self.custom_resolutions.len()
    }

    pub fn resolve(&self) -> ResolvedPatchSet {
        generate_resolved_patch(
            &self.patch_groups,
            &self.conflicts,
            &self.resolutions,
            &self.custom_resolutions,
        )
    }

    /// Resolve, then apply the merged patches to `base`.
    pub fn apply_to(&self, base: &Value) -> Result<Value, CoreError> {
        Ok(apply_patches(base, &self.resolve().resolved_patches)?)
    }
}
