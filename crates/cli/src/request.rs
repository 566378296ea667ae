//! Merge request files.
//!
//! A request is either a full object
//! (`{"patchGroups": [...], "conflicts": [...], "resolutions": [...], "customResolutions": [...]}`)
//! or a bare array of patch groups. Patches without a hash get one computed
//! from their content.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use patchmerge_core::{
    ConflictDetail, ConflictResolution, CustomConflictResolution, MergeSession, Patch,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    #[serde(default)]
    pub patch_groups: Vec<Vec<Patch>>,
    /// Absent means "detect from the patch groups".
    #[serde(default)]
    pub conflicts: Option<Vec<ConflictDetail>>,
    #[serde(default)]
    pub resolutions: Vec<ConflictResolution>,
    #[serde(default)]
    pub custom_resolutions: Vec<CustomConflictResolution>,
}

impl MergeRequest {
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).context("invalid merge request")?;
        let request = match value {
            Value::Array(_) => MergeRequest {
                patch_groups: serde_json::from_value(value).context("invalid merge request")?,
                ..Default::default()
            },
            Value::Object(_) => serde_json::from_value(value).context("invalid merge request")?,
            _ => bail!("invalid merge request: expected a JSON array or object"),
        };
        Ok(request.with_hashes())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let request = Self::parse(&text).with_context(|| format!("in {}", path.display()))?;
        debug!(
            path = %path.display(),
            groups = request.patch_groups.len(),
            "merge request loaded"
        );
        Ok(request)
    }

    fn with_hashes(mut self) -> Self {
        self.patch_groups = self
            .patch_groups
            .into_iter()
            .map(|group| group.into_iter().map(Patch::with_computed_hash).collect())
            .collect();
        for custom in &mut self.custom_resolutions {
            custom.patch.fill_hash();
        }
        self
    }

    /// Build the session, detecting conflicts when none were supplied.
    pub fn into_session(self) -> MergeSession {
        let session = match self.conflicts {
            Some(conflicts) => MergeSession::with_conflicts(self.patch_groups, conflicts),
            None => MergeSession::new(self.patch_groups),
        };
        session
            .with_resolutions(self.resolutions)
            .with_custom_resolutions(self.custom_resolutions)
    }
}

/// Read any JSON document from disk.
pub fn load_document(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}
