//! Domain model types shared by the merge operations, the session and the CLI.
//!
//! All types serialize with the camelCase field names used on the wire
//! (`selectedHash`, `resolvedPatches`, ...), so request files produced by
//! other tools can be read directly.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

// ---------------------------------------------------------------------------
// Patch
// ---------------------------------------------------------------------------

/// The kind of mutation a patch performs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Remove,
    Replace,
}

impl PatchOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Replace => "replace",
        }
    }
}

impl std::fmt::Display for PatchOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single JSON document mutation identified by its content hash.
///
/// Two patches with the same `hash` are interchangeable within one merge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patch {
    pub op: PatchOp,
    /// JSON Pointer to the target location (e.g. `/users/0/name`).
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Stable content hash. Empty when the producer did not supply one.
    #[serde(default)]
    pub hash: String,
}

impl Patch {
    /// Build a patch and compute its content hash.
    pub fn new(op: PatchOp, path: impl Into<String>, value: Option<Value>) -> Self {
        let path = path.into();
        let hash = Self::compute_hash(op, &path, value.as_ref());
        Self {
            op,
            path,
            value,
            hash,
        }
    }

    /// Build a patch with an explicit, caller-chosen hash.
    pub fn with_hash(
        op: PatchOp,
        path: impl Into<String>,
        value: Option<Value>,
        hash: impl Into<String>,
    ) -> Self {
        Self {
            op,
            path: path.into(),
            value,
            hash: hash.into(),
        }
    }

    /// Hex SHA-256 over the compact JSON form of `{op, path, value}`.
    ///
    /// Object keys serialize in sorted order, so the hash does not depend on
    /// how the value was constructed.
    pub fn compute_hash(op: PatchOp, path: &str, value: Option<&Value>) -> String {
        let canonical = serde_json::json!({
            "op": op.as_str(),
            "path": path,
            "value": value.cloned().unwrap_or(Value::Null),
        });
        let digest = Sha256::digest(canonical.to_string().as_bytes());
        hex::encode(digest)
    }

    /// Fill in the hash from the patch content if it is empty.
    pub fn with_computed_hash(mut self) -> Self {
        self.fill_hash();
        self
    }

    /// In-place form of [`Patch::with_computed_hash`].
    pub fn fill_hash(&mut self) {
        if self.hash.is_empty() {
            self.hash = Self::compute_hash(self.op, &self.path, self.value.as_ref());
        }
    }
}

// ---------------------------------------------------------------------------
// Conflicts and resolutions
// ---------------------------------------------------------------------------

/// A path targeted by competing patches, with their hashes in candidate order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConflictDetail {
    pub path: String,
    #[serde(default)]
    pub options: Vec<String>,
}

impl ConflictDetail {
    pub fn new(path: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    /// Whether `hash` is one of this conflict's candidates.
    pub fn has_option(&self, hash: &str) -> bool {
        self.options.iter().any(|o| o == hash)
    }
}

/// A user's (or default) choice of the winning hash for a conflicting path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConflictResolution {
    pub path: String,
    pub selected_hash: String,
}

impl ConflictResolution {
    pub fn new(path: impl Into<String>, selected_hash: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            selected_hash: selected_hash.into(),
        }
    }
}

/// A caller-authored patch for a path, appended to the merge unconditionally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomConflictResolution {
    pub path: String,
    pub patch: Patch,
}

impl CustomConflictResolution {
    pub fn new(path: impl Into<String>, patch: Patch) -> Self {
        Self {
            path: path.into(),
            patch,
        }
    }
}

// ---------------------------------------------------------------------------
// Merge result
// ---------------------------------------------------------------------------

/// Output of [`generate_resolved_patch`](crate::conflict::generate_resolved_patch).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPatchSet {
    /// Option hashes of every conflict that has no user resolution.
    pub unresolved_conflicts: Vec<String>,
    /// The merged patch list.
    pub resolved_patches: Vec<Patch>,
}

impl ResolvedPatchSet {
    pub fn is_fully_resolved(&self) -> bool {
        self.unresolved_conflicts.is_empty()
    }
}
