//! Apply a merged patch list to a JSON document.
//!
//! Patches are converted to RFC 6902 operations and applied in order with
//! the `json-patch` crate. Unlike merging, application is strict: the first
//! failing operation aborts and is reported.

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::errors::ApplyError;
use crate::models::{Patch, PatchOp};

/// Apply `patches` in order to a copy of `document`.
pub fn apply_patches(document: &Value, patches: &[Patch]) -> Result<Value, ApplyError> {
    info!(patches = patches.len(), "applying patches to document");

    let operations = patches
        .iter()
        .map(to_operation)
        .collect::<Result<Vec<Value>, ApplyError>>()?;

    let patch: json_patch::Patch = serde_json::from_value(Value::Array(operations))
        .map_err(|e| ApplyError::InvalidPatch(e.to_string()))?;

    let mut doc = document.clone();
    json_patch::patch(&mut doc, &patch.0).map_err(|e| ApplyError::Failed(e.to_string()))?;

    debug!("patches applied");
    Ok(doc)
}

/// Strip the hash and build the RFC 6902 form of one patch.
fn to_operation(patch: &Patch) -> Result<Value, ApplyError> {
    match (patch.op, &patch.value) {
        (PatchOp::Remove, _) => Ok(json!({ "op": "remove", "path": patch.path })),
        (op, Some(value)) => Ok(json!({ "op": op.as_str(), "path": patch.path, "value": value })),
        (op, None) => Err(ApplyError::MissingValue {
            op: op.to_string(),
            path: patch.path.clone(),
        }),
    }
}
