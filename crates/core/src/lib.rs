//! patchmerge core library.
//!
//! This crate provides the data model for JSON Patch conflict resolution,
//! conflict detection across patch groups, the best-effort merge of those
//! groups under user or default resolutions, application of the merged
//! patches to a document, and the session state an interactive shell keeps.

pub mod apply;
pub mod config;
pub mod conflict;
pub mod errors;
pub mod models;
pub mod session;

// Re-exports for convenience.
pub use apply::apply_patches;
pub use config::AppConfig;
pub use conflict::{
    detect_conflicts, find_patch_by_hash, generate_resolved_patch, initialize_resolutions,
    resolve_conflicts,
};
pub use models::{
    ConflictDetail, ConflictResolution, CustomConflictResolution, Patch, PatchOp,
    ResolvedPatchSet,
};
pub use session::MergeSession;
