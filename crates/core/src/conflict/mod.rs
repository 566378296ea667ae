//! Conflict detection, merging, and resolution defaults.
//!
//! The conflict subsystem is responsible for:
//! 1. **Detection** -- finding paths that patches from different groups compete for.
//! 2. **Merging** -- turning patch groups plus the chosen resolutions into one patch list.
//! 3. **Resolution** -- seeding first-option defaults and reporting what is still unresolved.
//!
//! Merging is best-effort: a resolution that points nowhere, or a conflict
//! with no options, contributes nothing instead of failing.

pub mod detector;
pub mod merger;
pub mod resolver;

pub use detector::detect_conflicts;
pub use merger::{find_patch_by_hash, resolve_conflicts};
pub use resolver::{generate_resolved_patch, initialize_resolutions};
