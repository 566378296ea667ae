//! Interactive conflict selection.

use anyhow::{Context, Result};
use dialoguer::Select;

use patchmerge_core::{ConflictDetail, MergeSession};

use crate::style;

/// Ask the user to pick a winner for every conflict that has options.
///
/// The current resolution (or the first option) is preselected.
pub fn choose_resolutions(session: &mut MergeSession) -> Result<()> {
    let conflicts: Vec<ConflictDetail> = session.conflicts().to_vec();

    for conflict in conflicts.iter().filter(|c| !c.options.is_empty()) {
        let items: Vec<String> = conflict
            .options
            .iter()
            .map(|hash| describe_option(session, hash))
            .collect();

        let current = session
            .resolutions()
            .iter()
            .find(|r| r.path == conflict.path)
            .and_then(|r| conflict.options.iter().position(|o| *o == r.selected_hash))
            .unwrap_or(0);

        let choice = Select::new()
            .with_prompt(format!("Conflict at {}", conflict.path))
            .items(&items)
            .default(current)
            .interact()
            .context("failed to read selection")?;

        session.select(&conflict.path, &conflict.options[choice])?;
    }

    Ok(())
}

/// One-line summary of the patch behind `hash`.
fn describe_option(session: &MergeSession, hash: &str) -> String {
    let short = style::short_hash(hash, 10);
    match session.patches().find(|p| p.hash == hash) {
        Some(patch) => {
            let value = patch
                .value
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".to_string());
            format!("{} {} = {}  {}", patch.op, patch.path, value, style::dim(&short))
        }
        None => format!("(no patch)  {}", style::dim(&short)),
    }
}
