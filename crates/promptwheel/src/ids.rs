//! Stable per-window record identifiers.
//!
//! The storage layer files each entry under an id combining the window
//! seed, a positional index, and the entity type: `"{seed}-{idx}:{type}"`.
//! Selected activities use their position in the returned list; manual
//! entries use `"manual{created_ms}"` so several can coexist per window.
//! The engine never persists anything itself — these helpers are the
//! interface boundary to whatever does.

use std::fmt::Display;

/// Build a record id from a window seed, an index, and an entity type.
pub fn entity_id(seed: &str, idx: impl Display, entity_type: &str) -> String {
    format!("{seed}-{idx}:{entity_type}")
}

/// Index component for a manual entry created at `created_ms`.
pub fn manual_entity_idx(created_ms: i64) -> String {
    format!("manual{created_ms}")
}

/// Extract the index component from a record id, if well-formed.
///
/// Splits on the last `-` before the type suffix: seeds of pre-epoch
/// windows are negative and carry a leading `-` of their own.
pub fn parse_entity_idx(entity_id: &str) -> Option<&str> {
    let (_, idx) = entity_id.split(':').next()?.rsplit_once('-')?;
    Some(idx)
}
