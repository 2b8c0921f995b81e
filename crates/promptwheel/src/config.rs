//! Catalog: the static configuration document driving selection.
//!
//! One JSON document holds the activity pool, the always-available manual
//! entry template, the time-of-day threshold table, and an optional
//! rarity-weight override table. The document is schema-checked against
//! the derived JSON Schema before deserialization so misconfigurations
//! produce pointed instance-path messages; deserialization remains the
//! source of truth.
//!
//! A second, user-supplied catalog can be merged over the base with
//! [`Catalog::merged_with`]: overlay activities replace by id or append,
//! `"enabled": false` drops a definition, an overlay time table replaces
//! the base table wholesale, and overlay rarity weights merge per label.

use crate::activity::ActivityDefinition;
use crate::window::TimeOfDayTable;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// The full configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    /// The selectable activity pool.
    pub activities: Vec<ActivityDefinition>,
    /// Template for unprompted entries; never competes with the pool but
    /// resolves choices the same way.
    pub manual_activity: ActivityDefinition,
    /// Tables shared by every pass.
    #[serde(default)]
    pub config: CatalogConfig,
}

/// Catalog-wide tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogConfig {
    /// Ascending hour-threshold → period-label table.
    #[serde(default)]
    pub time_names: TimeOfDayTable,
    /// Optional rarity-weight overrides, merged over the built-in table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarity_weights: Option<HashMap<String, f64>>,
}

/// A partial catalog merged over a base one.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogOverlay {
    /// Activities to replace (by id) or append. An entry with
    /// `"enabled": false` drops the definition entirely.
    #[serde(default)]
    pub activities: Vec<ActivityDefinition>,
    /// Replacement manual-entry template.
    #[serde(default)]
    pub manual_activity: Option<ActivityDefinition>,
    /// Table overrides.
    #[serde(default)]
    pub config: Option<CatalogConfig>,
}

impl Catalog {
    /// Parse a catalog from a JSON string.
    pub fn from_json_str(raw: &str) -> Result<Self, String> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| format!("catalog is not valid JSON: {e}"))?;
        Self::from_json_value(value)
    }

    /// Validate a raw JSON document against the catalog schema, then
    /// deserialize it.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, String> {
        validate_against_schema::<Self>(&value, "catalog")?;
        serde_json::from_value(value).map_err(|e| format!("invalid catalog: {e}"))
    }

    /// Merge an overlay catalog over this one.
    pub fn merged_with(&self, overlay: &CatalogOverlay) -> Catalog {
        let mut merged = self.clone();
        for activity in &overlay.activities {
            match merged.activities.iter_mut().find(|a| a.id == activity.id) {
                Some(existing) => *existing = activity.clone(),
                None => merged.activities.push(activity.clone()),
            }
        }
        let before = merged.activities.len();
        merged.activities.retain(|a| a.enabled);
        if merged.activities.len() < before {
            debug!(
                "[catalog] overlay disabled {} activities",
                before - merged.activities.len()
            );
        }

        if let Some(manual) = &overlay.manual_activity {
            merged.manual_activity = manual.clone();
        }
        if let Some(config) = &overlay.config {
            if !config.time_names.is_empty() {
                merged.config.time_names = config.time_names.clone();
            }
            if let Some(weights) = &config.rarity_weights {
                merged
                    .config
                    .rarity_weights
                    .get_or_insert_with(HashMap::new)
                    .extend(weights.iter().map(|(k, v)| (k.clone(), *v)));
            }
        }
        merged
    }
}

impl CatalogOverlay {
    /// Parse an overlay from a JSON string.
    pub fn from_json_str(raw: &str) -> Result<Self, String> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| format!("overlay is not valid JSON: {e}"))?;
        validate_against_schema::<Self>(&value, "overlay")?;
        serde_json::from_value(value).map_err(|e| format!("invalid overlay: {e}"))
    }
}

/// Check `value` against the JSON Schema derived for `T`.
///
/// Exists for error quality: schema errors carry the offending instance
/// path, which beats serde's single-line message for deeply nested
/// documents. An unbuildable schema skips validation rather than failing.
fn validate_against_schema<T: JsonSchema>(
    value: &serde_json::Value,
    what: &str,
) -> Result<(), String> {
    let schema = match serde_json::to_value(schemars::schema_for!(T)) {
        Ok(schema) => schema,
        Err(_) => return Ok(()),
    };
    let Ok(validator) = jsonschema::validator_for(&schema) else {
        return Ok(());
    };
    let errors: Vec<String> = validator
        .iter_errors(value)
        .map(|e| format!("  - {}: {e}", e.instance_path()))
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(format!("{what} failed validation:\n{}", errors.join("\n")))
    }
}
