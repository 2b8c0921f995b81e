//! Activity definitions and their eligibility conditions.
//!
//! An activity is one configured writing prompt: an id, an optional rarity
//! label, optional eligibility conditions, a content tree, and the entity
//! type its entries are stored under. Definitions are loaded once from the
//! catalog and never mutated.
//!
//! Conditions are a closed vocabulary modeled as a struct of optional typed
//! fields rather than a stringly-keyed map: unknown condition keys are
//! rejected at deserialization time (`deny_unknown_fields`), and untyped
//! JSON blobs go through [`ConditionSet::from_value`], which produces the
//! same hard failure with a pointed message. Silently ignoring a
//! misconfigured rule could select an activity that should have been
//! excluded.

use crate::content::ContentNode;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A configured writing prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDefinition {
    /// Unique id within the pool; also the key into the last-activity-time
    /// map.
    pub id: String,
    /// Rarity label controlling sampling weight. Absent means `"uncommon"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarity: Option<String>,
    /// Whether this definition participates in selection. Overlays set this
    /// to `false` to drop a base definition; disabled definitions are
    /// removed at load/merge time.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Eligibility conditions, all of which must pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<ConditionSet>,
    /// Renderable content tree. Required for enabled definitions; an
    /// overlay entry that only disables an existing id may omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ContentNode>,
    /// Storage entity descriptor. Required for enabled definitions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<EntityInfo>,
}

fn default_enabled() -> bool {
    true
}

/// Storage entity descriptor: the record type entries are filed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EntityInfo {
    /// Entity type name, e.g. `"journal"`.
    #[serde(rename = "type")]
    pub entity_type: String,
}

/// The closed set of recognized eligibility conditions.
///
/// Attachable to a top-level activity definition or to a choice
/// alternative inside a content tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConditionSet {
    /// Period names the activity is restricted to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<Vec<String>>,
    /// Re-eligibility rule relative to the last completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Frequency>,
    /// At most one selected activity per pass may carry a given label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_tags: Option<Vec<String>>,
}

const RECOGNIZED_CONDITIONS: [&str; 3] = ["timeOfDay", "frequency", "exclusiveTags"];

impl ConditionSet {
    /// Parse a raw JSON condition blob, hard-failing on unknown keys.
    ///
    /// Runtime fallback for condition data arriving through untyped paths
    /// (e.g. choice alternatives inside a content tree).
    pub fn from_value(value: &serde_json::Value) -> Result<Self, String> {
        let Some(map) = value.as_object() else {
            return Err(format!("conditions must be an object, got: {value}"));
        };
        for key in map.keys() {
            if !RECOGNIZED_CONDITIONS.contains(&key.as_str()) {
                return Err(format!("unexpected condition type '{key}'"));
            }
        }
        serde_json::from_value(value.clone()).map_err(|e| format!("invalid conditions: {e}"))
    }
}

/// How often an activity may recur: a bare unit implies a count of one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Frequency {
    /// `"day"` — once per calendar day.
    Unit(FrequencyUnit),
    /// `[2, "week"]` — once per two calendar weeks.
    Counted(i64, FrequencyUnit),
}

impl Frequency {
    pub fn count(&self) -> i64 {
        match self {
            Frequency::Unit(_) => 1,
            Frequency::Counted(count, _) => *count,
        }
    }

    pub fn unit(&self) -> FrequencyUnit {
        match self {
            Frequency::Unit(unit) | Frequency::Counted(_, unit) => *unit,
        }
    }
}

/// Calendar unit for frequency comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyUnit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

/// Anything the eligibility filter and weighted sampler can operate on:
/// top-level activity definitions and choice alternatives alike.
pub trait Selectable {
    /// Id used to look up the last completion time, if any.
    fn id(&self) -> Option<&str>;
    /// Declared rarity label, if any.
    fn rarity(&self) -> Option<&str>;
    /// Declared conditions, if any.
    fn conditions(&self) -> Option<&ConditionSet>;
}

impl Selectable for ActivityDefinition {
    fn id(&self) -> Option<&str> {
        Some(&self.id)
    }

    fn rarity(&self) -> Option<&str> {
        self.rarity.as_deref()
    }

    fn conditions(&self) -> Option<&ConditionSet> {
        self.conditions.as_ref()
    }
}
