//! Content trees: the renderable body of an activity.
//!
//! A content tree is arbitrary nested JSON (titles, input widgets, steps)
//! with one special shape: an object whose `type` is `"choice"` means
//! "pick exactly one of these alternatives." Rather than ad hoc shape
//! checks, nodes are parsed into a tagged union — Scalar, Sequence,
//! Mapping, Choice — so the resolver's recursion is exhaustive and
//! statically checkable.
//!
//! Choice alternatives keep their full original shape in [`ChoiceAlternative::node`];
//! the `id`/`rarity`/`conditions` fields are extracted eagerly as a typed
//! view for the sampler, which also surfaces malformed alternative
//! conditions at catalog load instead of mid-pass.

use crate::activity::{ConditionSet, Selectable};
use serde::de::Error as DeError;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One node of a content tree, with choice nodes made explicit.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentNode {
    /// A leaf value: string, number, bool, or null.
    Scalar(Value),
    /// An ordered sequence of nodes.
    Sequence(Vec<ContentNode>),
    /// A keyed map of nodes, in document order.
    Mapping(Vec<(String, ContentNode)>),
    /// A "pick exactly one" node; never survives resolution.
    Choice(ChoiceNode),
}

/// The alternatives of a choice node.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceNode {
    pub choices: Vec<ChoiceAlternative>,
}

/// One alternative subtree of a choice node, with its sampling metadata
/// pulled out for the eligibility filter and weighted sampler.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceAlternative {
    /// Optional id; keys the last-activity-time lookup for `frequency`.
    pub id: Option<String>,
    /// Optional rarity label; absent alternatives weigh as `"uncommon"`,
    /// so an undeclared set samples effectively uniformly.
    pub rarity: Option<String>,
    /// Optional per-alternative conditions.
    pub conditions: Option<ConditionSet>,
    /// The full alternative subtree, metadata keys included.
    pub node: ContentNode,
}

impl ContentNode {
    /// Parse a raw JSON value into a content tree.
    ///
    /// An object with `"type": "choice"` becomes a [`ContentNode::Choice`];
    /// it must carry a `choices` array. Any other object becomes a
    /// mapping, arrays become sequences, and everything else is a scalar.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Object(map) => {
                if map.get("type").and_then(Value::as_str) == Some("choice") {
                    let Some(Value::Array(raw)) = map.get("choices") else {
                        return Err("choice node is missing a 'choices' array".to_string());
                    };
                    let choices = raw
                        .iter()
                        .map(ChoiceAlternative::from_value)
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(ContentNode::Choice(ChoiceNode { choices }))
                } else {
                    let entries = map
                        .iter()
                        .map(|(key, val)| Ok((key.clone(), ContentNode::from_value(val)?)))
                        .collect::<Result<Vec<_>, String>>()?;
                    Ok(ContentNode::Mapping(entries))
                }
            }
            Value::Array(items) => Ok(ContentNode::Sequence(
                items
                    .iter()
                    .map(ContentNode::from_value)
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            scalar => Ok(ContentNode::Scalar(scalar.clone())),
        }
    }

    /// Serialize back to plain JSON.
    pub fn to_value(&self) -> Result<Value, String> {
        serde_json::to_value(self).map_err(|e| format!("failed to serialize content: {e}"))
    }

    /// Whether any choice node remains anywhere in this tree.
    pub fn contains_choice(&self) -> bool {
        match self {
            ContentNode::Choice(_) => true,
            ContentNode::Sequence(items) => items.iter().any(ContentNode::contains_choice),
            ContentNode::Mapping(entries) => {
                entries.iter().any(|(_, node)| node.contains_choice())
            }
            ContentNode::Scalar(_) => false,
        }
    }
}

impl ChoiceAlternative {
    fn from_value(value: &Value) -> Result<Self, String> {
        let node = ContentNode::from_value(value)?;
        let (id, rarity, conditions) = match value {
            Value::Object(map) => {
                let conditions = match map.get("conditions") {
                    Some(raw) => Some(ConditionSet::from_value(raw)?),
                    None => None,
                };
                (
                    map.get("id").and_then(Value::as_str).map(str::to_string),
                    map.get("rarity").and_then(Value::as_str).map(str::to_string),
                    conditions,
                )
            }
            _ => (None, None, None),
        };
        Ok(Self {
            id,
            rarity,
            conditions,
            node,
        })
    }
}

impl Selectable for ChoiceAlternative {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn rarity(&self) -> Option<&str> {
        self.rarity.as_deref()
    }

    fn conditions(&self) -> Option<&ConditionSet> {
        self.conditions.as_ref()
    }
}

impl Serialize for ContentNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ContentNode::Scalar(value) => value.serialize(serializer),
            ContentNode::Sequence(items) => items.serialize(serializer),
            ContentNode::Mapping(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            ContentNode::Choice(choice) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "choice")?;
                map.serialize_entry("choices", &choice.choices)?;
                map.end()
            }
        }
    }
}

impl Serialize for ChoiceAlternative {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.node.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ContentNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        ContentNode::from_value(&value).map_err(D::Error::custom)
    }
}

// The schema stays permissive: content trees are free-form by design, and
// choice-node shape errors get pointed messages from `from_value` instead.
impl schemars::JsonSchema for ContentNode {
    fn schema_name() -> String {
        "ContentNode".to_string()
    }

    fn json_schema(_generator: &mut schemars::r#gen::SchemaGenerator) -> schemars::schema::Schema {
        schemars::schema::Schema::Bool(true)
    }
}
