//! Choice resolver: flattens every choice node in a content tree.
//!
//! Walks the tree recursively; wherever it finds a choice node it draws
//! exactly one eligible alternative through the weighted sampler and
//! recurses into it, so the choice node itself never survives. Composite
//! nodes keep their structure and order; scalars pass through unchanged.
//!
//! Alternatives carry their own optional conditions, so a choice can be
//! time-of-day- or frequency-gated per branch. Each choice node starts a
//! fresh exclusive-tag accumulator; exclusivity binds alternatives of one
//! choice, not branches across the tree.

use crate::content::{ChoiceAlternative, ContentNode};
use crate::filter::FilterContext;
use crate::sampler::{self, RarityWeights};
use rand::Rng;

/// Resolve `node` into a tree with no remaining choice nodes.
///
/// Fails loudly on a malformed tree: a choice node with zero
/// alternatives, or one whose alternatives are all filtered out, is a
/// configuration error rather than an empty result.
pub fn flatten(
    node: &ContentNode,
    weights: &RarityWeights,
    ctx: &FilterContext<'_>,
    rng: &mut impl Rng,
) -> Result<ContentNode, String> {
    match node {
        ContentNode::Choice(choice) => {
            if choice.choices.is_empty() {
                return Err("choice node has no alternatives".to_string());
            }
            let pool: Vec<&ChoiceAlternative> = choice.choices.iter().collect();
            let drawn = sampler::draw_distinct(&pool, 1, weights, ctx, rng);
            let Some(alternative) = drawn.first() else {
                return Err(format!(
                    "no eligible alternative among {} at timeOfDay '{}'",
                    choice.choices.len(),
                    ctx.time_of_day
                ));
            };
            flatten(&alternative.node, weights, ctx, rng)
        }
        ContentNode::Mapping(entries) => {
            let resolved = entries
                .iter()
                .map(|(key, value)| Ok((key.clone(), flatten(value, weights, ctx, rng)?)))
                .collect::<Result<Vec<_>, String>>()?;
            Ok(ContentNode::Mapping(resolved))
        }
        ContentNode::Sequence(items) => {
            let resolved = items
                .iter()
                .map(|item| flatten(item, weights, ctx, rng))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ContentNode::Sequence(resolved))
        }
        ContentNode::Scalar(value) => Ok(ContentNode::Scalar(value.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use serde_json::json;
    use std::collections::HashMap;

    fn test_ctx(last: &HashMap<String, i64>) -> FilterContext<'_> {
        FilterContext {
            time_of_day: "evening",
            seed: "42",
            now: DateTime::from_timestamp_millis(1_717_588_800_000)
                .unwrap()
                .fixed_offset(),
            last_activity_times: last,
        }
    }

    fn resolve(raw: serde_json::Value, rng_seed: u64) -> Result<serde_json::Value, String> {
        let node = ContentNode::from_value(&raw).unwrap();
        let last = HashMap::new();
        let mut rng = ChaCha8Rng::seed_from_u64(rng_seed);
        flatten(&node, &RarityWeights::builtin(), &test_ctx(&last), &mut rng)?.to_value()
    }

    #[test]
    fn tree_without_choices_is_unchanged() {
        let raw = json!([
            {"type": "title", "text": "Evening check-in"},
            {"type": "input/multi-line", "field": "content"},
            42,
        ]);
        assert_eq!(resolve(raw.clone(), 1).unwrap(), raw);
    }

    #[test]
    fn choice_node_is_replaced_by_one_alternative() {
        let raw = json!({
            "type": "choice",
            "choices": [
                {"type": "title", "text": "a"},
                {"type": "title", "text": "b"},
            ],
        });
        let resolved = resolve(raw, 1).unwrap();
        assert_eq!(resolved["type"], "title");
        let text = resolved["text"].as_str().unwrap();
        assert!(text == "a" || text == "b");
    }

    #[test]
    fn nested_choices_resolve_to_zero_choice_nodes() {
        let raw = json!({
            "intro": "pick one",
            "body": {
                "type": "choice",
                "choices": [
                    {
                        "type": "choice",
                        "choices": [{"text": "deep-a"}, {"text": "deep-b"}],
                    },
                    {"text": "shallow"},
                ],
            },
            "steps": [{"type": "choice", "choices": ["x", "y"]}],
        });
        for seed in 0..20 {
            let node = ContentNode::from_value(&raw).unwrap();
            let last = HashMap::new();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let resolved =
                flatten(&node, &RarityWeights::builtin(), &test_ctx(&last), &mut rng).unwrap();
            assert!(!resolved.contains_choice(), "seed {seed} left a choice node");
        }
    }

    #[test]
    fn composite_structure_and_order_survive_resolution() {
        let raw = json!({
            "zeta": 1,
            "alpha": {"type": "choice", "choices": ["only"]},
            "omega": [true, null],
        });
        let resolved = resolve(raw, 3).unwrap();
        let keys: Vec<&str> = resolved.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["zeta", "alpha", "omega"]);
        assert_eq!(resolved["alpha"], "only");
        assert_eq!(resolved["omega"], json!([true, null]));
    }

    #[test]
    fn empty_choice_fails_loudly() {
        let err = resolve(json!({"type": "choice", "choices": []}), 1).unwrap_err();
        assert!(err.contains("no alternatives"), "unexpected error: {err}");
    }

    #[test]
    fn fully_filtered_choice_fails_loudly() {
        let raw = json!({
            "type": "choice",
            "choices": [
                {"text": "morning only", "conditions": {"timeOfDay": ["morning"]}},
            ],
        });
        let err = resolve(raw, 1).unwrap_err();
        assert!(err.contains("no eligible alternative"), "unexpected error: {err}");
    }

    #[test]
    fn alternative_conditions_gate_the_draw() {
        let raw = json!({
            "type": "choice",
            "choices": [
                {"text": "morning only", "conditions": {"timeOfDay": ["morning"]}},
                {"text": "evening only", "conditions": {"timeOfDay": ["evening"]}},
            ],
        });
        for seed in 0..20 {
            let resolved = resolve(raw.clone(), seed).unwrap();
            assert_eq!(resolved["text"], "evening only", "seed {seed}");
        }
    }

    #[test]
    fn weighted_alternatives_respect_rarity() {
        let raw = json!({
            "type": "choice",
            "choices": [
                {"text": "heavy", "rarity": "xx-common"},
                {"text": "light", "rarity": "x-rare"},
            ],
        });
        let mut heavy = 0u32;
        for seed in 0..400 {
            if resolve(raw.clone(), seed).unwrap()["text"] == "heavy" {
                heavy += 1;
            }
        }
        // 4.0 vs 0.125: heavy should win the overwhelming majority.
        assert!(heavy > 360, "heavy drawn only {heavy}/400 times");
    }
}
