//! Weighted sampler: deterministic CDF draws from a rarity-weighted pool.
//!
//! A single draw builds a running prefix sum of weights, draws uniformly
//! in `[0, total)`, and binary-searches the prefix sums — weighted
//! sampling, not uniform index sampling. Distinct draws repeat that while
//! re-running the eligibility filter between draws, so exclusivity
//! constraints triggered by an earlier draw are honored by later ones.
//!
//! Nothing here touches a global RNG: every function takes `&mut impl Rng`
//! seeded once per pass from the window seed, which is what makes draws
//! reproducible and tests replayable.

use crate::activity::Selectable;
use crate::filter::{self, FilterContext};
use rand::Rng;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Built-in rarity → weight table.
const BUILTIN_WEIGHTS: [(&str, f64); 6] = [
    ("xx-common", 4.0),
    ("x-common", 2.0),
    ("common", 1.0),
    ("uncommon", 0.5),
    ("rare", 0.25),
    ("x-rare", 0.125),
];

/// Rarity label used when a candidate declares none.
const DEFAULT_RARITY: &str = "uncommon";

/// The rarity-weight table for one catalog: built-ins merged with the
/// catalog's optional override table.
#[derive(Debug, Clone)]
pub struct RarityWeights {
    table: HashMap<String, f64>,
}

impl RarityWeights {
    /// The built-in table, no overrides.
    pub fn builtin() -> Self {
        Self {
            table: BUILTIN_WEIGHTS
                .iter()
                .map(|(label, weight)| ((*label).to_string(), *weight))
                .collect(),
        }
    }

    /// Built-ins with catalog overrides merged over them. Overrides may
    /// replace existing labels or introduce new ones, but every weight
    /// must be finite and positive.
    pub fn with_overrides(overrides: &HashMap<String, f64>) -> Result<Self, String> {
        let mut weights = Self::builtin();
        for (label, &weight) in overrides {
            if !weight.is_finite() || weight <= 0.0 {
                return Err(format!(
                    "rarity weight for '{label}' must be finite and > 0, got {weight}"
                ));
            }
            weights.table.insert(label.clone(), weight);
        }
        Ok(weights)
    }

    /// Weight for a candidate's rarity label. Absent rarity resolves as
    /// `"uncommon"`; a label missing from the table falls back to 1.
    pub fn weight_of(&self, rarity: Option<&str>) -> f64 {
        let label = rarity.unwrap_or(DEFAULT_RARITY);
        match self.table.get(label) {
            Some(&weight) => weight,
            None => {
                warn!("[sampler] rarity '{label}' not in weight table, using weight 1");
                1.0
            }
        }
    }
}

/// Draw one index from `pool` proportionally to `weight`. Returns `None`
/// for an empty pool or a pool with no positive weight.
pub fn draw_one<T>(pool: &[T], weight: impl Fn(&T) -> f64, rng: &mut impl Rng) -> Option<usize> {
    if pool.is_empty() {
        return None;
    }
    let mut prefix = Vec::with_capacity(pool.len());
    let mut total = 0.0;
    for item in pool {
        prefix.push(total);
        total += weight(item);
    }
    if total <= 0.0 {
        return None;
    }
    let value = rng.gen_range(0.0..total);
    // First prefix strictly greater than the draw, minus one. prefix[0]
    // is 0.0, so the subtraction cannot underflow.
    Some(prefix.partition_point(|&p| p <= value) - 1)
}

/// Draw up to `count` distinct candidates, honoring eligibility between
/// draws: each chosen candidate's exclusive tags fold into the
/// accumulator before the pool is re-filtered. An early-exhausted pool
/// yields fewer than `count`; that is not an error.
pub fn draw_distinct<'a, T: Selectable>(
    candidates: &[&'a T],
    count: usize,
    weights: &RarityWeights,
    ctx: &FilterContext<'_>,
    rng: &mut impl Rng,
) -> Vec<&'a T> {
    let mut selected = Vec::with_capacity(count);
    let mut seen_tags: HashSet<String> = HashSet::new();

    let mut pool = filter::filter(candidates, ctx, &seen_tags);
    for _ in 0..count {
        let Some(idx) = draw_one(&pool, |c| weights.weight_of(c.rarity()), rng) else {
            debug!(
                "[sampler] pool exhausted after {} of {count} draws",
                selected.len()
            );
            break;
        };
        let chosen = pool.remove(idx);
        if let Some(conditions) = chosen.conditions() {
            for tag in conditions.exclusive_tags.iter().flatten() {
                seen_tags.insert(tag.clone());
            }
        }
        selected.push(chosen);
        pool = filter::filter(&pool, ctx, &seen_tags);
    }
    selected
}
