//! Selector: one deterministic selection pass over a validated catalog.
//!
//! The pipeline per invocation: compute the window (seed, expiry,
//! time-of-day), seed one RNG from it, flatten the manual-entry template,
//! then filter + draw N top-level activities and flatten each. The
//! selector holds no state between passes — it is a pure function of
//! (catalog, now, last-activity times) — so hosts re-run it whenever
//! `end_time` lapses and can safely discard superseded results.
//!
//! `Selector` is `Send + Sync`; concurrent passes share nothing mutable.

use crate::activity::ActivityDefinition;
use crate::config::Catalog;
use crate::content::ContentNode;
use crate::filter::FilterContext;
use crate::resolver;
use crate::sampler::{self, RarityWeights};
use crate::window::SelectionWindow;
use chrono::{DateTime, TimeZone};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Number of top-level activities selected per pass unless overridden.
pub const DEFAULT_ACTIVITY_COUNT: usize = 3;

/// The selection engine: a validated catalog plus its merged weight
/// table.
#[derive(Debug, Clone)]
pub struct Selector {
    catalog: Catalog,
    weights: RarityWeights,
}

/// One selected activity with its content tree fully resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedActivity {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rarity: Option<String>,
    pub entity: crate::activity::EntityInfo,
    pub content: ContentNode,
}

/// The output of one pass, serializable with the host-facing camelCase
/// field names. Hosts combine `seed` with a positional index to build
/// stable per-window record ids (see [`crate::ids`]) and re-invoke once
/// `end_time` passes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub activities: Vec<ResolvedActivity>,
    pub manual_activity: ResolvedActivity,
    pub seed: String,
    pub now: i64,
    pub end_time: i64,
    pub time_of_day: String,
}

impl Selector {
    /// Validate a catalog and build a selector from it.
    ///
    /// Drops disabled definitions, then checks what the schema cannot:
    /// unique ids, a non-empty pool, content and entity on every enabled
    /// definition and on the manual template, and sane weight overrides.
    pub fn new(catalog: Catalog) -> Result<Self, String> {
        let mut catalog = catalog;
        catalog.activities.retain(|a| a.enabled);
        if catalog.activities.is_empty() {
            return Err("catalog has no enabled activities".to_string());
        }

        let mut seen_ids = HashSet::new();
        for activity in &catalog.activities {
            if !seen_ids.insert(activity.id.as_str()) {
                return Err(format!("duplicate activity id '{}'", activity.id));
            }
            check_complete(activity)?;
        }
        check_complete(&catalog.manual_activity)?;

        let weights = match &catalog.config.rarity_weights {
            Some(overrides) => RarityWeights::with_overrides(overrides)?,
            None => RarityWeights::builtin(),
        };
        Ok(Self { catalog, weights })
    }

    /// The validated catalog backing this selector.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Compute the selection window for `now` without running a pass.
    ///
    /// Lets hosts show the countdown (and build record ids) before the
    /// asynchronous last-activity-time fetch completes.
    pub fn window<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> SelectionWindow {
        SelectionWindow::compute(now, &self.catalog.config.time_names)
    }

    /// Run one pass selecting [`DEFAULT_ACTIVITY_COUNT`] activities.
    pub fn choose_activities<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
        last_activity_times: &HashMap<String, i64>,
    ) -> Result<Selection, String> {
        self.choose_n_activities(now, last_activity_times, DEFAULT_ACTIVITY_COUNT)
    }

    /// Run one pass selecting up to `count` activities.
    ///
    /// Returns fewer when the eligible pool is smaller; that is not an
    /// error. Time-of-day bucketing and calendar comparisons use `now`'s
    /// own offset, so passing `Local::now()` gives wall-clock semantics.
    ///
    /// The offset is frozen for the whole pass: a last completion is
    /// truncated to calendar units using the offset in effect at `now`,
    /// not the offset that was in effect when it happened. Within a few
    /// hours of a DST transition a completion can therefore land on the
    /// neighboring calendar day; at stake is one pass of frequency
    /// eligibility, twice a year.
    pub fn choose_n_activities<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
        last_activity_times: &HashMap<String, i64>,
        count: usize,
    ) -> Result<Selection, String> {
        let window = self.window(now);
        let now_local = now.fixed_offset();
        let mut rng: ChaCha8Rng = window.rng();
        let ctx = FilterContext::new(&window, now_local, last_activity_times);

        // RNG consumption order is part of the determinism contract: the
        // manual template resolves first, then the pool draws, then each
        // selected activity resolves in draw order.
        let manual_activity = resolve_activity(&self.catalog.manual_activity, &self.weights, &ctx, &mut rng)?;

        let pool: Vec<&ActivityDefinition> = self.catalog.activities.iter().collect();
        let selected = sampler::draw_distinct(&pool, count, &self.weights, &ctx, &mut rng);
        debug!(
            "[selector] window {} ({}): drew {} of {count} from pool of {}",
            window.seed,
            window.time_of_day,
            selected.len(),
            pool.len()
        );

        let mut activities = Vec::with_capacity(selected.len());
        for definition in &selected {
            activities.push(resolve_activity(definition, &self.weights, &ctx, &mut rng)?);
        }

        Ok(Selection {
            activities,
            manual_activity,
            seed: window.seed,
            now: window.now,
            end_time: window.end_time,
            time_of_day: window.time_of_day,
        })
    }
}

fn check_complete(activity: &ActivityDefinition) -> Result<(), String> {
    let Some(content) = &activity.content else {
        return Err(format!("activity '{}' has no content", activity.id));
    };
    if activity.entity.is_none() {
        return Err(format!("activity '{}' has no entity type", activity.id));
    }
    check_conditions(&activity.id, activity.conditions.as_ref())?;
    check_content(&activity.id, content)
}

fn check_conditions(
    id: &str,
    conditions: Option<&crate::activity::ConditionSet>,
) -> Result<(), String> {
    if let Some(frequency) = conditions.and_then(|c| c.frequency.as_ref()) {
        let count = frequency.count();
        if count < 1 {
            return Err(format!(
                "activity '{id}': frequency count must be >= 1, got {count}"
            ));
        }
    }
    Ok(())
}

/// Choice alternatives carry conditions of their own, so their frequency
/// counts get the same construction-time check as top-level definitions.
fn check_content(id: &str, node: &ContentNode) -> Result<(), String> {
    match node {
        ContentNode::Choice(choice) => {
            for alternative in &choice.choices {
                check_conditions(id, alternative.conditions.as_ref())?;
                check_content(id, &alternative.node)?;
            }
            Ok(())
        }
        ContentNode::Sequence(items) => items.iter().try_for_each(|item| check_content(id, item)),
        ContentNode::Mapping(entries) => entries
            .iter()
            .try_for_each(|(_, value)| check_content(id, value)),
        ContentNode::Scalar(_) => Ok(()),
    }
}

fn resolve_activity(
    definition: &ActivityDefinition,
    weights: &RarityWeights,
    ctx: &FilterContext<'_>,
    rng: &mut ChaCha8Rng,
) -> Result<ResolvedActivity, String> {
    // Both unreachable after `Selector::new` validation; kept as errors
    // rather than panics.
    let content = definition
        .content
        .as_ref()
        .ok_or_else(|| format!("activity '{}' has no content", definition.id))?;
    let entity = definition
        .entity
        .clone()
        .ok_or_else(|| format!("activity '{}' has no entity type", definition.id))?;

    Ok(ResolvedActivity {
        id: definition.id.clone(),
        rarity: definition.rarity.clone(),
        entity,
        content: resolver::flatten(content, weights, ctx, rng)?,
    })
}
