//! Deterministic prompt-selection engine for a periodic journaling app.
//!
//! For a fixed 15-minute window, `promptwheel` chooses a small set of
//! writing prompts ("activities") from a configured pool — respecting
//! recency, time-of-day, and mutual-exclusion rules — then resolves any
//! prompt offering several internal variants into one concrete variant.
//! All pseudo-randomness is seeded from the window, so reloads and
//! concurrent views within a window see the same prompt set.
//!
//! The pipeline is four stateless stages:
//!
//! - [`window`] — derives the window seed, expiry, and time-of-day bucket
//!   from wall-clock time.
//! - [`filter`] — removes candidates whose declared conditions fail.
//! - [`sampler`] — draws distinct items from the weighted pool,
//!   re-filtering between draws.
//! - [`resolver`] — recursively replaces every embedded choice node with
//!   one drawn alternative.
//!
//! [`engine::Selector`] wires them together over a validated
//! [`config::Catalog`]. The engine is a pure function of (catalog, now,
//! last-activity timestamps): no I/O, no global state, no persistence.
//!
//! # Getting started
//!
//! ```ignore
//! use chrono::Local;
//! use promptwheel::prelude::*;
//! use std::collections::HashMap;
//!
//! fn main() -> Result<(), String> {
//!     let raw = std::fs::read_to_string("activities.json").map_err(|e| e.to_string())?;
//!     let selector = Selector::new(Catalog::from_json_str(&raw)?)?;
//!
//!     // The host supplies "now" and the last-completion map; the engine
//!     // reads but never writes them.
//!     let last_activity_times: HashMap<String, i64> = HashMap::new();
//!     let selection = selector.choose_activities(&Local::now(), &last_activity_times)?;
//!
//!     for (idx, activity) in selection.activities.iter().enumerate() {
//!         let record = promptwheel::ids::entity_id(
//!             &selection.seed,
//!             idx,
//!             &activity.entity.entity_type,
//!         );
//!         println!("{record}: {}", activity.id);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Re-invoke once `selection.end_time` lapses; calls with identical
//! inputs inside one window are idempotent.

pub mod activity;
pub mod config;
pub mod content;
pub mod engine;
pub mod filter;
pub mod ids;
pub mod prelude;
pub mod resolver;
pub mod sampler;
pub mod window;

pub use activity::{ActivityDefinition, ConditionSet, EntityInfo, Frequency, FrequencyUnit, Selectable};
pub use config::{Catalog, CatalogConfig, CatalogOverlay};
pub use content::{ChoiceAlternative, ChoiceNode, ContentNode};
pub use engine::{DEFAULT_ACTIVITY_COUNT, ResolvedActivity, Selection, Selector};
pub use filter::FilterContext;
pub use sampler::RarityWeights;
pub use window::{SelectionWindow, TimeOfDayTable, WINDOW_MS};
