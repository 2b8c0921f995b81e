//! Convenience re-exports for typical hosts.
//!
//! ```ignore
//! use promptwheel::prelude::*;
//! ```

pub use crate::activity::{ActivityDefinition, ConditionSet, EntityInfo, Frequency, FrequencyUnit, Selectable};
pub use crate::config::{Catalog, CatalogConfig, CatalogOverlay};
pub use crate::content::{ChoiceAlternative, ChoiceNode, ContentNode};
pub use crate::engine::{DEFAULT_ACTIVITY_COUNT, ResolvedActivity, Selection, Selector};
pub use crate::filter::FilterContext;
pub use crate::sampler::RarityWeights;
pub use crate::window::{SelectionWindow, TimeOfDayTable, WINDOW_MS};
