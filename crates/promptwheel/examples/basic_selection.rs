//! End-to-end pass over a small inline catalog.
//!
//! Run with:
//!
//! ```sh
//! cargo run --example basic_selection
//! ```

use chrono::Local;
use promptwheel::prelude::*;
use std::collections::HashMap;

fn main() -> Result<(), String> {
    let catalog = Catalog::from_json_value(serde_json::json!({
        "activities": [
            {
                "id": "gratitude",
                "rarity": "common",
                "conditions": {"frequency": "day"},
                "content": [
                    {"type": "title", "text": "What are you grateful for today?"},
                    {"type": "input/multi-line", "field": "content"},
                ],
                "entity": {"type": "journal"},
            },
            {
                "id": "selfie",
                "conditions": {"exclusiveTags": ["photo"]},
                "content": [
                    {"type": "title", "text": "Take a selfie."},
                    {"type": "input/photo", "field": "photo"},
                ],
                "entity": {"type": "photo"},
            },
            {
                "id": "surroundings",
                "conditions": {"exclusiveTags": ["photo"]},
                "content": [
                    {"type": "title", "text": "Photograph your surroundings."},
                    {"type": "input/photo", "field": "photo"},
                ],
                "entity": {"type": "photo"},
            },
            {
                "id": "daydream",
                "rarity": "rare",
                "content": [
                    {
                        "type": "title",
                        "text": {
                            "type": "choice",
                            "choices": [
                                "What would you do with a free afternoon?",
                                "Describe a place you'd rather be.",
                            ],
                        },
                    },
                    {"type": "input/multi-line", "field": "content"},
                ],
                "entity": {"type": "journal"},
            },
            {
                "id": "morning-intention",
                "conditions": {"timeOfDay": ["morning"], "frequency": "day"},
                "content": [
                    {"type": "title", "text": "What's your intention for today?"},
                    {"type": "input/multi-line", "field": "content"},
                ],
                "entity": {"type": "journal"},
            },
        ],
        "manualActivity": {
            "id": "manual",
            "content": [
                {"type": "title", "text": "Write about anything."},
                {"type": "input/multi-line", "field": "content"},
            ],
            "entity": {"type": "journal"},
        },
        "config": {
            "timeNames": {"0": "night", "7": "morning", "12": "afternoon", "18": "evening"},
        },
    }))?;

    let selector = Selector::new(catalog)?;
    let now = Local::now();

    // A real host fetches this from storage; here nothing has ever been
    // completed.
    let last_activity_times: HashMap<String, i64> = HashMap::new();

    let selection = selector.choose_activities(&now, &last_activity_times)?;
    println!(
        "window {} ({}), {}s remaining",
        selection.seed,
        selection.time_of_day,
        selector.window(&now).remaining_seconds(selection.now),
    );
    for (idx, activity) in selection.activities.iter().enumerate() {
        let record = promptwheel::ids::entity_id(&selection.seed, idx, &activity.entity.entity_type);
        println!("  [{record}] {}", activity.id);
    }

    let as_json =
        serde_json::to_string_pretty(&selection).map_err(|e| format!("serialize: {e}"))?;
    println!("{as_json}");
    Ok(())
}
