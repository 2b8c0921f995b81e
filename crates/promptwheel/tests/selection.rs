//! End-to-end selection behavior over a realistic catalog.

use chrono::{DateTime, FixedOffset};
use promptwheel::prelude::*;
use std::collections::{HashMap, HashSet};
use std::io::Write;

/// 2024-06-05 12:00:00 UTC, exactly on a window boundary.
const NOON: i64 = 1_717_588_800_000;
/// Same day, 19:00 UTC — "evening" under the standard table.
const EVENING: i64 = NOON + 7 * 60 * 60 * 1000;
const HOUR_MS: i64 = 60 * 60 * 1000;
const DAY_MS: i64 = 24 * HOUR_MS;

fn at(ms: i64) -> DateTime<FixedOffset> {
    DateTime::from_timestamp_millis(ms).unwrap().fixed_offset()
}

fn scenario_catalog() -> Catalog {
    Catalog::from_json_value(serde_json::json!({
        "activities": [
            {
                "id": "a",
                "rarity": "common",
                "content": {"type": "title", "text": "a"},
                "entity": {"type": "journal"},
            },
            {
                "id": "b",
                "rarity": "rare",
                "conditions": {"exclusiveTags": ["photo"]},
                "content": {"type": "title", "text": "b"},
                "entity": {"type": "photo"},
            },
            {
                "id": "c",
                "conditions": {"exclusiveTags": ["photo"]},
                "content": {"type": "title", "text": "c"},
                "entity": {"type": "photo"},
            },
            {
                "id": "d",
                "conditions": {"timeOfDay": ["morning"]},
                "content": {"type": "title", "text": "d"},
                "entity": {"type": "journal"},
            },
        ],
        "manualActivity": {
            "id": "manual",
            "content": {
                "type": "choice",
                "choices": [
                    {"type": "title", "text": "Write about anything."},
                    {"type": "title", "text": "What's on your mind?"},
                ],
            },
            "entity": {"type": "journal"},
        },
        "config": {
            "timeNames": {"0": "night", "7": "morning", "12": "afternoon", "18": "evening"},
        },
    }))
    .unwrap()
}

#[test]
fn repeated_invocations_in_one_window_are_identical() {
    let selector = Selector::new(scenario_catalog()).unwrap();
    let last = HashMap::new();
    let first = selector.choose_activities(&at(EVENING + 1000), &last).unwrap();
    let second = selector.choose_activities(&at(EVENING + 1000), &last).unwrap();
    assert_eq!(first, second);
}

#[test]
fn same_window_different_instant_selects_the_same_activities() {
    let selector = Selector::new(scenario_catalog()).unwrap();
    let last = HashMap::new();
    let first = selector.choose_activities(&at(EVENING + 1000), &last).unwrap();
    let later = selector
        .choose_activities(&at(EVENING + WINDOW_MS - 1000), &last)
        .unwrap();
    assert_eq!(first.seed, later.seed);
    assert_eq!(first.end_time, later.end_time);
    let ids = |s: &Selection| s.activities.iter().map(|a| a.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&first), ids(&later));
    assert_eq!(first.manual_activity, later.manual_activity);
}

#[test]
fn evening_selection_never_returns_d_nor_both_photo_activities() {
    let selector = Selector::new(scenario_catalog()).unwrap();
    let last = HashMap::new();
    // Walk many consecutive evening windows to cover many RNG seeds.
    for window in 0..40 {
        let now = at(EVENING + window * WINDOW_MS / 4);
        let selection = selector.choose_n_activities(&now, &last, 3).unwrap();
        let ids: HashSet<&str> = selection.activities.iter().map(|a| a.id.as_str()).collect();
        assert!(!ids.contains("d"), "window {window} selected the morning-only activity");
        assert!(
            !(ids.contains("b") && ids.contains("c")),
            "window {window} selected both photo activities"
        );
        assert!(selection.time_of_day == "evening");
    }
}

#[test]
fn no_two_selected_activities_share_an_exclusive_tag() {
    let selector = Selector::new(scenario_catalog()).unwrap();
    let last = HashMap::new();
    for window in 0..40 {
        let now = at(NOON + window * WINDOW_MS);
        let selection = selector.choose_n_activities(&now, &last, 4).unwrap();
        let mut seen = HashSet::new();
        for activity in &selection.activities {
            let definition = selector
                .catalog()
                .activities
                .iter()
                .find(|d| d.id == activity.id)
                .unwrap();
            for tag in definition
                .conditions
                .iter()
                .flat_map(|c| c.exclusive_tags.iter().flatten())
            {
                assert!(seen.insert(tag.clone()), "tag '{tag}' selected twice in window {window}");
            }
        }
    }
}

#[test]
fn daily_frequency_suppresses_until_the_calendar_day_rolls() {
    let selector = Selector::new(
        Catalog::from_json_value(serde_json::json!({
            "activities": [{
                "id": "daily",
                "conditions": {"frequency": "day"},
                "content": {"type": "title", "text": "t"},
                "entity": {"type": "journal"},
            }],
            "manualActivity": {
                "id": "manual",
                "content": {"type": "title", "text": "m"},
                "entity": {"type": "journal"},
            },
        }))
        .unwrap(),
    )
    .unwrap();

    let mut last = HashMap::new();

    // Completed earlier today in a different window: suppressed.
    last.insert("daily".to_string(), NOON - 2 * HOUR_MS);
    let selection = selector.choose_n_activities(&at(NOON), &last, 1).unwrap();
    assert!(selection.activities.is_empty());

    // Completed yesterday: eligible again, despite < 24h elapsed.
    last.insert("daily".to_string(), NOON - 13 * HOUR_MS);
    let selection = selector.choose_n_activities(&at(NOON), &last, 1).unwrap();
    assert_eq!(selection.activities.len(), 1);

    // Completed within the current window: not self-excluded.
    last.insert("daily".to_string(), NOON + 30_000);
    let selection = selector
        .choose_n_activities(&at(NOON + 60_000), &last, 1)
        .unwrap();
    assert_eq!(selection.activities.len(), 1);

    // Tomorrow it is eligible regardless.
    last.insert("daily".to_string(), NOON - 2 * HOUR_MS);
    let selection = selector
        .choose_n_activities(&at(NOON + DAY_MS), &last, 1)
        .unwrap();
    assert_eq!(selection.activities.len(), 1);
}

#[test]
fn manual_activity_resolves_choices_but_skips_the_pool() {
    let selector = Selector::new(scenario_catalog()).unwrap();
    let last = HashMap::new();
    for window in 0..10 {
        let selection = selector
            .choose_n_activities(&at(NOON + window * WINDOW_MS), &last, 2)
            .unwrap();
        assert_eq!(selection.manual_activity.id, "manual");
        assert!(!selection.manual_activity.content.contains_choice());
        // The manual template never occupies a pool slot.
        assert!(selection.activities.iter().all(|a| a.id != "manual"));
    }
}

#[test]
fn resolved_activities_contain_no_choice_nodes() {
    let selector = Selector::new(scenario_catalog()).unwrap();
    let last = HashMap::new();
    for window in 0..10 {
        let selection = selector
            .choose_n_activities(&at(NOON + window * WINDOW_MS), &last, 3)
            .unwrap();
        for activity in &selection.activities {
            assert!(!activity.content.contains_choice());
        }
    }
}

#[test]
fn catalog_loads_from_a_file_on_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let raw = serde_json::to_string(&scenario_catalog()).unwrap();
    file.write_all(raw.as_bytes()).unwrap();

    let reread = std::fs::read_to_string(file.path()).unwrap();
    let selector = Selector::new(Catalog::from_json_str(&reread).unwrap()).unwrap();
    let selection = selector
        .choose_activities(&at(EVENING), &HashMap::new())
        .unwrap();
    assert_eq!(selection.time_of_day, "evening");
    assert!(!selection.activities.is_empty());
}
