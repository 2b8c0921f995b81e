//! Eligibility filter: removes candidates whose declared conditions fail.
//!
//! Runs once before the first draw and again after each successful draw,
//! since a draw can add labels to the exclusive-tag accumulator. A
//! candidate with no conditions always passes; otherwise every declared
//! condition must hold.
//!
//! The `frequency` comparison is calendar-unit based, not a raw
//! millisecond delta: "once per day" means "not again the same calendar
//! day," so an activity completed at 23:50 is eligible again at 00:05. A
//! completion inside the *current* window never suppresses its own
//! activity — otherwise picking an activity and writing to it would
//! reshuffle the window on the next reload. This assumes selection does
//! not re-run mid-window after a last-activity-time update.

use crate::activity::{Frequency, FrequencyUnit, Selectable};
use crate::window::{SelectionWindow, seed_from_millis};
use chrono::{DateTime, Datelike, Days, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::collections::{HashMap, HashSet};
use tracing::trace;

/// Per-pass inputs the filter evaluates conditions against.
#[derive(Debug, Clone)]
pub struct FilterContext<'a> {
    /// Current time-of-day bucket.
    pub time_of_day: &'a str,
    /// Current window seed.
    pub seed: &'a str,
    /// Current wall-clock time, in the caller's local offset.
    pub now: DateTime<FixedOffset>,
    /// Activity id → most recent completion, ms since epoch. Read-only;
    /// a missing entry means "never completed."
    pub last_activity_times: &'a HashMap<String, i64>,
}

impl<'a> FilterContext<'a> {
    pub fn new(
        window: &'a SelectionWindow,
        now: DateTime<FixedOffset>,
        last_activity_times: &'a HashMap<String, i64>,
    ) -> Self {
        Self {
            time_of_day: &window.time_of_day,
            seed: &window.seed,
            now,
            last_activity_times,
        }
    }
}

/// Retain the candidates whose every declared condition passes.
pub fn filter<'a, T: Selectable>(
    candidates: &[&'a T],
    ctx: &FilterContext<'_>,
    seen_tags: &HashSet<String>,
) -> Vec<&'a T> {
    candidates
        .iter()
        .filter(|candidate| passes(**candidate, ctx, seen_tags))
        .copied()
        .collect()
}

fn passes<T: Selectable>(candidate: &T, ctx: &FilterContext<'_>, seen_tags: &HashSet<String>) -> bool {
    let Some(conditions) = candidate.conditions() else {
        return true;
    };
    let id = candidate.id().unwrap_or("<anonymous>");

    if let Some(periods) = &conditions.time_of_day {
        if !periods.iter().any(|p| p == ctx.time_of_day) {
            trace!("[filter] {id}: wrong time of day ({})", ctx.time_of_day);
            return false;
        }
    }

    if let Some(frequency) = &conditions.frequency {
        if excluded_by_frequency(candidate.id(), frequency, ctx) {
            trace!("[filter] {id}: completed too recently");
            return false;
        }
    }

    if let Some(tags) = &conditions.exclusive_tags {
        if let Some(tag) = tags.iter().find(|tag| seen_tags.contains(*tag)) {
            trace!("[filter] {id}: exclusive tag '{tag}' already drawn");
            return false;
        }
    }

    true
}

/// A candidate is frequency-excluded only when all of: it has completed
/// before; that completion was *not* in the current window; and fewer
/// than `count` whole calendar `unit`s separate it from now.
fn excluded_by_frequency(id: Option<&str>, frequency: &Frequency, ctx: &FilterContext<'_>) -> bool {
    let Some(&last_ms) = id.and_then(|id| ctx.last_activity_times.get(id)) else {
        return false;
    };
    if seed_from_millis(last_ms) == ctx.seed {
        return false;
    }
    let Some(last) = DateTime::from_timestamp_millis(last_ms) else {
        return false;
    };
    let last = last.with_timezone(&ctx.now.timezone());

    let unit = frequency.unit();
    let Some(threshold) = subtract_units(&ctx.now, frequency.count(), unit) else {
        return false;
    };
    match (start_of(&threshold, unit), start_of(&last, unit)) {
        (Some(threshold), Some(last)) => threshold < last,
        _ => false,
    }
}

fn subtract_units(
    now: &DateTime<FixedOffset>,
    count: i64,
    unit: FrequencyUnit,
) -> Option<DateTime<FixedOffset>> {
    const MINUTE_MS: i64 = 60 * 1000;
    const HOUR_MS: i64 = 60 * MINUTE_MS;
    const DAY_MS: i64 = 24 * HOUR_MS;
    match unit {
        FrequencyUnit::Minute => {
            now.checked_sub_signed(Duration::milliseconds(count.checked_mul(MINUTE_MS)?))
        }
        FrequencyUnit::Hour => {
            now.checked_sub_signed(Duration::milliseconds(count.checked_mul(HOUR_MS)?))
        }
        FrequencyUnit::Day => {
            now.checked_sub_signed(Duration::milliseconds(count.checked_mul(DAY_MS)?))
        }
        FrequencyUnit::Week => {
            now.checked_sub_signed(Duration::milliseconds(count.checked_mul(7 * DAY_MS)?))
        }
        FrequencyUnit::Month => {
            now.checked_sub_months(chrono::Months::new(u32::try_from(count).ok()?))
        }
        FrequencyUnit::Year => now.checked_sub_months(chrono::Months::new(
            u32::try_from(count.checked_mul(12)?).ok()?,
        )),
    }
}

/// Truncate to the start of `unit` in local wall-clock terms. Weeks start
/// on Monday (ISO).
fn start_of(dt: &DateTime<FixedOffset>, unit: FrequencyUnit) -> Option<NaiveDateTime> {
    let local = dt.naive_local();
    let date = local.date();
    match unit {
        FrequencyUnit::Minute => local.with_second(0)?.with_nanosecond(0),
        FrequencyUnit::Hour => date.and_hms_opt(local.hour(), 0, 0),
        FrequencyUnit::Day => Some(date.and_time(NaiveTime::MIN)),
        FrequencyUnit::Week => {
            let back = u64::from(date.weekday().num_days_from_monday());
            Some(date.checked_sub_days(Days::new(back))?.and_time(NaiveTime::MIN))
        }
        FrequencyUnit::Month => Some(date.with_day(1)?.and_time(NaiveTime::MIN)),
        FrequencyUnit::Year => {
            Some(NaiveDate::from_ymd_opt(date.year(), 1, 1)?.and_time(NaiveTime::MIN))
        }
    }
}
