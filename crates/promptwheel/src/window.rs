//! Window clock: stable selection-window seeds and time-of-day bucketing.
//!
//! Selection runs once per fixed-length time window. Every wall-clock
//! instant maps to exactly one window; the window index (stringified) is
//! the seed for all pseudo-random draws in that pass, so reloads and
//! concurrent views within the same window reproduce the same prompt set.

use chrono::{DateTime, TimeZone, Timelike};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::BTreeMap;

/// Length of one selection window in milliseconds (15 minutes).
pub const WINDOW_MS: i64 = 15 * 60 * 1000;

/// Ascending hour-threshold → period-label table.
///
/// The current hour maps to the label of the greatest threshold not
/// exceeding it. Hours below the first threshold map to `"unknown"`.
pub type TimeOfDayTable = BTreeMap<u32, String>;

/// Derive the window seed for a timestamp in ms since epoch.
pub fn seed_from_millis(ms: i64) -> String {
    ms.div_euclid(WINDOW_MS).to_string()
}

/// Bucket an hour-of-day into a named period using the threshold table.
pub fn time_of_day(hour: u32, table: &TimeOfDayTable) -> String {
    let mut name = None;
    for (start_hour, label) in table {
        if hour < *start_hour {
            break;
        }
        name = Some(label.as_str());
    }
    name.unwrap_or("unknown").to_string()
}

/// One selection window: seed, the instant it was computed, its expiry,
/// and the time-of-day bucket at that instant.
///
/// Recomputed on every invocation; the engine holds no window state
/// between passes. `end_time` tells the host when to re-invoke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionWindow {
    /// Stringified window index; seeds all draws in this pass.
    pub seed: String,
    /// The instant the window was computed, ms since epoch.
    pub now: i64,
    /// Expiry instant of this window, ms since epoch.
    pub end_time: i64,
    /// Named time-of-day period at `now`.
    pub time_of_day: String,
}

impl SelectionWindow {
    /// Compute the window containing `now`.
    ///
    /// Pure arithmetic, no errors. The caller owns how "now" is supplied,
    /// which keeps tests environment-independent: pass a fixed
    /// `DateTime<FixedOffset>` in tests and `Local::now()` in production.
    pub fn compute<Tz: TimeZone>(now: &DateTime<Tz>, table: &TimeOfDayTable) -> Self {
        let now_ms = now.timestamp_millis();
        let whole = now_ms.div_euclid(WINDOW_MS);
        let end_windows = whole + i64::from(now_ms.rem_euclid(WINDOW_MS) != 0);
        Self {
            seed: whole.to_string(),
            now: now_ms,
            end_time: end_windows * WINDOW_MS,
            time_of_day: time_of_day(now.hour(), table),
        }
    }

    /// Whole seconds until this window expires, rounding up.
    ///
    /// For host-side countdown displays; negative once the window has
    /// lapsed and the host should re-invoke.
    pub fn remaining_seconds(&self, now_ms: i64) -> i64 {
        let delta = self.end_time - now_ms;
        delta.div_euclid(1000) + i64::from(delta.rem_euclid(1000) != 0)
    }

    /// A fresh deterministic RNG keyed on this window's seed.
    ///
    /// Every pass seeds exactly one generator; all sampling calls thread
    /// it explicitly, so identical seeds reproduce identical draw
    /// sequences.
    pub fn rng(&self) -> ChaCha8Rng {
        let mut key = [0u8; 32];
        for (dst, src) in key.iter_mut().zip(self.seed.as_bytes()) {
            *dst = *src;
        }
        ChaCha8Rng::from_seed(key)
    }
}
