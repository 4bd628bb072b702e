//! The authoritative counter store and its mutation rules.
//!
//! [`StateStore`] owns the one [`CounterState`] for the process. Callers
//! provide the serialization point (the server guards the store with an
//! exclusive lock); the store itself is purely sequential logic and is
//! infallible by construction -- `increment` always succeeds and settings
//! writes ignore fields they cannot use.

use serde::{Deserialize, Serialize};

/// Default candy supply when no configuration is given.
const DEFAULT_INITIAL_CANDY: u64 = 100;

/// Default candy handed out per visitor.
const DEFAULT_CANDY_PER_CHILD: u64 = 1;

/// The full counter state owned by the server process.
///
/// Serialized camelCase to match the wire contract (`GET /state` and the
/// settings response body carry this shape).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterState {
    /// Number of visitors served so far.
    pub current_count: u64,
    /// Candy left in the supply. Never exceeds `initial_candy_count`.
    pub candy_remaining: u64,
    /// The supply baseline the gauge is measured against.
    pub initial_candy_count: u64,
    /// Candy consumed per visitor (1 in practice).
    pub candy_per_child: u64,
}

/// The immutable projection of [`CounterState`] pushed to viewers.
///
/// This is the payload of every `/events` frame. It deliberately omits
/// `candy_per_child`; viewers only render the count and the gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterSnapshot {
    /// Number of visitors served so far.
    pub current_count: u64,
    /// Candy left in the supply.
    pub candy_remaining: u64,
    /// The supply baseline.
    pub initial_candy_count: u64,
}

impl CounterSnapshot {
    /// Apply the increment arithmetic to a snapshot copy.
    ///
    /// This is the same formula [`StateStore::increment`] uses, exposed so
    /// the sync agent's optimistic update cannot drift from the server.
    pub const fn incremented(self, candy_per_child: u64) -> Self {
        Self {
            current_count: self.current_count.saturating_add(1),
            candy_remaining: self.candy_remaining.saturating_sub(candy_per_child),
            initial_candy_count: self.initial_candy_count,
        }
    }
}

/// A settings overwrite request.
///
/// Each field is optional and applied independently. Absent fields keep
/// the previous value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    /// Replacement visitor count (manual reset/correction; may move the
    /// count backward).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_count: Option<u64>,
    /// Replacement supply baseline. Triggers a candy-remaining
    /// recomputation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_candy_count: Option<u64>,
}

impl SettingsUpdate {
    /// Extract a settings update from an already-parsed JSON value.
    ///
    /// Fields are taken only when they are JSON numbers representable as
    /// `u64`; anything else (absent, string, negative, fractional) is
    /// ignored rather than rejected. A non-object value yields an empty
    /// update, which still counts as a successful request.
    pub fn from_json(value: &serde_json::Value) -> Self {
        Self {
            current_count: value.get("currentCount").and_then(serde_json::Value::as_u64),
            initial_candy_count: value
                .get("initialCandyCount")
                .and_then(serde_json::Value::as_u64),
        }
    }

    /// Whether the update carries no applicable fields.
    pub const fn is_empty(&self) -> bool {
        self.current_count.is_none() && self.initial_candy_count.is_none()
    }
}

/// Single authoritative holder of the counter state.
#[derive(Debug, Clone)]
pub struct StateStore {
    state: CounterState,
}

impl StateStore {
    /// Create a store with a fresh counter.
    ///
    /// `initial_candy_count` and `candy_per_child` are positive by
    /// invariant; zero inputs are clamped to 1.
    pub const fn new(initial_candy_count: u64, candy_per_child: u64) -> Self {
        let initial = if initial_candy_count == 0 {
            1
        } else {
            initial_candy_count
        };
        let per_child = if candy_per_child == 0 { 1 } else { candy_per_child };
        Self {
            state: CounterState {
                current_count: 0,
                candy_remaining: initial,
                initial_candy_count: initial,
                candy_per_child: per_child,
            },
        }
    }

    /// Count one visitor.
    ///
    /// Increments the visitor count and deducts one serving of candy,
    /// clamping the gauge at zero. Always succeeds; further increments
    /// after the candy runs out keep raising the count. Returns the new
    /// snapshot so the caller can broadcast it.
    pub const fn increment(&mut self) -> CounterSnapshot {
        self.state.current_count = self.state.current_count.saturating_add(1);
        self.state.candy_remaining = self
            .state
            .candy_remaining
            .saturating_sub(self.state.candy_per_child);
        self.snapshot()
    }

    /// Apply a settings overwrite.
    ///
    /// If a replacement count is given it is written first. If a new
    /// supply baseline is given, the candy gauge is recomputed from the
    /// (possibly just-updated) count:
    /// `candy_remaining = baseline - count * candy_per_child`, clamped at
    /// zero. A count-only update deliberately leaves the gauge untouched;
    /// the control panel relies on that to correct the count without
    /// restocking. Returns the new full state.
    pub const fn apply_settings(&mut self, update: SettingsUpdate) -> CounterState {
        if let Some(count) = update.current_count {
            self.state.current_count = count;
        }
        if let Some(baseline) = update.initial_candy_count {
            self.state.initial_candy_count = baseline;
            let consumed = self
                .state
                .current_count
                .saturating_mul(self.state.candy_per_child);
            self.state.candy_remaining = baseline.saturating_sub(consumed);
        }
        self.state
    }

    /// An immutable copy of the viewer-facing state. Side-effect-free.
    pub const fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            current_count: self.state.current_count,
            candy_remaining: self.state.candy_remaining,
            initial_candy_count: self.state.initial_candy_count,
        }
    }

    /// An immutable copy of the full state. Side-effect-free.
    pub const fn state(&self) -> CounterState {
        self.state
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_CANDY, DEFAULT_CANDY_PER_CHILD)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn fresh_store_matches_defaults() {
        let store = StateStore::default();
        let state = store.state();
        assert_eq!(state.current_count, 0);
        assert_eq!(state.candy_remaining, 100);
        assert_eq!(state.initial_candy_count, 100);
        assert_eq!(state.candy_per_child, 1);
    }

    #[test]
    fn zero_inputs_are_clamped_to_one() {
        let store = StateStore::new(0, 0);
        let state = store.state();
        assert_eq!(state.initial_candy_count, 1);
        assert_eq!(state.candy_per_child, 1);
        assert_eq!(state.candy_remaining, 1);
    }

    #[test]
    fn five_increments_from_hundred() {
        let mut store = StateStore::new(100, 1);
        for _ in 0..5 {
            let _ = store.increment();
        }
        let snap = store.snapshot();
        assert_eq!(snap.current_count, 5);
        assert_eq!(snap.candy_remaining, 95);
        assert_eq!(snap.initial_candy_count, 100);
    }

    #[test]
    fn count_keeps_rising_after_candy_is_exhausted() {
        let mut store = StateStore::new(100, 1);
        for _ in 0..105 {
            let _ = store.increment();
        }
        let snap = store.snapshot();
        assert_eq!(snap.current_count, 105);
        assert_eq!(snap.candy_remaining, 0);
    }

    #[test]
    fn candy_never_exceeds_baseline() {
        let mut store = StateStore::new(10, 1);
        for _ in 0..20 {
            let snap = store.increment();
            assert!(snap.candy_remaining <= snap.initial_candy_count);
        }
    }

    #[test]
    fn increment_deducts_per_child_amount() {
        let mut store = StateStore::new(100, 3);
        let snap = store.increment();
        assert_eq!(snap.current_count, 1);
        assert_eq!(snap.candy_remaining, 97);
    }

    #[test]
    fn settings_baseline_recomputes_candy_from_count() {
        let mut store = StateStore::new(100, 1);
        for _ in 0..10 {
            let _ = store.increment();
        }
        let state = store.apply_settings(SettingsUpdate {
            current_count: None,
            initial_candy_count: Some(50),
        });
        assert_eq!(state.current_count, 10);
        assert_eq!(state.initial_candy_count, 50);
        assert_eq!(state.candy_remaining, 40);
    }

    #[test]
    fn settings_baseline_recompute_clamps_at_zero() {
        let mut store = StateStore::new(100, 1);
        for _ in 0..10 {
            let _ = store.increment();
        }
        let state = store.apply_settings(SettingsUpdate {
            current_count: None,
            initial_candy_count: Some(5),
        });
        assert_eq!(state.candy_remaining, 0);
    }

    #[test]
    fn settings_count_and_baseline_together_use_the_new_count() {
        let mut store = StateStore::new(100, 1);
        let state = store.apply_settings(SettingsUpdate {
            current_count: Some(7),
            initial_candy_count: Some(20),
        });
        assert_eq!(state.current_count, 7);
        assert_eq!(state.candy_remaining, 13);
    }

    // Known edge (kept on purpose): replacing only the count leaves the
    // candy gauge at its prior value, so the gauge no longer matches the
    // derived formula for the new count.
    #[test]
    fn settings_count_only_leaves_candy_untouched() {
        let mut store = StateStore::new(100, 1);
        for _ in 0..10 {
            let _ = store.increment();
        }
        let state = store.apply_settings(SettingsUpdate {
            current_count: Some(0),
            initial_candy_count: None,
        });
        assert_eq!(state.current_count, 0);
        assert_eq!(state.candy_remaining, 90);
    }

    #[test]
    fn empty_settings_update_changes_nothing() {
        let mut store = StateStore::new(100, 1);
        let before = store.state();
        let after = store.apply_settings(SettingsUpdate::default());
        assert_eq!(before, after);
    }

    #[test]
    fn settings_from_json_takes_numeric_fields() {
        let value = serde_json::json!({"currentCount": 12, "initialCandyCount": 80});
        let update = SettingsUpdate::from_json(&value);
        assert_eq!(update.current_count, Some(12));
        assert_eq!(update.initial_candy_count, Some(80));
    }

    #[test]
    fn settings_from_json_ignores_non_numeric_fields() {
        let value = serde_json::json!({"currentCount": "twelve", "initialCandyCount": -5});
        let update = SettingsUpdate::from_json(&value);
        assert!(update.is_empty());
    }

    #[test]
    fn settings_from_json_on_non_object_is_empty() {
        let update = SettingsUpdate::from_json(&serde_json::json!("spooky"));
        assert!(update.is_empty());
    }

    #[test]
    fn snapshot_increment_matches_store_increment() {
        let mut store = StateStore::new(100, 1);
        let optimistic = store.snapshot().incremented(1);
        let authoritative = store.increment();
        assert_eq!(optimistic, authoritative);
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let store = StateStore::default();
        let json = serde_json::to_value(store.snapshot()).unwrap();
        assert_eq!(json["currentCount"], 0);
        assert_eq!(json["candyRemaining"], 100);
        assert_eq!(json["initialCandyCount"], 100);
    }

    #[test]
    fn full_state_serializes_candy_per_child() {
        let store = StateStore::default();
        let json = serde_json::to_value(store.state()).unwrap();
        assert_eq!(json["candyPerChild"], 1);
    }
}
