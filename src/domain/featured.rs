//! Rate-up ("featured") resolution against time-boxed pool metadata.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::pull_record::{PullRecord, to_millis};

/// A rate-up window published for one pool.
///
/// A missing or non-positive bound leaves that side of the window open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PoolMetadataEntry {
    /// Pool identifier the window applies to.
    pub pool_id: String,
    /// Window start (seconds or milliseconds since epoch).
    #[serde(default)]
    pub start_time: Option<i64>,
    /// Window end (seconds or milliseconds since epoch).
    #[serde(default)]
    pub end_time: Option<i64>,
    /// Items with boosted odds during the window.
    #[serde(default)]
    pub up_item_ids: Vec<String>,
}

#[derive(Debug, Clone)]
struct Window {
    start: Option<i64>,
    end: Option<i64>,
    up_item_ids: Vec<String>,
}

impl Window {
    fn from_entry(entry: &PoolMetadataEntry) -> Self {
        let bound = |t: Option<i64>| t.filter(|v| *v > 0).map(to_millis);
        Self {
            start: bound(entry.start_time),
            end: bound(entry.end_time),
            up_item_ids: entry.up_item_ids.clone(),
        }
    }

    fn contains(&self, item_id: &str, at_ms: i64) -> bool {
        self.up_item_ids.iter().any(|id| id == item_id)
            && self.start.is_none_or(|start| at_ms >= start)
            && self.end.is_none_or(|end| at_ms <= end)
    }
}

/// Answers "was this top-rarity pull a rate-up item?".
///
/// Built once per metadata snapshot; queries are a linear scan over the
/// (small) list of windows for the pull's pool.
#[derive(Debug, Clone, Default)]
pub struct FeaturedChecker {
    windows: HashMap<String, Vec<Window>>,
}

impl FeaturedChecker {
    /// Groups entries by pool, dropping windows without rate-up items, and
    /// sorts each pool's windows by start time.
    #[must_use]
    pub fn new(entries: &[PoolMetadataEntry]) -> Self {
        let mut windows: HashMap<String, Vec<Window>> = HashMap::new();
        for entry in entries.iter().filter(|e| !e.up_item_ids.is_empty()) {
            windows
                .entry(entry.pool_id.clone())
                .or_default()
                .push(Window::from_entry(entry));
        }
        for list in windows.values_mut() {
            list.sort_by_key(|w| w.start.unwrap_or(0));
        }
        Self { windows }
    }

    /// Returns `true` if `pull` is a top-rarity rate-up item of its pool at
    /// the time it was pulled.
    #[must_use]
    pub fn is_featured(&self, pull: &PullRecord) -> bool {
        if !pull.is_top_rarity() || pull.pool_id.is_empty() || pull.item_id.is_empty() {
            return false;
        }
        let at_ms = pull.pulled_at_ms();
        self.windows
            .get(&pull.pool_id)
            .is_some_and(|list| list.iter().any(|w| w.contains(&pull.item_id, at_ms)))
    }

    /// Number of pools with at least one rate-up window.
    #[must_use]
    pub fn pool_count(&self) -> usize {
        self.windows.len()
    }
}
