//! Raw pull records and their sequence cursor.
//!
//! A [`PullRecord`] is an immutable fact issued by the remote record source.
//! Records are persisted verbatim and never mutated; every derived view
//! (buckets, statistics, banners) is recomputed from them.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Rarity of the top tier. Only pulls of this rarity drive pity tracking.
pub const TOP_RARITY: u8 = 6;

/// Timestamps below this value are taken to be in seconds.
const SECONDS_THRESHOLD: i64 = 1_000_000_000_000;

/// Normalizes a raw epoch timestamp to milliseconds.
///
/// The remote source has historically emitted both seconds and
/// milliseconds. Anything below `10^12` is scaled by 1000.
#[must_use]
pub const fn to_millis(ts: i64) -> i64 {
    if ts < SECONDS_THRESHOLD {
        ts.saturating_mul(1000)
    } else {
        ts
    }
}

/// Opaque, monotonically ordered record identifier issued by the remote
/// source.
///
/// Values are not fixed-width, so ordering compares length first and
/// falls back to lexicographic order for equal lengths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct SeqId(String);

impl SeqId {
    /// Wraps a raw sequence identifier.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the identifier is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Ord for SeqId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for SeqId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SeqId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SeqId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for SeqId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Canonical pool type tags issued by the remote source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PoolType {
    /// Beginner (novice) character pool.
    Beginner,
    /// Limited rate-up character pool.
    Special,
    /// Permanent standard character pool.
    Standard,
    /// Weapon pools, one per `pool_id`.
    Weapon,
}

impl PoolType {
    /// Character pool types fetched by tag during a sync.
    pub const CHARACTER: [Self; 3] = [Self::Special, Self::Standard, Self::Beginner];

    /// Returns the wire tag for this pool type.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Beginner => "E_CharacterGachaPoolType_Beginner",
            Self::Special => "E_CharacterGachaPoolType_Special",
            Self::Standard => "E_CharacterGachaPoolType_Standard",
            Self::Weapon => "E_CharacterGachaPoolType_Weapon",
        }
    }

    /// Parses an exact wire tag. Returns `None` for anything else.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        [Self::Beginner, Self::Special, Self::Standard, Self::Weapon]
            .into_iter()
            .find(|t| t.tag() == tag)
    }
}

/// One randomized-reward draw as issued by the remote source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PullRecord {
    /// Display name as reported by the source (may be the raw id).
    pub name: String,
    /// Item identifier. Empty on legacy rows.
    pub item_id: String,
    /// Rarity tier, 2 through 6.
    pub rarity: u8,
    /// Pool (banner) identifier.
    pub pool_id: String,
    /// Pool display name.
    pub pool_name: String,
    /// Remote sequence identifier.
    pub seq_id: SeqId,
    /// Raw pull timestamp. See [`to_millis`].
    pub pulled_at: i64,
    /// Raw pool type tag. Empty or non-canonical on legacy rows.
    pub pool_type: String,
    /// Whether the pull was free.
    pub is_free: bool,
    /// Whether the item was new to the account.
    pub is_new: bool,
}

impl PullRecord {
    /// Pull timestamp in epoch milliseconds.
    #[must_use]
    pub const fn pulled_at_ms(&self) -> i64 {
        to_millis(self.pulled_at)
    }

    /// Returns `true` for top-rarity pulls.
    #[must_use]
    pub const fn is_top_rarity(&self) -> bool {
        self.rarity == TOP_RARITY
    }

    /// Key identifying the remote pool this record was fetched from.
    ///
    /// Character pools are keyed by their type tag and weapon pools by
    /// `pool_id`, matching how the remote source is queried.
    #[must_use]
    pub fn cursor_key(&self) -> String {
        if self.pool_type == PoolType::Weapon.tag() {
            self.pool_id.clone()
        } else {
            self.pool_type.clone()
        }
    }
}

/// Orders records newest first: timestamp, then sequence id.
#[must_use]
pub fn newest_first(a: &PullRecord, b: &PullRecord) -> Ordering {
    b.pulled_at_ms()
        .cmp(&a.pulled_at_ms())
        .then_with(|| b.seq_id.cmp(&a.seq_id))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Builds a record with the fields the analytics care about.
    pub(crate) fn pull(rarity: u8, item_id: &str, pool_id: &str, seq: &str, at: i64) -> PullRecord {
        PullRecord {
            name: item_id.to_string(),
            item_id: item_id.to_string(),
            rarity,
            pool_id: pool_id.to_string(),
            pool_name: String::new(),
            seq_id: SeqId::new(seq),
            pulled_at: at,
            pool_type: PoolType::Special.tag().to_string(),
            is_free: false,
            is_new: false,
        }
    }
}
