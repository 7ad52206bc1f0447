//! Banner view models assembled from a raw ledger.
//!
//! This is the end of the analytics pipeline: records are bucketed by
//! [`classify`], sorted newest first, then summarized with
//! [`compute_stats`] and annotated by a [`FeaturedChecker`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::classifier::{BucketKey, classify};
use super::featured::FeaturedChecker;
use super::pull_record::{PoolType, PullRecord, newest_first};
use super::stats::{BannerStats, compute_stats, top_rarity_costs};

/// Item category used for name and icon lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    /// Characters, drawn from character pools.
    Character,
    /// Weapons, drawn from weapon pools.
    Weapon,
}

impl ItemCategory {
    /// Category of items drawn from `pool_type`.
    #[must_use]
    pub const fn of(pool_type: PoolType) -> Self {
        match pool_type {
            PoolType::Weapon => Self::Weapon,
            PoolType::Beginner | PoolType::Special | PoolType::Standard => Self::Character,
        }
    }

    /// Directory / file stem used by the metadata package.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Weapon => "weapon",
        }
    }
}

/// Resolves display names and icons for items.
pub trait ItemCatalog {
    /// Localized name for `item_id`, or `fallback` when unknown.
    fn display_name(&self, category: ItemCategory, item_id: &str, fallback: &str) -> String;

    /// Icon path for `item_id`, if one can be built.
    fn icon_path(&self, category: ItemCategory, item_id: &str) -> Option<String>;
}

/// Catalog that only knows the names carried on the records themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordNames;

impl ItemCatalog for RecordNames {
    fn display_name(&self, _category: ItemCategory, item_id: &str, fallback: &str) -> String {
        if fallback.is_empty() {
            item_id.to_string()
        } else {
            fallback.to_string()
        }
    }

    fn icon_path(&self, _category: ItemCategory, _item_id: &str) -> Option<String> {
        None
    }
}

/// One top-rarity pull in a banner's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TopPull {
    /// Display name.
    pub name: String,
    /// Item identifier.
    pub item_id: String,
    /// Pool the pull was made in.
    pub pool_id: String,
    /// Pull time.
    pub pulled_at: Option<DateTime<Utc>>,
    /// Pulls spent reaching this item, inclusive.
    pub cost: u32,
    /// Whether the item was a rate-up item at the time.
    pub featured: bool,
    /// Icon path, when resolvable.
    pub icon: Option<String>,
}

/// Oldest and newest pull of a banner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct DateRange {
    /// Oldest pull.
    pub start: Option<DateTime<Utc>>,
    /// Newest pull.
    pub end: Option<DateTime<Utc>>,
}

/// Read-only summary of one logical banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BannerSummary {
    /// Bucket key, e.g. `special` or `weapon:<pool_id>`.
    pub id: String,
    /// Pool family of the banner.
    pub pool_type: PoolType,
    /// Display title.
    pub title: String,
    /// Time span covered by the banner's pulls.
    pub date_range: DateRange,
    /// Tallies and pity figures.
    pub stats: BannerStats,
    /// Top-rarity pulls, newest first.
    pub top_history: Vec<TopPull>,
}

/// Buckets, sorts and summarizes a raw ledger.
///
/// Input order is irrelevant. Character banners come first (special,
/// standard, beginner), followed by weapon banners with the most recently
/// pulled first.
#[must_use]
pub fn assemble_banners(
    pulls: Vec<PullRecord>,
    featured: &FeaturedChecker,
    catalog: &dyn ItemCatalog,
) -> Vec<BannerSummary> {
    let mut buckets: BTreeMap<BucketKey, Vec<PullRecord>> = BTreeMap::new();
    for pull in pulls {
        buckets.entry(classify(&pull)).or_default().push(pull);
    }

    let mut banners: Vec<BannerSummary> = buckets
        .into_iter()
        .map(|(key, mut records)| {
            records.sort_by(newest_first);
            summarize(&key, &records, featured, catalog)
        })
        .collect();

    banners.sort_by(|a, b| {
        display_rank(a.pool_type)
            .cmp(&display_rank(b.pool_type))
            .then_with(|| b.date_range.end.cmp(&a.date_range.end))
    });
    banners
}

fn summarize(
    key: &BucketKey,
    records: &[PullRecord],
    featured: &FeaturedChecker,
    catalog: &dyn ItemCatalog,
) -> BannerSummary {
    let category = ItemCategory::of(key.pool_type());
    let costs = top_rarity_costs(records);
    let top_history = records
        .iter()
        .filter(|r| r.is_top_rarity())
        .zip(costs)
        .map(|(r, cost)| TopPull {
            name: catalog.display_name(category, &r.item_id, &r.name),
            item_id: r.item_id.clone(),
            pool_id: r.pool_id.clone(),
            pulled_at: timestamp(r),
            cost,
            featured: featured.is_featured(r),
            icon: catalog.icon_path(category, &r.item_id),
        })
        .collect();

    BannerSummary {
        id: key.to_string(),
        pool_type: key.pool_type(),
        title: title(key, records),
        date_range: DateRange {
            start: records.last().and_then(timestamp),
            end: records.first().and_then(timestamp),
        },
        stats: compute_stats(records),
        top_history,
    }
}

fn title(key: &BucketKey, records: &[PullRecord]) -> String {
    if let Some(name) = records
        .iter()
        .map(|r| r.pool_name.as_str())
        .find(|n| !n.is_empty())
    {
        return name.to_string();
    }
    match key {
        BucketKey::Beginner => "Beginner".to_string(),
        BucketKey::Special => "Special".to_string(),
        BucketKey::Standard => "Standard".to_string(),
        BucketKey::Weapon(pool_id) => pool_id.clone(),
    }
}

fn timestamp(record: &PullRecord) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(record.pulled_at_ms())
}

const fn display_rank(pool_type: PoolType) -> u8 {
    match pool_type {
        PoolType::Special => 0,
        PoolType::Standard => 1,
        PoolType::Beginner => 2,
        PoolType::Weapon => 3,
    }
}
