//! Streak statistics over a single banner's pulls.
//!
//! All functions here are pure and expect their input ordered newest
//! first, as produced by [`super::pull_record::newest_first`].

use serde::Serialize;
use utoipa::ToSchema;

use super::pull_record::{PullRecord, TOP_RARITY};

/// Rarity tallies and pity figures for one banner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct BannerStats {
    /// Total pulls in the banner.
    pub total: u32,
    /// Number of rarity-6 pulls.
    pub s6: u32,
    /// Number of rarity-5 pulls.
    pub s5: u32,
    /// Number of rarity-4 pulls.
    pub s4: u32,
    /// Pulls made since the most recent rarity-6 pull.
    pub guarantee: u32,
    /// Average pulls per rarity-6, rounded. 0 when `s6 == 0`.
    pub avg6: u32,
    /// Cheapest completed rarity-6 cycle. 0 when `s6 < 2`.
    pub min6: u32,
    /// Most expensive completed rarity-6 cycle. 0 when `s6 < 2`.
    pub max6: u32,
}

/// Computes [`BannerStats`] in a single pass over newest-first pulls.
///
/// The first rarity-6 encountered is the most recent one, so the pulls
/// before it form the current pity. Every later rarity-6 closes a full
/// cycle. The oldest rarity-6 is closed after the loop, counting the
/// pulls older than it plus itself.
#[must_use]
pub fn compute_stats(pulls: &[PullRecord]) -> BannerStats {
    let mut stats = BannerStats {
        total: saturating_len(pulls.len()),
        ..BannerStats::default()
    };

    let mut since_top: u32 = 0;
    let mut found_top = false;
    let mut range: Option<(u32, u32)> = None;
    let mut fold = |cost: u32| {
        range = Some(match range {
            Some((lo, hi)) => (lo.min(cost), hi.max(cost)),
            None => (cost, cost),
        });
    };

    for pull in pulls {
        since_top = since_top.saturating_add(1);
        match pull.rarity {
            TOP_RARITY => {
                stats.s6 += 1;
                if found_top {
                    fold(since_top);
                } else {
                    stats.guarantee = since_top - 1;
                    found_top = true;
                }
                since_top = 0;
            }
            5 => stats.s5 += 1,
            4 => stats.s4 += 1,
            _ => {}
        }
    }

    if found_top {
        fold(since_top.saturating_add(1));
    } else {
        stats.guarantee = since_top;
    }

    if stats.s6 >= 2
        && let Some((lo, hi)) = range
    {
        stats.min6 = lo;
        stats.max6 = hi;
    }

    stats.avg6 = rounded_average(stats.total, stats.s6);
    stats
}

/// Pull cost of every rarity-6 pull, aligned with their newest-first order.
///
/// A cost counts the pulls after the previous rarity-6 up to and including
/// this one. The oldest rarity-6 counts from the start of the ledger.
#[must_use]
pub fn top_rarity_costs(pulls: &[PullRecord]) -> Vec<u32> {
    let mut costs = Vec::new();
    let mut since_top: u32 = 0;
    for pull in pulls.iter().rev() {
        since_top = since_top.saturating_add(1);
        if pull.is_top_rarity() {
            costs.push(since_top);
            since_top = 0;
        }
    }
    costs.reverse();
    costs
}

fn rounded_average(total: u32, count: u32) -> u32 {
    if count == 0 {
        return 0;
    }
    let (total, count) = (u64::from(total), u64::from(count));
    let avg = (2 * total + count) / (2 * count);
    u32::try_from(avg).unwrap_or(u32::MAX)
}

fn saturating_len(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
