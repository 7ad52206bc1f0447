//! Pool classification: maps every pull record to exactly one banner bucket.
//!
//! Classification runs two ordered strategies. The authoritative strategy
//! matches the canonical pool type tag. Rows written before the tag existed
//! (or with a corrupted tag) fall through to a text heuristic over the tag
//! text and then the pool name. Anything still unmatched lands in the
//! limited (`special`) bucket.

use std::fmt;

use serde::{Serialize, Serializer};

use super::pull_record::{PoolType, PullRecord};

const WEAPON_KEYWORDS: &[&str] = &["weapon", "武器"];
const STANDARD_KEYWORDS: &[&str] = &["standard", "regular", "permanent", "常驻", "基础"];
const BEGINNER_KEYWORDS: &[&str] = &["beginner", "novice", "新手", "启程"];

/// Logical banner a pull belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BucketKey {
    /// Beginner character pool.
    Beginner,
    /// Limited rate-up character pools.
    Special,
    /// Standard character pool.
    Standard,
    /// A single weapon pool, keyed by its `pool_id`.
    Weapon(String),
}

impl BucketKey {
    /// Returns the pool type this bucket draws from.
    #[must_use]
    pub const fn pool_type(&self) -> PoolType {
        match self {
            Self::Beginner => PoolType::Beginner,
            Self::Special => PoolType::Special,
            Self::Standard => PoolType::Standard,
            Self::Weapon(_) => PoolType::Weapon,
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Beginner => f.write_str("beginner"),
            Self::Special => f.write_str("special"),
            Self::Standard => f.write_str("standard"),
            Self::Weapon(pool_id) => write!(f, "weapon:{pool_id}"),
        }
    }
}

impl Serialize for BucketKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Coarse category produced by either strategy, before weapon sub-bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Beginner,
    Special,
    Standard,
    Weapon,
}

/// Assigns a record to its bucket. Total: every input yields a key.
#[must_use]
pub fn classify(record: &PullRecord) -> BucketKey {
    let category = by_tag(&record.pool_type)
        .or_else(|| by_keywords(&record.pool_type))
        .or_else(|| by_keywords(&record.pool_name))
        .unwrap_or(Category::Special);

    match category {
        Category::Beginner => BucketKey::Beginner,
        Category::Special => BucketKey::Special,
        Category::Standard => BucketKey::Standard,
        Category::Weapon => BucketKey::Weapon(record.pool_id.clone()),
    }
}

fn by_tag(tag: &str) -> Option<Category> {
    PoolType::from_tag(tag).map(|t| match t {
        PoolType::Beginner => Category::Beginner,
        PoolType::Special => Category::Special,
        PoolType::Standard => Category::Standard,
        PoolType::Weapon => Category::Weapon,
    })
}

fn by_keywords(text: &str) -> Option<Category> {
    if text.is_empty() {
        return None;
    }
    let lower = text.to_lowercase();
    let hit = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(*k));

    if hit(WEAPON_KEYWORDS) {
        Some(Category::Weapon)
    } else if hit(STANDARD_KEYWORDS) {
        Some(Category::Standard)
    } else if hit(BEGINNER_KEYWORDS) {
        Some(Category::Beginner)
    } else {
        None
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::pull_record::fixtures::pull;

    fn record(tag: &str, pool_name: &str, pool_id: &str) -> PullRecord {
        let mut r = pull(4, "item", pool_id, "1", 1);
        r.pool_type = tag.to_string();
        r.pool_name = pool_name.to_string();
        r
    }

    #[test]
    fn canonical_tags_map_directly() {
        assert_eq!(
            classify(&record(PoolType::Beginner.tag(), "", "p")),
            BucketKey::Beginner
        );
        assert_eq!(
            classify(&record(PoolType::Standard.tag(), "", "p")),
            BucketKey::Standard
        );
        assert_eq!(
            classify(&record(PoolType::Special.tag(), "武器", "p")),
            BucketKey::Special
        );
        assert_eq!(
            classify(&record(PoolType::Weapon.tag(), "", "wp_1")),
            BucketKey::Weapon("wp_1".to_string())
        );
    }

    #[test]
    fn legacy_tag_text_is_matched_by_keyword() {
        assert_eq!(
            classify(&record("WeaponPool", "", "wp_2")),
            BucketKey::Weapon("wp_2".to_string())
        );
        assert_eq!(
            classify(&record("standard_legacy", "", "p")),
            BucketKey::Standard
        );
    }

    #[test]
    fn pool_name_is_consulted_when_tag_is_unhelpful() {
        assert_eq!(classify(&record("", "常驻寻访", "p")), BucketKey::Standard);
        assert_eq!(classify(&record("", "新手寻访", "p")), BucketKey::Beginner);
        assert_eq!(
            classify(&record("unknown", "Weapon Arsenal", "wp_3")),
            BucketKey::Weapon("wp_3".to_string())
        );
    }

    #[test]
    fn tag_keyword_wins_over_pool_name() {
        assert_eq!(
            classify(&record("beginner_old", "Weapon Arsenal", "p")),
            BucketKey::Beginner
        );
    }

    #[test]
    fn unmatched_and_empty_inputs_default_to_special() {
        assert_eq!(classify(&record("", "", "")), BucketKey::Special);
        assert_eq!(classify(&record("???", "限定寻访", "p")), BucketKey::Special);
    }

    #[test]
    fn weapon_with_empty_pool_id_is_still_classified() {
        let key = classify(&record(PoolType::Weapon.tag(), "", ""));
        assert_eq!(key.to_string(), "weapon:");
    }

    #[test]
    fn display_names_are_stable() {
        assert_eq!(BucketKey::Special.to_string(), "special");
        assert_eq!(BucketKey::Weapon("x".into()).to_string(), "weapon:x");
        assert_eq!(BucketKey::Weapon("x".into()).pool_type(), PoolType::Weapon);
    }
}
