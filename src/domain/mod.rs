//! Domain layer: pull records, analytics, accounts, and events.
//!
//! Everything in this module is free of I/O. The classifier, statistics
//! engine and featured resolver are pure functions over pull records;
//! [`banner::assemble_banners`] chains them into presentation view models.

pub mod account;
pub mod banner;
pub mod classifier;
pub mod event_bus;
pub mod featured;
pub mod ledger_event;
pub mod pull_record;
pub mod stats;
pub mod sync;

pub use account::{
    Account, AccountTokens, AccountUpsert, DEFAULT_SERVER_ID, Provider, RoleProfile,
};
pub use banner::{BannerSummary, ItemCatalog, ItemCategory, RecordNames, assemble_banners};
pub use classifier::{BucketKey, classify};
pub use event_bus::EventBus;
pub use featured::{FeaturedChecker, PoolMetadataEntry};
pub use ledger_event::LedgerEvent;
pub use pull_record::{PoolType, PullRecord, SeqId};
pub use stats::{BannerStats, compute_stats};
pub use sync::{SkipReason, SyncMode, SyncOutcome, SyncReport};
