//! Domain events reflecting ledger and account state changes.
//!
//! Every sync and account action emits a [`LedgerEvent`] through the
//! [`super::EventBus`]. Events are broadcast to WebSocket subscribers.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::sync::SyncMode;

/// Domain event emitted after a sync step or account change.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A user-initiated sync started.
    SyncStarted {
        /// Account being synced.
        uid: String,
        /// Sync mode.
        mode: SyncMode,
        /// Start timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A sync finished and its records were persisted.
    SyncCompleted {
        /// Account that was synced.
        uid: String,
        /// Sync mode.
        mode: SyncMode,
        /// Number of newly saved records.
        saved: usize,
        /// Whether profile fields changed.
        account_updated: bool,
        /// Completion timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A user-initiated sync failed.
    SyncFailed {
        /// Account that was being synced.
        uid: String,
        /// Sync mode.
        mode: SyncMode,
        /// Human-readable failure.
        message: String,
        /// Failure timestamp.
        timestamp: DateTime<Utc>,
    },

    /// The banner view was rebuilt from storage.
    LedgerReloaded {
        /// Account whose ledger was reloaded.
        uid: String,
        /// Number of records loaded.
        records: usize,
        /// Number of banners built.
        banners: usize,
        /// Reload timestamp.
        timestamp: DateTime<Utc>,
    },

    /// The active account changed.
    AccountSwitched {
        /// Newly active account.
        uid: String,
        /// Switch timestamp.
        timestamp: DateTime<Utc>,
    },

    /// An account and its pulls were deleted.
    AccountDeleted {
        /// Deleted account.
        uid: String,
        /// Deletion timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl LedgerEvent {
    /// Returns the account uid associated with this event.
    #[must_use]
    pub fn uid(&self) -> &str {
        match self {
            Self::SyncStarted { uid, .. }
            | Self::SyncCompleted { uid, .. }
            | Self::SyncFailed { uid, .. }
            | Self::LedgerReloaded { uid, .. }
            | Self::AccountSwitched { uid, .. }
            | Self::AccountDeleted { uid, .. } => uid,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::SyncStarted { .. } => "sync_started",
            Self::SyncCompleted { .. } => "sync_completed",
            Self::SyncFailed { .. } => "sync_failed",
            Self::LedgerReloaded { .. } => "ledger_reloaded",
            Self::AccountSwitched { .. } => "account_switched",
            Self::AccountDeleted { .. } => "account_deleted",
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn sync_completed_event_type() {
        let event = LedgerEvent::SyncCompleted {
            uid: "u1".to_string(),
            mode: SyncMode::Incremental,
            saved: 3,
            account_updated: false,
            timestamp: Utc::now(),
        };
        assert_eq!(event.event_type_str(), "sync_completed");
        assert_eq!(event.uid(), "u1");
    }

    #[test]
    fn ledger_reloaded_serializes() {
        let event = LedgerEvent::LedgerReloaded {
            uid: "u1".to_string(),
            records: 120,
            banners: 4,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap_or_default();
        assert!(json.contains("ledger_reloaded"));
        assert!(json.contains("120"));
    }

    #[test]
    fn sync_mode_serializes_lowercase() {
        let event = LedgerEvent::SyncStarted {
            uid: "u1".to_string(),
            mode: SyncMode::Full,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap_or_default();
        assert!(json.contains(r#""mode":"full""#));
    }
}
