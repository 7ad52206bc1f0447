//! Sync modes and outcomes reported by the ledger synchronizer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::LedgerError;

/// How a sync reconciles local storage with the remote source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Fetch only records newer than each pool's stored cursor.
    #[default]
    Incremental,
    /// Purge invalid records and refetch every pool from the beginning.
    Full,
}

impl SyncMode {
    /// Returns the mode as a static string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Incremental => "incremental",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncMode {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "incremental" => Ok(Self::Incremental),
            "full" => Ok(Self::Full),
            other => Err(LedgerError::InvalidSyncMode(other.to_string())),
        }
    }
}

/// Result of a completed sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct SyncReport {
    /// Account that was synced.
    pub uid: String,
    /// Mode the sync ran in.
    pub mode: SyncMode,
    /// Number of records persisted. 0 means nothing new.
    pub saved: usize,
    /// Whether account profile fields changed.
    pub account_updated: bool,
    /// Pools whose fetch failed and contributed no records.
    pub failed_pools: Vec<String>,
}

/// Why a sync request did no work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A sync of the same account and mode is already running.
    AlreadyRunning,
    /// No account is selected.
    NoActiveAccount,
    /// The account has no session token to query the remote source with.
    MissingToken,
}

/// Outcome of a sync request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The sync ran to completion.
    Completed {
        /// What the sync did.
        report: SyncReport,
    },
    /// The request was a no-op.
    Skipped {
        /// Reason the request was skipped.
        reason: SkipReason,
    },
}

impl SyncOutcome {
    /// Returns the report of a completed sync.
    #[must_use]
    pub const fn report(&self) -> Option<&SyncReport> {
        match self {
            Self::Completed { report } => Some(report),
            Self::Skipped { .. } => None,
        }
    }
}
