//! Sync request DTOs.

use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{Provider, SyncMode};
use crate::service::ExternalSession;

/// Request body for `POST /sync`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SyncRequest {
    /// `incremental` (default) or `full`.
    #[serde(default)]
    pub mode: Option<String>,
}

/// Request body for `POST /sync/external`.
#[derive(Deserialize, ToSchema)]
pub struct ExternalSyncRequest {
    /// `incremental` (default) or `full`.
    #[serde(default)]
    pub mode: Option<String>,
    /// Session token obtained outside the ledger.
    pub token: String,
    /// Game server id. Defaults to `1`.
    #[serde(default)]
    pub server_id: Option<String>,
    /// `hypergryph` or `gryphline`. Defaults to the configured provider.
    #[serde(default)]
    pub provider: Option<Provider>,
}

impl std::fmt::Debug for ExternalSyncRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalSyncRequest")
            .field("mode", &self.mode)
            .field("server_id", &self.server_id)
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

impl ExternalSyncRequest {
    /// Splits the request into its mode string and session.
    #[must_use]
    pub fn into_parts(self) -> (Option<String>, ExternalSession) {
        (
            self.mode,
            ExternalSession {
                token: self.token,
                server_id: self.server_id,
                provider: self.provider,
            },
        )
    }
}

/// Parses an optional mode string, defaulting to incremental.
///
/// # Errors
///
/// Returns [`crate::error::LedgerError::InvalidSyncMode`] for unknown
/// modes.
pub fn parse_mode(raw: Option<&str>) -> Result<SyncMode, crate::error::LedgerError> {
    raw.map_or(Ok(SyncMode::default()), str::parse)
}
