//! Player accounts that own pull records.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Default game server when none was recorded.
pub const DEFAULT_SERVER_ID: &str = "1";

/// Channel id of the global distribution.
const GLOBAL_CHANNEL_ID: i64 = 6;

/// Channel id of the mainland distribution.
const MAINLAND_CHANNEL_ID: i64 = 1;

/// Public profile of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Account {
    /// Account identifier. Foreign key of every pull row.
    pub uid: String,
    /// In-game role id.
    pub role_id: Option<String>,
    /// In-game nickname.
    pub nick_name: Option<String>,
    /// Game server id.
    pub server_id: String,
    /// Distribution channel id.
    pub channel_id: Option<i64>,
    /// Last update, epoch seconds.
    pub updated_at: i64,
}

/// Stored credentials of an account.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AccountTokens {
    /// Account identifier.
    pub uid: String,
    /// Game server id.
    pub server_id: String,
    /// Distribution channel id.
    pub channel_id: Option<i64>,
    /// Long-lived user token.
    pub user_token: Option<String>,
    /// OAuth token.
    pub oauth_token: Option<String>,
    /// Session token accepted by the record source.
    pub session_token: Option<String>,
}

impl AccountTokens {
    /// Returns the session token if one is stored and non-empty.
    #[must_use]
    pub fn session(&self) -> Option<&str> {
        self.session_token.as_deref().filter(|t| !t.is_empty())
    }

    /// Returns the remote provider this account belongs to.
    #[must_use]
    pub const fn provider(&self) -> Provider {
        Provider::from_channel_id(self.channel_id)
    }
}

impl std::fmt::Debug for AccountTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountTokens")
            .field("uid", &self.uid)
            .field("server_id", &self.server_id)
            .field("channel_id", &self.channel_id)
            .field("session_token", &self.session().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

/// Fields written by an account upsert. `None` leaves the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountUpsert {
    /// Account identifier.
    pub uid: String,
    /// In-game role id.
    pub role_id: Option<String>,
    /// In-game nickname.
    pub nick_name: Option<String>,
    /// Game server id.
    pub server_id: Option<String>,
    /// Distribution channel id.
    pub channel_id: Option<i64>,
    /// User token; empty strings never overwrite.
    pub user_token: Option<String>,
    /// OAuth token; empty strings never overwrite.
    pub oauth_token: Option<String>,
    /// Session token; empty strings never overwrite.
    pub session_token: Option<String>,
}

/// Role identity reported by the record source for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleProfile {
    /// Account identifier the session belongs to.
    pub uid: String,
    /// In-game role id.
    pub role_id: Option<String>,
    /// In-game nickname.
    pub nick_name: Option<String>,
    /// Distribution channel id.
    pub channel_id: Option<i64>,
}

impl RoleProfile {
    /// Returns `true` if applying this profile would change `account`.
    #[must_use]
    pub fn differs_from(&self, account: &AccountTokens, current: Option<&Account>) -> bool {
        let changed = |new: &Option<String>, old: Option<&Option<String>>| {
            new.is_some() && old.is_none_or(|o| o != new)
        };
        changed(&self.role_id, current.map(|a| &a.role_id))
            || changed(&self.nick_name, current.map(|a| &a.nick_name))
            || (self.channel_id.is_some() && self.channel_id != account.channel_id)
    }
}

/// Remote distribution the account lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// Mainland distribution.
    #[default]
    Hypergryph,
    /// Global distribution.
    Gryphline,
}

impl Provider {
    /// Maps a stored channel id to its provider.
    #[must_use]
    pub const fn from_channel_id(channel_id: Option<i64>) -> Self {
        match channel_id {
            Some(GLOBAL_CHANNEL_ID) => Self::Gryphline,
            _ => Self::Hypergryph,
        }
    }

    /// Channel id stored for accounts of this provider.
    #[must_use]
    pub const fn channel_id(self) -> i64 {
        match self {
            Self::Hypergryph => MAINLAND_CHANNEL_ID,
            Self::Gryphline => GLOBAL_CHANNEL_ID,
        }
    }

    /// Host segment used in remote URLs.
    #[must_use]
    pub const fn host(self) -> &'static str {
        match self {
            Self::Hypergryph => "hypergryph",
            Self::Gryphline => "gryphline",
        }
    }

    /// Parses a provider name, case-insensitively and ignoring whitespace.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "hypergryph" => Some(Self::Hypergryph),
            "gryphline" => Some(Self::Gryphline),
            _ => None,
        }
    }
}
