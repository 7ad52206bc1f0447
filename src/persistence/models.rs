//! Database row models for pulls and accounts.

use crate::domain::account::DEFAULT_SERVER_ID;
use crate::domain::{Account, AccountTokens, PullRecord, SeqId};

/// A stored row from the `gacha_pulls` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PullRow {
    /// Item display name as reported by the source.
    pub item_name: String,
    /// Item identifier.
    pub item_id: String,
    /// Rarity tier.
    pub rarity: i64,
    /// Pool identifier.
    pub pool_id: String,
    /// Pool display name.
    pub pool_name: String,
    /// Sequence identifier.
    pub seq_id: String,
    /// Pull timestamp, seconds or milliseconds.
    pub pulled_at: i64,
    /// Pool type tag.
    pub pool_type: String,
    /// Free pull flag.
    pub is_free: bool,
    /// First-obtained flag.
    pub is_new: bool,
}

impl From<PullRow> for PullRecord {
    fn from(row: PullRow) -> Self {
        Self {
            name: row.item_name,
            item_id: row.item_id,
            rarity: u8::try_from(row.rarity).unwrap_or(0),
            pool_id: row.pool_id,
            pool_name: row.pool_name,
            seq_id: SeqId::new(row.seq_id),
            pulled_at: row.pulled_at,
            pool_type: row.pool_type,
            is_free: row.is_free,
            is_new: row.is_new,
        }
    }
}

/// A stored row from the `accounts` table, without credentials.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountRow {
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
    /// Last update, epoch seconds.
    pub updated_at: i64,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            uid: row.uid,
            role_id: row.role_id,
            nick_name: row.nick_name,
            server_id: row
                .server_id
                .unwrap_or_else(|| DEFAULT_SERVER_ID.to_string()),
            channel_id: row.channel_id,
            updated_at: row.updated_at,
        }
    }
}

/// Credential columns of the `accounts` table.
#[derive(Clone, sqlx::FromRow)]
pub struct TokenRow {
    /// Account identifier.
    pub uid: String,
    /// Game server id.
    pub server_id: Option<String>,
    /// Distribution channel id.
    pub channel_id: Option<i64>,
    /// Long-lived user token.
    pub user_token: Option<String>,
    /// OAuth token.
    pub oauth_token: Option<String>,
    /// Session token.
    pub session_token: Option<String>,
}

impl std::fmt::Debug for TokenRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRow")
            .field("uid", &self.uid)
            .finish_non_exhaustive()
    }
}

impl From<TokenRow> for AccountTokens {
    fn from(row: TokenRow) -> Self {
        Self {
            uid: row.uid,
            server_id: row
                .server_id
                .unwrap_or_else(|| DEFAULT_SERVER_ID.to_string()),
            channel_id: row.channel_id,
            user_token: row.user_token,
            oauth_token: row.oauth_token,
            session_token: row.session_token,
        }
    }
}
