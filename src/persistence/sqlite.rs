//! SQLite implementation of the persistence layer.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use super::LedgerStore;
use super::models::{AccountRow, PullRow, TokenRow};
use crate::domain::{Account, AccountTokens, AccountUpsert, PullRecord};
use crate::error::LedgerError;

/// Schema version stamped into `PRAGMA user_version`.
///
/// Version 0 is an unstamped database from before versioning and is
/// adopted as-is; anything newer than this is refused.
pub const SCHEMA_VERSION: i64 = 2;

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS gacha_pulls (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  uid TEXT NOT NULL,
  pool_id TEXT NOT NULL,
  pool_name TEXT NOT NULL,
  item_name TEXT NOT NULL,
  item_id TEXT NOT NULL DEFAULT '',
  rarity INTEGER NOT NULL,
  pulled_at INTEGER NOT NULL,
  seq_id TEXT NOT NULL,
  pool_type TEXT NOT NULL DEFAULT '',
  is_free INTEGER NOT NULL DEFAULT 0,
  is_new INTEGER NOT NULL DEFAULT 0,
  UNIQUE (uid, pool_type, pool_id, seq_id)
);
CREATE INDEX IF NOT EXISTS idx_gacha_pulls_uid_time ON gacha_pulls(uid, pulled_at DESC);
CREATE INDEX IF NOT EXISTS idx_gacha_pulls_seq_id ON gacha_pulls(seq_id);

CREATE TABLE IF NOT EXISTS accounts (
  uid TEXT PRIMARY KEY,
  role_id TEXT,
  nick_name TEXT,
  server_id TEXT,
  channel_id INTEGER,
  user_token TEXT,
  oauth_token TEXT,
  session_token TEXT,
  created_at INTEGER NOT NULL DEFAULT (unixepoch()),
  updated_at INTEGER NOT NULL DEFAULT (unixepoch())
);
CREATE INDEX IF NOT EXISTS idx_accounts_updated_at ON accounts(updated_at DESC);
";

const UPSERT_PULL: &str = "INSERT INTO gacha_pulls \
     (uid, pool_id, pool_name, item_name, item_id, rarity, pulled_at, seq_id, pool_type, is_free, is_new) \
     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
     ON CONFLICT (uid, pool_type, pool_id, seq_id) DO UPDATE SET \
       pool_name = excluded.pool_name, \
       item_name = excluded.item_name, \
       item_id = excluded.item_id, \
       rarity = excluded.rarity, \
       pulled_at = excluded.pulled_at, \
       is_free = excluded.is_free, \
       is_new = excluded.is_new";

const UPSERT_ACCOUNT: &str = "INSERT INTO accounts \
     (uid, role_id, nick_name, server_id, channel_id, user_token, oauth_token, session_token, created_at, updated_at) \
     VALUES (?, ?, ?, ?, ?, NULLIF(?, ''), NULLIF(?, ''), NULLIF(?, ''), unixepoch(), unixepoch()) \
     ON CONFLICT (uid) DO UPDATE SET \
       role_id = COALESCE(excluded.role_id, accounts.role_id), \
       nick_name = COALESCE(excluded.nick_name, accounts.nick_name), \
       server_id = COALESCE(excluded.server_id, accounts.server_id), \
       channel_id = COALESCE(excluded.channel_id, accounts.channel_id), \
       user_token = COALESCE(excluded.user_token, accounts.user_token), \
       oauth_token = COALESCE(excluded.oauth_token, accounts.oauth_token), \
       session_token = COALESCE(excluded.session_token, accounts.session_token), \
       updated_at = unixepoch()";

/// SQLite-backed [`LedgerStore`] using `sqlx::SqlitePool`.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Wraps an existing pool. The schema is assumed to be in place.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if missing) the database at `url` and migrates it.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError::PersistenceError`] if the URL is invalid,
    /// the database cannot be opened, or its schema is newer than
    /// [`SCHEMA_VERSION`].
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, LedgerError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        if let Some(parent) = options.get_filename().parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LedgerError::PersistenceError(e.to_string()))?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        let store = Self::new(pool);
        store.migrate().await?;
        tracing::info!(url, "sqlite store ready");
        Ok(store)
    }

    /// Opens a private in-memory database with a single connection.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError::PersistenceError`] on database failure.
    pub async fn in_memory() -> Result<Self, LedgerError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Creates tables and indices if needed and stamps the schema version.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError::PersistenceError`] on database failure or
    /// when the stored schema is newer than [`SCHEMA_VERSION`].
    pub async fn migrate(&self) -> Result<(), LedgerError> {
        let found: i64 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(&self.pool)
            .await?;
        if found > SCHEMA_VERSION {
            return Err(LedgerError::PersistenceError(format!(
                "database schema version mismatch (found {found}, expected {SCHEMA_VERSION})"
            )));
        }

        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;

        if found < SCHEMA_VERSION {
            sqlx::raw_sql(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))
                .execute(&self.pool)
                .await?;
            tracing::debug!(from = found, to = SCHEMA_VERSION, "schema version stamped");
        }
        Ok(())
    }

    /// Returns the stored schema version.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError::PersistenceError`] on database failure.
    pub async fn schema_version(&self) -> Result<i64, LedgerError> {
        Ok(sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(&self.pool)
            .await?)
    }
}

#[async_trait]
impl LedgerStore for SqliteStore {
    async fn list_pulls(&self, uid: &str, limit: u32) -> Result<Vec<PullRecord>, LedgerError> {
        let rows = sqlx::query_as::<_, PullRow>(
            "SELECT item_name, item_id, rarity, pool_id, pool_name, seq_id, pulled_at, pool_type, is_free, is_new \
             FROM gacha_pulls WHERE uid = ? ORDER BY pulled_at DESC LIMIT ?",
        )
        .bind(uid)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PullRecord::from).collect())
    }

    async fn save_pulls(&self, uid: &str, records: &[PullRecord]) -> Result<usize, LedgerError> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut written: u64 = 0;
        for r in records {
            written += sqlx::query(UPSERT_PULL)
                .bind(uid)
                .bind(&r.pool_id)
                .bind(&r.pool_name)
                .bind(&r.name)
                .bind(&r.item_id)
                .bind(i64::from(r.rarity))
                .bind(r.pulled_at)
                .bind(r.seq_id.as_str())
                .bind(&r.pool_type)
                .bind(r.is_free)
                .bind(r.is_new)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }
        tx.commit().await?;

        tracing::debug!(uid, written, "pulls saved");
        Ok(usize::try_from(written).unwrap_or(usize::MAX))
    }

    async fn delete_invalid_pulls(&self, uid: &str) -> Result<u64, LedgerError> {
        let result = sqlx::query("DELETE FROM gacha_pulls WHERE uid = ? AND pulled_at = 0")
            .bind(uid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_account(&self, uid: &str) -> Result<(), LedgerError> {
        let mut tx = self.pool.begin().await?;
        let pulls = sqlx::query("DELETE FROM gacha_pulls WHERE uid = ?")
            .bind(uid)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("DELETE FROM accounts WHERE uid = ?")
            .bind(uid)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(uid, pulls, "account deleted");
        Ok(())
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, LedgerError> {
        let rows = sqlx::query_as::<_, AccountRow>(
            "SELECT uid, role_id, nick_name, server_id, channel_id, updated_at \
             FROM accounts ORDER BY updated_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Account::from).collect())
    }

    async fn upsert_account(&self, fields: &AccountUpsert) -> Result<(), LedgerError> {
        sqlx::query(UPSERT_ACCOUNT)
            .bind(&fields.uid)
            .bind(&fields.role_id)
            .bind(&fields.nick_name)
            .bind(&fields.server_id)
            .bind(fields.channel_id)
            .bind(&fields.user_token)
            .bind(&fields.oauth_token)
            .bind(&fields.session_token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_account_tokens(&self, uid: &str) -> Result<Option<AccountTokens>, LedgerError> {
        let row = sqlx::query_as::<_, TokenRow>(
            "SELECT uid, server_id, channel_id, user_token, oauth_token, session_token \
             FROM accounts WHERE uid = ? LIMIT 1",
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(AccountTokens::from))
    }
}
