//! Remote record source: the game's paginated pull-history API.
//!
//! The synchronizer only sees the [`RemoteSource`] trait. The concrete
//! [`HttpRemoteSource`] talks to the provider's web endpoints with
//! `reqwest`; tests script their own implementations.

pub mod http;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{PoolType, Provider, PullRecord, RoleProfile, SeqId};
use crate::error::LedgerError;

pub use http::HttpRemoteSource;

/// One remotely queryable pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PoolTarget {
    /// A character pool family, queried by its type tag.
    Character(PoolType),
    /// A single weapon pool, queried by id.
    Weapon {
        /// Weapon pool identifier.
        pool_id: String,
    },
}

impl PoolTarget {
    /// Key under which the sync cursor of this pool is tracked.
    ///
    /// Agrees with [`PullRecord::cursor_key`] for records fetched from it.
    #[must_use]
    pub fn cursor_key(&self) -> String {
        match self {
            Self::Character(pool_type) => pool_type.tag().to_string(),
            Self::Weapon { pool_id } => pool_id.clone(),
        }
    }
}

impl fmt::Display for PoolTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Character(pool_type) => f.write_str(pool_type.tag()),
            Self::Weapon { pool_id } => write!(f, "weapon:{pool_id}"),
        }
    }
}

/// A weapon pool advertised by the remote source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WeaponPool {
    /// Pool identifier.
    pub pool_id: String,
    /// Pool display name.
    pub pool_name: String,
}

/// Credentials and routing for remote calls.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// Session token accepted by the record endpoints.
    pub token: String,
    /// Game server id.
    pub server_id: String,
    /// Distribution whose hosts are queried.
    pub provider: Provider,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("server_id", &self.server_id)
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

/// Ordered-record source for one account's pull history.
#[async_trait]
pub trait RemoteSource: Send + Sync + fmt::Debug {
    /// Fetches the records of one pool, newest first.
    ///
    /// When `since` is given, fetching stops at the first record at or
    /// below it. Callers must still filter, the source may overshoot.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError::Remote`] on transport failure or when the
    /// source rejects the request.
    async fn fetch_pool_records(
        &self,
        session: &Session,
        target: &PoolTarget,
        since: Option<&SeqId>,
    ) -> Result<Vec<PullRecord>, LedgerError>;

    /// Lists the weapon pools the account can query.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError::Remote`] on transport failure or when the
    /// source rejects the request.
    async fn fetch_weapon_pools(&self, session: &Session) -> Result<Vec<WeaponPool>, LedgerError>;

    /// Resolves the role identity behind a session, if the source knows it.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError::Remote`] on transport failure or when the
    /// source rejects the request.
    async fn fetch_profile(&self, session: &Session) -> Result<Option<RoleProfile>, LedgerError>;
}
