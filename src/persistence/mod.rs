//! Persistence layer: pull records and accounts.
//!
//! Provides the [`LedgerStore`] trait, the narrow read/write contract the
//! synchronizer and ledger service depend on. The concrete implementation
//! uses `sqlx::SqlitePool` for async SQLite access.

pub mod models;
pub mod sqlite;

use async_trait::async_trait;

use crate::domain::{Account, AccountTokens, AccountUpsert, PullRecord};
use crate::error::LedgerError;

pub use sqlite::SqliteStore;

/// Durable storage of pull records and accounts.
#[async_trait]
pub trait LedgerStore: Send + Sync + std::fmt::Debug {
    /// Lists up to `limit` pulls of `uid`. Order is unspecified.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError::PersistenceError`] on database failure.
    async fn list_pulls(&self, uid: &str, limit: u32) -> Result<Vec<PullRecord>, LedgerError>;

    /// Upserts `records` for `uid` in one transaction, returning the number
    /// of rows written.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError::PersistenceError`] on database failure.
    /// Nothing is written in that case.
    async fn save_pulls(&self, uid: &str, records: &[PullRecord]) -> Result<usize, LedgerError>;

    /// Deletes pulls of `uid` that carry no timestamp.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError::PersistenceError`] on database failure.
    async fn delete_invalid_pulls(&self, uid: &str) -> Result<u64, LedgerError>;

    /// Deletes an account together with all of its pulls.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError::PersistenceError`] on database failure.
    async fn delete_account(&self, uid: &str) -> Result<(), LedgerError>;

    /// Lists accounts, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError::PersistenceError`] on database failure.
    async fn list_accounts(&self) -> Result<Vec<Account>, LedgerError>;

    /// Inserts or updates an account. Absent fields keep their stored
    /// values.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError::PersistenceError`] on database failure.
    async fn upsert_account(&self, fields: &AccountUpsert) -> Result<(), LedgerError>;

    /// Loads the credentials of `uid`, if the account exists.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError::PersistenceError`] on database failure.
    async fn get_account_tokens(&self, uid: &str) -> Result<Option<AccountTokens>, LedgerError>;
}
