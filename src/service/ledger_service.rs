//! Ledger service: active account, banner view and sync actions.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::cache::{MetadataLookup, MetadataStatus};
use crate::config::LedgerConfig;
use crate::domain::{
    Account, AccountUpsert, BannerSummary, DEFAULT_SERVER_ID, EventBus, LedgerEvent, Provider,
    SkipReason, SyncMode, SyncOutcome, assemble_banners,
};
use crate::error::LedgerError;
use crate::persistence::LedgerStore;
use crate::remote::{RemoteSource, Session};

use super::sync_service::LedgerSynchronizer;

/// A session obtained outside the ledger, e.g. from a game launcher.
#[derive(Clone, PartialEq, Eq)]
pub struct ExternalSession {
    /// Session token accepted by the record source.
    pub token: String,
    /// Game server id. Defaults to the primary server.
    pub server_id: Option<String>,
    /// Distribution. Defaults to the configured provider.
    pub provider: Option<Provider>,
}

impl fmt::Debug for ExternalSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalSession")
            .field("server_id", &self.server_id)
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

/// Orchestration layer behind the REST and WebSocket surface.
///
/// Owns the active account selection and the banner view built from it.
/// Every action follows the same pattern: validate, touch storage or the
/// remote source, emit events, rebuild the view.
#[derive(Debug)]
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
    remote: Arc<dyn RemoteSource>,
    synchronizer: LedgerSynchronizer,
    metadata: Arc<MetadataLookup>,
    event_bus: EventBus,
    active: RwLock<Option<String>>,
    banners: RwLock<Vec<BannerSummary>>,
    list_limit: u32,
    default_provider: Provider,
}

impl LedgerService {
    /// Creates a service with no active account.
    #[must_use]
    pub fn new(
        store: Arc<dyn LedgerStore>,
        remote: Arc<dyn RemoteSource>,
        metadata: Arc<MetadataLookup>,
        event_bus: EventBus,
        config: &LedgerConfig,
    ) -> Self {
        let synchronizer = LedgerSynchronizer::new(
            Arc::clone(&store),
            Arc::clone(&remote),
            event_bus.clone(),
            config.ledger_list_limit,
        );
        Self {
            store,
            remote,
            synchronizer,
            metadata,
            event_bus,
            active: RwLock::new(None),
            banners: RwLock::new(Vec::new()),
            list_limit: config.ledger_list_limit,
            default_provider: config.remote_provider,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns the metadata lookup used to label banners.
    #[must_use]
    pub fn metadata(&self) -> &Arc<MetadataLookup> {
        &self.metadata
    }

    /// Selects the most recently updated account and builds its view.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError::PersistenceError`] if storage fails.
    pub async fn init(&self) -> Result<Option<String>, LedgerError> {
        let uid = self.store.list_accounts().await?.into_iter().next().map(|a| a.uid);
        *self.active.write().await = uid.clone();
        self.reload().await?;
        tracing::info!(uid = uid.as_deref().unwrap_or("-"), "ledger initialized");
        Ok(uid)
    }

    /// Currently selected account.
    pub async fn active_uid(&self) -> Option<String> {
        self.active.read().await.clone()
    }

    /// Banner summaries of the active account.
    pub async fn banners(&self) -> Vec<BannerSummary> {
        self.banners.read().await.clone()
    }

    /// Lists every stored account, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError::PersistenceError`] if storage fails.
    pub async fn accounts(&self) -> Result<Vec<Account>, LedgerError> {
        self.store.list_accounts().await
    }

    /// Syncs the active account and rebuilds the view.
    ///
    /// Failures are returned and published as [`LedgerEvent::SyncFailed`].
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AccountNotFound`] if the active account was
    /// removed, or a storage error. An account without a session token is
    /// skipped, not failed.
    pub async fn refresh(&self, mode: SyncMode) -> Result<SyncOutcome, LedgerError> {
        let uid = self.active_uid().await;
        let result = self.sync_active(uid.as_deref(), mode).await;
        if let (Err(e), Some(uid)) = (&result, uid) {
            self.event_bus.publish(LedgerEvent::SyncFailed {
                uid,
                mode,
                message: e.to_string(),
                timestamp: Utc::now(),
            });
        }
        result
    }

    /// Registers the account behind an external session, switches to it
    /// and syncs it.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidRequest`] for an empty token,
    /// [`LedgerError::Remote`] if the session resolves to no role, or any
    /// error of [`Self::refresh`].
    pub async fn refresh_from_external_source(
        &self,
        mode: SyncMode,
        external: ExternalSession,
    ) -> Result<SyncOutcome, LedgerError> {
        let token = external.token.trim().to_string();
        if token.is_empty() {
            return Err(LedgerError::InvalidRequest("session token is empty".to_string()));
        }
        let provider = external.provider.unwrap_or(self.default_provider);
        let server_id = external
            .server_id
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SERVER_ID.to_string());
        let session = Session {
            token,
            server_id,
            provider,
        };

        let Some(profile) = self.remote.fetch_profile(&session).await? else {
            return Err(LedgerError::Remote("session has no bound role".to_string()));
        };
        tracing::info!(uid = %profile.uid, ?provider, "external session resolved");

        self.store
            .upsert_account(&AccountUpsert {
                uid: profile.uid.clone(),
                role_id: profile.role_id,
                nick_name: profile.nick_name,
                server_id: Some(session.server_id),
                channel_id: Some(profile.channel_id.unwrap_or(provider.channel_id())),
                session_token: Some(session.token),
                ..AccountUpsert::default()
            })
            .await?;

        self.switch_account(&profile.uid).await?;
        self.refresh(mode).await
    }

    /// Makes `uid` the active account and rebuilds the view.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AccountNotFound`] for an unknown account or a
    /// storage error.
    pub async fn switch_account(&self, uid: &str) -> Result<(), LedgerError> {
        if self.store.get_account_tokens(uid).await?.is_none() {
            return Err(LedgerError::AccountNotFound(uid.to_string()));
        }
        *self.active.write().await = Some(uid.to_string());
        tracing::info!(uid, "active account switched");
        self.event_bus.publish(LedgerEvent::AccountSwitched {
            uid: uid.to_string(),
            timestamp: Utc::now(),
        });
        self.reload().await?;
        Ok(())
    }

    /// Deletes the active account with its pulls and selects the next
    /// most recent account, if any.
    ///
    /// Returns the newly active account.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NoActiveAccount`] when nothing is selected,
    /// or a storage error.
    pub async fn delete_account(&self) -> Result<Option<String>, LedgerError> {
        let Some(uid) = self.active_uid().await else {
            return Err(LedgerError::NoActiveAccount);
        };
        self.store.delete_account(&uid).await?;
        tracing::info!(uid = %uid, "account deleted");
        self.event_bus.publish(LedgerEvent::AccountDeleted {
            uid,
            timestamp: Utc::now(),
        });

        let next = self.store.list_accounts().await?.into_iter().next().map(|a| a.uid);
        *self.active.write().await = next.clone();
        if let Some(uid) = &next {
            self.event_bus.publish(LedgerEvent::AccountSwitched {
                uid: uid.clone(),
                timestamp: Utc::now(),
            });
        }
        self.reload().await?;
        Ok(next)
    }

    /// Rebuilds the banner view of the active account from storage.
    ///
    /// Returns the number of banners built.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError::PersistenceError`] if storage fails. The
    /// previous view is kept in that case.
    pub async fn reload(&self) -> Result<usize, LedgerError> {
        let Some(uid) = self.active_uid().await else {
            self.banners.write().await.clear();
            return Ok(0);
        };

        let pulls = self.store.list_pulls(&uid, self.list_limit).await?;
        let records = pulls.len();
        let (names, featured) =
            tokio::join!(self.metadata.item_names(), self.metadata.featured_checker());
        let banners = assemble_banners(pulls, &featured, &names);
        let count = banners.len();
        *self.banners.write().await = banners;

        tracing::debug!(uid = %uid, records, banners = count, "ledger reloaded");
        self.event_bus.publish(LedgerEvent::LedgerReloaded {
            uid,
            records,
            banners: count,
            timestamp: Utc::now(),
        });
        Ok(count)
    }

    /// Changes the metadata language and/or directory, then rebuilds the
    /// banner view so names and rate-up windows follow the new package.
    ///
    /// The remote source keeps the language it was configured with.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidRequest`] for a blank language or
    /// directory, or a storage error from the rebuild.
    pub async fn set_metadata_settings(
        &self,
        language: Option<&str>,
        dir: Option<PathBuf>,
    ) -> Result<MetadataStatus, LedgerError> {
        let language = language.map(str::trim);
        if language.is_some_and(str::is_empty) {
            return Err(LedgerError::InvalidRequest("language is empty".to_string()));
        }
        if dir.as_ref().is_some_and(|d| d.as_os_str().is_empty()) {
            return Err(LedgerError::InvalidRequest("metadata directory is empty".to_string()));
        }

        if let Some(language) = language {
            self.metadata.set_language(language);
        }
        if let Some(dir) = dir {
            self.metadata.set_metadata_dir(dir);
        }
        self.reload().await?;
        Ok(self.metadata.status().await)
    }

    /// Syncs the active account in the background. Failures are logged
    /// only.
    pub fn spawn_background_sync(self: &Arc<Self>, mode: SyncMode) -> JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let uid = service.active_uid().await;
            match service.sync_active(uid.as_deref(), mode).await {
                Ok(SyncOutcome::Completed { report }) => {
                    tracing::info!(uid = %report.uid, %mode, saved = report.saved, "background sync finished");
                }
                Ok(SyncOutcome::Skipped { reason }) => {
                    tracing::info!(%mode, ?reason, "background sync skipped");
                }
                Err(e) => tracing::warn!(%mode, error = %e, "background sync failed"),
            }
        })
    }

    async fn sync_active(
        &self,
        uid: Option<&str>,
        mode: SyncMode,
    ) -> Result<SyncOutcome, LedgerError> {
        let Some(uid) = uid else {
            tracing::warn!(%mode, "sync requested without an active account");
            return Ok(SyncOutcome::Skipped {
                reason: SkipReason::NoActiveAccount,
            });
        };
        let Some(tokens) = self.store.get_account_tokens(uid).await? else {
            tracing::warn!(uid, "active account no longer stored");
            return Err(LedgerError::AccountNotFound(uid.to_string()));
        };

        let outcome = self.synchronizer.sync(&tokens, mode).await?;
        if let Some(report) = outcome.report() {
            self.event_bus.publish(LedgerEvent::SyncCompleted {
                uid: report.uid.clone(),
                mode,
                saved: report.saved,
                account_updated: report.account_updated,
                timestamp: Utc::now(),
            });
            self.reload().await?;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use tokio::sync::broadcast::Receiver;

    use super::*;
    use crate::domain::pull_record::fixtures::pull;
    use crate::domain::{PoolType, RoleProfile};
    use crate::persistence::SqliteStore;
    use crate::service::sync_service::tests::{ScriptedRemote, memory_store};

    struct Fixture {
        store: Arc<SqliteStore>,
        remote: Arc<ScriptedRemote>,
        service: Arc<LedgerService>,
        events: Receiver<LedgerEvent>,
        _metadata_dir: tempfile::TempDir,
    }

    async fn fixture(remote: ScriptedRemote) -> Fixture {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir should be created");
        };
        let store = Arc::new(memory_store().await);
        let remote = Arc::new(remote);
        let metadata = Arc::new(MetadataLookup::new(dir.path(), "en-us", "en-us"));
        let bus = EventBus::new(64);
        let events = bus.subscribe();
        let service = Arc::new(LedgerService::new(
            Arc::clone(&store) as Arc<dyn LedgerStore>,
            Arc::clone(&remote) as Arc<dyn RemoteSource>,
            metadata,
            bus,
            &LedgerConfig::default(),
        ));
        Fixture {
            store,
            remote,
            service,
            events,
            _metadata_dir: dir,
        }
    }

    async fn seed_account(store: &SqliteStore, uid: &str, token: &str) {
        let fields = AccountUpsert {
            uid: uid.to_string(),
            session_token: Some(token.to_string()),
            ..AccountUpsert::default()
        };
        assert!(store.upsert_account(&fields).await.is_ok());
    }

    fn drain(events: &mut Receiver<LedgerEvent>) -> Vec<&'static str> {
        std::iter::from_fn(|| events.try_recv().ok())
            .map(|e| e.event_type_str())
            .collect()
    }

    fn special_pulls() -> Vec<crate::domain::PullRecord> {
        vec![
            pull(6, "A", "special_1", "3", 1_700_000_300),
            pull(4, "b", "special_1", "2", 1_700_000_200),
            pull(4, "c", "special_1", "1", 1_700_000_100),
        ]
    }

    #[tokio::test]
    async fn refresh_without_account_is_skipped() {
        let mut fx = fixture(ScriptedRemote::default()).await;
        let Ok(None) = fx.service.init().await else {
            panic!("empty store should have no active account");
        };

        let outcome = fx.service.refresh(SyncMode::Incremental).await;
        assert!(matches!(
            outcome,
            Ok(SyncOutcome::Skipped {
                reason: SkipReason::NoActiveAccount
            })
        ));
        assert!(fx.remote.calls().is_empty());
        assert!(!drain(&mut fx.events).contains(&"sync_failed"));
    }

    #[tokio::test]
    async fn refresh_syncs_and_rebuilds_banners() {
        let remote = ScriptedRemote::default().with_pool(PoolType::Special.tag(), special_pulls());
        let mut fx = fixture(remote).await;
        seed_account(&fx.store, "u1", "session").await;
        let Ok(Some(uid)) = fx.service.init().await else {
            panic!("seeded account should be selected");
        };
        assert_eq!(uid, "u1");
        assert!(fx.service.banners().await.is_empty());
        drain(&mut fx.events);

        let Ok(SyncOutcome::Completed { report }) = fx.service.refresh(SyncMode::Incremental).await
        else {
            panic!("sync should complete");
        };
        assert_eq!(report.saved, 3);

        let banners = fx.service.banners().await;
        let Some(banner) = banners.first() else {
            panic!("expected a special banner");
        };
        assert_eq!(banner.stats.total, 3);
        assert_eq!(banner.stats.s6, 1);
        assert_eq!(banner.top_history.len(), 1);

        assert_eq!(
            drain(&mut fx.events),
            vec!["sync_started", "sync_completed", "ledger_reloaded"]
        );
    }

    #[tokio::test]
    async fn missing_token_is_skipped_without_failure_event() {
        let mut fx = fixture(ScriptedRemote::default()).await;
        seed_account(&fx.store, "u1", "").await;
        assert!(fx.service.init().await.is_ok());
        drain(&mut fx.events);

        assert!(matches!(
            fx.service.refresh(SyncMode::Full).await,
            Ok(SyncOutcome::Skipped {
                reason: SkipReason::MissingToken
            })
        ));
        assert!(fx.remote.calls().is_empty());
        assert!(drain(&mut fx.events).is_empty());
    }

    #[tokio::test]
    async fn vanished_active_account_fails_and_publishes_event() {
        let mut fx = fixture(ScriptedRemote::default()).await;
        seed_account(&fx.store, "u1", "session").await;
        assert!(fx.service.init().await.is_ok());
        assert!(fx.store.delete_account("u1").await.is_ok());
        drain(&mut fx.events);

        assert!(matches!(
            fx.service.refresh(SyncMode::Incremental).await,
            Err(LedgerError::AccountNotFound(_))
        ));
        assert_eq!(drain(&mut fx.events), vec!["sync_failed"]);
    }

    #[tokio::test]
    async fn external_session_registers_and_syncs_account() {
        let remote = ScriptedRemote {
            profile: Some(RoleProfile {
                uid: "ext".to_string(),
                role_id: Some("r9".to_string()),
                nick_name: Some("Endmin".to_string()),
                channel_id: None,
            }),
            ..ScriptedRemote::default()
        }
        .with_pool(PoolType::Special.tag(), special_pulls());
        let fx = fixture(remote).await;

        let external = ExternalSession {
            token: "launcher-token".to_string(),
            server_id: None,
            provider: Some(Provider::Gryphline),
        };
        let outcome = fx
            .service
            .refresh_from_external_source(SyncMode::Full, external)
            .await;
        let Ok(SyncOutcome::Completed { report }) = outcome else {
            panic!("external sync should complete, got {outcome:?}");
        };
        assert_eq!(report.uid, "ext");
        assert_eq!(fx.service.active_uid().await.as_deref(), Some("ext"));

        let Ok(Some(tokens)) = fx.store.get_account_tokens("ext").await else {
            panic!("account should be stored");
        };
        assert_eq!(tokens.session(), Some("launcher-token"));
        assert_eq!(tokens.provider(), Provider::Gryphline);
        assert_eq!(tokens.server_id, DEFAULT_SERVER_ID);
    }

    #[tokio::test]
    async fn external_session_without_role_is_rejected() {
        let fx = fixture(ScriptedRemote::default()).await;
        let external = ExternalSession {
            token: "t".to_string(),
            server_id: Some("2".to_string()),
            provider: None,
        };
        assert!(matches!(
            fx.service
                .refresh_from_external_source(SyncMode::Incremental, external)
                .await,
            Err(LedgerError::Remote(_))
        ));
        assert!(matches!(fx.service.accounts().await, Ok(accounts) if accounts.is_empty()));
    }

    #[tokio::test]
    async fn metadata_settings_relabel_banners() {
        let mut fx = fixture(ScriptedRemote::default()).await;
        seed_account(&fx.store, "u1", "session").await;
        assert!(fx.store.save_pulls("u1", &special_pulls()).await.is_ok());
        assert!(fx.service.init().await.is_ok());
        let top_name = |banners: &[crate::domain::BannerSummary]| {
            banners
                .first()
                .and_then(|b| b.top_history.first())
                .map(|t| t.name.clone())
        };
        assert_eq!(top_name(&fx.service.banners().await).as_deref(), Some("A"));

        let Ok(other) = tempfile::tempdir() else {
            panic!("tempdir should be created");
        };
        let ja = other.path().join("i18n").join("ja");
        assert!(tokio::fs::create_dir_all(&ja).await.is_ok());
        assert!(tokio::fs::write(ja.join("character.json"), r#"{"A":"Alpha"}"#).await.is_ok());
        drain(&mut fx.events);

        let status = tokio_test::assert_ok!(
            fx.service
                .set_metadata_settings(Some("ja"), Some(other.path().to_path_buf()))
                .await
        );
        assert_eq!(status.language, "ja");
        assert_eq!(status.file_count, 1);
        assert_eq!(fx.service.metadata().language(), "ja");
        assert_eq!(top_name(&fx.service.banners().await).as_deref(), Some("Alpha"));
        assert_eq!(drain(&mut fx.events), vec!["ledger_reloaded"]);

        assert!(matches!(
            fx.service.set_metadata_settings(Some("  "), None).await,
            Err(LedgerError::InvalidRequest(_))
        ));
        assert_eq!(fx.service.metadata().language(), "ja");
    }

    #[tokio::test]
    async fn switching_to_unknown_account_fails() {
        let fx = fixture(ScriptedRemote::default()).await;
        assert!(matches!(
            fx.service.switch_account("ghost").await,
            Err(LedgerError::AccountNotFound(_))
        ));
        assert_eq!(fx.service.active_uid().await, None);
    }

    #[tokio::test]
    async fn delete_account_selects_next_account() {
        let fx = fixture(ScriptedRemote::default()).await;
        seed_account(&fx.store, "u1", "a").await;
        seed_account(&fx.store, "u2", "b").await;
        assert!(fx.store.save_pulls("u2", &special_pulls()).await.is_ok());

        tokio_test::assert_ok!(fx.service.switch_account("u1").await);
        let next = tokio_test::assert_ok!(fx.service.delete_account().await);
        assert_eq!(next.as_deref(), Some("u2"));
        assert_eq!(fx.service.banners().await.len(), 1);

        assert!(matches!(fx.service.delete_account().await, Ok(None)));
        assert!(fx.service.banners().await.is_empty());
        assert!(matches!(
            fx.service.delete_account().await,
            Err(LedgerError::NoActiveAccount)
        ));
    }

    #[tokio::test]
    async fn background_sync_only_logs_failures() {
        let mut fx = fixture(ScriptedRemote::default()).await;
        seed_account(&fx.store, "u1", "session").await;
        assert!(fx.service.init().await.is_ok());
        assert!(fx.store.delete_account("u1").await.is_ok());
        drain(&mut fx.events);

        let handle = fx.service.spawn_background_sync(SyncMode::Incremental);
        let Ok(Ok(())) = tokio::time::timeout(Duration::from_secs(5), handle).await else {
            panic!("background sync should finish");
        };
        assert!(drain(&mut fx.events).is_empty());
    }
}
