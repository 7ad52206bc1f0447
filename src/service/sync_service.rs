//! Ledger synchronizer: reconciles stored pulls with the remote source.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use futures_util::future::join_all;

use crate::domain::{
    AccountTokens, AccountUpsert, EventBus, LedgerEvent, PoolType, PullRecord, SeqId, SkipReason,
    SyncMode, SyncOutcome, SyncReport,
};
use crate::error::LedgerError;
use crate::persistence::LedgerStore;
use crate::remote::{PoolTarget, RemoteSource, Session};

/// Syncs in flight, keyed by account and mode.
type RunningSet = Mutex<HashSet<(String, SyncMode)>>;

/// Holds an account's running slot for one mode for the lifetime of one
/// sync.
///
/// Dropping the guard frees the slot, including when the sync future
/// itself is dropped mid-flight.
#[derive(Debug)]
struct RunningGuard<'a> {
    running: &'a RunningSet,
    key: (String, SyncMode),
}

impl<'a> RunningGuard<'a> {
    fn acquire(running: &'a RunningSet, uid: &str, mode: SyncMode) -> Option<Self> {
        let key = (uid.to_string(), mode);
        let inserted = running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone());
        inserted.then_some(Self { running, key })
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

/// Fetches new pull records for an account and persists them.
///
/// At most one sync per account and [`SyncMode`] runs at a time; a second
/// request for a busy pair returns [`SkipReason::AlreadyRunning`] without
/// doing any I/O. Different accounts never block each other.
#[derive(Debug)]
pub struct LedgerSynchronizer {
    store: Arc<dyn LedgerStore>,
    remote: Arc<dyn RemoteSource>,
    event_bus: EventBus,
    list_limit: u32,
    running: RunningSet,
}

impl LedgerSynchronizer {
    /// Creates a synchronizer. `list_limit` bounds the stored records read
    /// to derive cursors.
    #[must_use]
    pub fn new(
        store: Arc<dyn LedgerStore>,
        remote: Arc<dyn RemoteSource>,
        event_bus: EventBus,
        list_limit: u32,
    ) -> Self {
        Self {
            store,
            remote,
            event_bus,
            list_limit,
            running: Mutex::new(HashSet::new()),
        }
    }

    /// Returns `true` while a sync of `uid` in `mode` is in flight.
    #[must_use]
    pub fn is_running(&self, uid: &str, mode: SyncMode) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(uid.to_string(), mode))
    }

    /// Runs one sync of `account` in `mode`.
    ///
    /// Pool fetch failures are logged and reported in
    /// [`SyncReport::failed_pools`]; they never fail the sync. An account
    /// without a session token is skipped with [`SkipReason::MissingToken`].
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError::PersistenceError`] if storage fails.
    pub async fn sync(
        &self,
        account: &AccountTokens,
        mode: SyncMode,
    ) -> Result<SyncOutcome, LedgerError> {
        let Some(token) = account.session() else {
            tracing::warn!(uid = %account.uid, "sync skipped: no session token");
            return Ok(SyncOutcome::Skipped {
                reason: SkipReason::MissingToken,
            });
        };
        let Some(_guard) = RunningGuard::acquire(&self.running, &account.uid, mode) else {
            tracing::debug!(uid = %account.uid, %mode, "sync already running");
            return Ok(SyncOutcome::Skipped {
                reason: SkipReason::AlreadyRunning,
            });
        };

        let uid = account.uid.as_str();
        tracing::info!(uid, %mode, "sync started");
        let _ = self.event_bus.publish(LedgerEvent::SyncStarted {
            uid: uid.to_string(),
            mode,
            timestamp: Utc::now(),
        });

        let session = Session {
            token: token.to_string(),
            server_id: account.server_id.clone(),
            provider: account.provider(),
        };

        if mode == SyncMode::Full {
            let purged = self.store.delete_invalid_pulls(uid).await?;
            if purged > 0 {
                tracing::info!(uid, purged, "invalid pulls purged");
            }
        }

        let stored = self.store.list_pulls(uid, self.list_limit).await?;
        let cursors = match mode {
            SyncMode::Incremental => cursors_of(&stored),
            SyncMode::Full => HashMap::new(),
        };

        let (targets, mut failed_pools) = self.targets(&session, &stored).await;
        let fetches = targets.iter().map(|target| {
            let since = cursors.get(&target.cursor_key());
            let session = &session;
            async move {
                let result = self.remote.fetch_pool_records(session, target, since).await;
                (target, since, result)
            }
        });

        let mut fresh: Vec<PullRecord> = Vec::new();
        for (target, since, result) in join_all(fetches).await {
            match result {
                Ok(records) => {
                    let before = fresh.len();
                    fresh.extend(records.into_iter().filter(|r| is_new(r, since)));
                    tracing::debug!(uid, pool = %target, new = fresh.len() - before, "pool synced");
                }
                Err(e) => {
                    tracing::warn!(uid, pool = %target, error = %e, "pool fetch failed");
                    failed_pools.push(target.to_string());
                }
            }
        }

        let saved = self.store.save_pulls(uid, &fresh).await?;
        let account_updated = self.refresh_profile(account, &session).await;

        tracing::info!(uid, %mode, saved, account_updated, failed = failed_pools.len(), "sync finished");
        Ok(SyncOutcome::Completed {
            report: SyncReport {
                uid: uid.to_string(),
                mode,
                saved,
                account_updated,
                failed_pools,
            },
        })
    }

    /// Character pool types plus every weapon pool known remotely or
    /// locally.
    async fn targets(
        &self,
        session: &Session,
        stored: &[PullRecord],
    ) -> (Vec<PoolTarget>, Vec<String>) {
        let mut failed = Vec::new();
        let mut weapon_pools: BTreeSet<String> = stored
            .iter()
            .filter(|r| r.pool_type == PoolType::Weapon.tag() && !r.pool_id.is_empty())
            .map(|r| r.pool_id.clone())
            .collect();

        match self.remote.fetch_weapon_pools(session).await {
            Ok(pools) => weapon_pools.extend(pools.into_iter().map(|p| p.pool_id)),
            Err(e) => {
                tracing::warn!(error = %e, "weapon pool list unavailable, using stored pools");
                failed.push("weapon_pools".to_string());
            }
        }

        let targets = PoolType::CHARACTER
            .into_iter()
            .map(PoolTarget::Character)
            .chain(
                weapon_pools
                    .into_iter()
                    .map(|pool_id| PoolTarget::Weapon { pool_id }),
            )
            .collect();
        (targets, failed)
    }

    /// Applies the remote role profile to the stored account. Returns
    /// whether anything changed. Failures are logged only.
    async fn refresh_profile(&self, account: &AccountTokens, session: &Session) -> bool {
        let profile = match self.remote.fetch_profile(session).await {
            Ok(Some(profile)) => profile,
            Ok(None) => return false,
            Err(e) => {
                tracing::warn!(uid = %account.uid, error = %e, "profile refresh failed");
                return false;
            }
        };
        if profile.uid != account.uid {
            tracing::warn!(uid = %account.uid, remote_uid = %profile.uid, "profile belongs to another account");
            return false;
        }

        let current = match self.store.list_accounts().await {
            Ok(accounts) => accounts.into_iter().find(|a| a.uid == account.uid),
            Err(e) => {
                tracing::warn!(uid = %account.uid, error = %e, "account lookup failed");
                return false;
            }
        };
        if !profile.differs_from(account, current.as_ref()) {
            return false;
        }

        let update = AccountUpsert {
            uid: account.uid.clone(),
            role_id: profile.role_id,
            nick_name: profile.nick_name,
            channel_id: profile.channel_id,
            ..AccountUpsert::default()
        };
        match self.store.upsert_account(&update).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(uid = %account.uid, error = %e, "profile update failed");
                false
            }
        }
    }
}

/// Whether a fetched record lies past the pool's cursor.
///
/// A record without a sequence id has no position relative to the cursor
/// and is kept; storage upserts it idempotently.
fn is_new(record: &PullRecord, since: Option<&SeqId>) -> bool {
    record.seq_id.is_empty() || since.is_none_or(|cursor| record.seq_id > *cursor)
}

/// Highest stored sequence id per remote pool.
fn cursors_of(records: &[PullRecord]) -> HashMap<String, SeqId> {
    let mut cursors: HashMap<String, SeqId> = HashMap::new();
    for record in records.iter().filter(|r| !r.seq_id.is_empty()) {
        let key = record.cursor_key();
        match cursors.get(&key) {
            Some(current) if *current >= record.seq_id => {}
            _ => {
                cursors.insert(key, record.seq_id.clone());
            }
        }
    }
    cursors
}

#[cfg(test)]
#[allow(clippy::panic)]
pub(crate) mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::domain::pull_record::fixtures::pull;
    use crate::domain::{Account, RoleProfile};
    use crate::persistence::SqliteStore;
    use crate::remote::WeaponPool;

    /// Remote source answering from fixed per-pool record lists.
    ///
    /// Records are returned regardless of the cursor, the way an
    /// overshooting source would.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedRemote {
        pub(crate) records: HashMap<String, Vec<PullRecord>>,
        pub(crate) weapon_pools: Vec<String>,
        pub(crate) failing: HashSet<String>,
        pub(crate) profile: Option<RoleProfile>,
        pub(crate) hanging_tokens: Mutex<HashSet<String>>,
        pub(crate) calls: Mutex<Vec<(String, Option<SeqId>)>>,
    }

    impl ScriptedRemote {
        pub(crate) fn with_pool(mut self, key: &str, records: Vec<PullRecord>) -> Self {
            self.records.insert(key.to_string(), records);
            self
        }

        /// Makes record fetches for `token` block until released.
        pub(crate) fn set_hanging(&self, token: &str, hanging: bool) {
            let mut tokens = self
                .hanging_tokens
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if hanging {
                tokens.insert(token.to_string());
            } else {
                tokens.remove(token);
            }
        }

        fn is_hanging(&self, token: &str) -> bool {
            self.hanging_tokens
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .contains(token)
        }

        pub(crate) fn calls(&self) -> Vec<(String, Option<SeqId>)> {
            self.calls
                .lock()
                .map(|calls| calls.to_vec())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl RemoteSource for ScriptedRemote {
        async fn fetch_pool_records(
            &self,
            session: &Session,
            target: &PoolTarget,
            since: Option<&SeqId>,
        ) -> Result<Vec<PullRecord>, LedgerError> {
            let key = target.cursor_key();
            if let Ok(mut calls) = self.calls.lock() {
                calls.push((key.clone(), since.cloned()));
            }
            if self.is_hanging(&session.token) {
                std::future::pending::<()>().await;
            }
            if self.failing.contains(&key) {
                return Err(LedgerError::Remote(format!("{key} unavailable")));
            }
            Ok(self.records.get(&key).cloned().unwrap_or_default())
        }

        async fn fetch_weapon_pools(
            &self,
            _session: &Session,
        ) -> Result<Vec<WeaponPool>, LedgerError> {
            Ok(self
                .weapon_pools
                .iter()
                .map(|id| WeaponPool {
                    pool_id: id.clone(),
                    pool_name: String::new(),
                })
                .collect())
        }

        async fn fetch_profile(
            &self,
            _session: &Session,
        ) -> Result<Option<RoleProfile>, LedgerError> {
            Ok(self.profile.clone())
        }
    }

    /// Store whose writes always fail.
    #[derive(Debug)]
    struct ReadOnlyStore(SqliteStore);

    #[async_trait]
    impl LedgerStore for ReadOnlyStore {
        async fn list_pulls(&self, uid: &str, limit: u32) -> Result<Vec<PullRecord>, LedgerError> {
            self.0.list_pulls(uid, limit).await
        }
        async fn save_pulls(&self, _: &str, _: &[PullRecord]) -> Result<usize, LedgerError> {
            Err(LedgerError::PersistenceError("disk full".to_string()))
        }
        async fn delete_invalid_pulls(&self, uid: &str) -> Result<u64, LedgerError> {
            self.0.delete_invalid_pulls(uid).await
        }
        async fn delete_account(&self, uid: &str) -> Result<(), LedgerError> {
            self.0.delete_account(uid).await
        }
        async fn list_accounts(&self) -> Result<Vec<Account>, LedgerError> {
            self.0.list_accounts().await
        }
        async fn upsert_account(&self, fields: &AccountUpsert) -> Result<(), LedgerError> {
            self.0.upsert_account(fields).await
        }
        async fn get_account_tokens(
            &self,
            uid: &str,
        ) -> Result<Option<AccountTokens>, LedgerError> {
            self.0.get_account_tokens(uid).await
        }
    }

    pub(crate) async fn memory_store() -> SqliteStore {
        let Ok(store) = SqliteStore::in_memory().await else {
            panic!("in-memory store should open");
        };
        store
    }

    pub(crate) fn tokens(uid: &str) -> AccountTokens {
        AccountTokens {
            uid: uid.to_string(),
            server_id: "1".to_string(),
            session_token: Some("session".to_string()),
            ..AccountTokens::default()
        }
    }

    fn special(seq: &str) -> PullRecord {
        pull(4, "c", "special_1", seq, 1_700_000_000)
    }

    fn weapon(pool_id: &str, seq: &str) -> PullRecord {
        let mut r = pull(4, "w", pool_id, seq, 1_700_000_000);
        r.pool_type = PoolType::Weapon.tag().to_string();
        r
    }

    fn synchronizer(store: Arc<dyn LedgerStore>, remote: Arc<ScriptedRemote>) -> LedgerSynchronizer {
        LedgerSynchronizer::new(store, remote, EventBus::new(16), 10_000)
    }

    async fn report_of(sync: &LedgerSynchronizer) -> SyncReport {
        report(sync.sync(&tokens("u1"), SyncMode::Incremental).await)
    }

    fn report(outcome: Result<SyncOutcome, LedgerError>) -> SyncReport {
        let Ok(SyncOutcome::Completed { report }) = outcome else {
            panic!("expected completed sync, got {outcome:?}");
        };
        report
    }

    #[tokio::test]
    async fn incremental_discards_records_at_or_below_cursor() {
        let store = Arc::new(memory_store().await);
        let existing = vec![special("1"), special("2"), special("3")];
        assert!(store.save_pulls("u1", &existing).await.is_ok());

        let remote = Arc::new(ScriptedRemote::default().with_pool(
            PoolType::Special.tag(),
            vec![special("5"), special("4"), special("3"), special("2")],
        ));
        let sync = synchronizer(Arc::clone(&store) as Arc<dyn LedgerStore>, Arc::clone(&remote));

        let report = report(sync.sync(&tokens("u1"), SyncMode::Incremental).await);
        assert_eq!(report.saved, 2);
        assert!(report.failed_pools.is_empty());

        let special_call = remote
            .calls()
            .into_iter()
            .find(|(key, _)| key == PoolType::Special.tag());
        assert_eq!(
            special_call.and_then(|(_, since)| since),
            Some(SeqId::new("3"))
        );

        let again = report_of(&sync).await;
        assert_eq!(again.saved, 0);
    }

    #[tokio::test]
    async fn cursor_comparison_handles_growing_seq_length() {
        let store = Arc::new(memory_store().await);
        assert!(store.save_pulls("u1", &[special("99")]).await.is_ok());
        let remote = Arc::new(
            ScriptedRemote::default()
                .with_pool(PoolType::Special.tag(), vec![special("100"), special("99"), special("98")]),
        );
        let sync = synchronizer(store, remote);
        assert_eq!(report_of(&sync).await.saved, 1);
    }

    #[tokio::test]
    async fn weapon_pools_are_fetched_per_pool_with_own_cursor() {
        let store = Arc::new(memory_store().await);
        assert!(store.save_pulls("u1", &[weapon("wp_old", "7")]).await.is_ok());

        let remote = Arc::new(ScriptedRemote {
            weapon_pools: vec!["wp_new".to_string()],
            ..ScriptedRemote::default()
        }
        .with_pool("wp_old", vec![weapon("wp_old", "8"), weapon("wp_old", "7")])
        .with_pool("wp_new", vec![weapon("wp_new", "1")]));
        let sync = synchronizer(store, Arc::clone(&remote));

        assert_eq!(report_of(&sync).await.saved, 2);

        let calls = remote.calls();
        assert_eq!(calls.len(), 5);
        assert!(calls.contains(&("wp_old".to_string(), Some(SeqId::new("7")))));
        assert!(calls.contains(&("wp_new".to_string(), None)));
    }

    #[tokio::test]
    async fn full_sync_on_empty_account_fetches_everything_from_scratch() {
        let store = Arc::new(memory_store().await);
        let remote = Arc::new(
            ScriptedRemote::default()
                .with_pool(PoolType::Special.tag(), vec![special("2"), special("1")])
                .with_pool(PoolType::Standard.tag(), vec![]),
        );
        let sync = synchronizer(Arc::clone(&store) as Arc<dyn LedgerStore>, Arc::clone(&remote));

        let report = report(sync.sync(&tokens("u1"), SyncMode::Full).await);
        assert_eq!(report.saved, 2);
        assert_eq!(report.mode, SyncMode::Full);

        let calls = remote.calls();
        assert_eq!(calls.len(), PoolType::CHARACTER.len());
        assert!(calls.iter().all(|(_, since)| since.is_none()));
    }

    #[tokio::test]
    async fn full_sync_purges_invalid_rows_and_ignores_cursors() {
        let store = Arc::new(memory_store().await);
        let mut broken = special("9");
        broken.pulled_at = 0;
        assert!(store.save_pulls("u1", &[broken, special("3")]).await.is_ok());

        let remote = Arc::new(
            ScriptedRemote::default()
                .with_pool(PoolType::Special.tag(), vec![special("3"), special("2")]),
        );
        let sync = synchronizer(Arc::clone(&store) as Arc<dyn LedgerStore>, Arc::clone(&remote));

        let report = report(sync.sync(&tokens("u1"), SyncMode::Full).await);
        assert_eq!(report.saved, 2);

        let Ok(pulls) = store.list_pulls("u1", 100).await else {
            panic!("list should succeed");
        };
        let mut seqs: Vec<&str> = pulls.iter().map(|p| p.seq_id.as_str()).collect();
        seqs.sort_unstable();
        assert_eq!(seqs, vec!["2", "3"]);
    }

    #[tokio::test]
    async fn failed_pool_is_reported_and_others_saved() {
        let store = Arc::new(memory_store().await);
        let mut remote = ScriptedRemote::default()
            .with_pool(PoolType::Special.tag(), vec![special("1")]);
        remote.failing.insert(PoolType::Standard.tag().to_string());
        let sync = synchronizer(store, Arc::new(remote));

        let report = report_of(&sync).await;
        assert_eq!(report.saved, 1);
        assert_eq!(report.failed_pools, vec![PoolType::Standard.tag().to_string()]);
    }

    #[tokio::test]
    async fn records_without_seq_id_are_kept_past_cursor() {
        let store = Arc::new(memory_store().await);
        assert!(store.save_pulls("u1", &[special("5")]).await.is_ok());
        let remote = Arc::new(
            ScriptedRemote::default()
                .with_pool(PoolType::Special.tag(), vec![special("6"), special(""), special("5")]),
        );
        let sync = synchronizer(Arc::clone(&store) as Arc<dyn LedgerStore>, remote);

        assert_eq!(report_of(&sync).await.saved, 2);
        let Ok(pulls) = store.list_pulls("u1", 100).await else {
            panic!("list should succeed");
        };
        assert!(pulls.iter().any(|p| p.seq_id.is_empty()));
        assert_eq!(pulls.len(), 3);
    }

    #[tokio::test]
    async fn missing_token_is_skipped_before_any_io() {
        let store = Arc::new(memory_store().await);
        let remote = Arc::new(ScriptedRemote::default());
        let sync = synchronizer(store, Arc::clone(&remote));
        let mut events = sync.event_bus.subscribe();

        let mut account = tokens("u1");
        account.session_token = Some(String::new());
        assert!(matches!(
            sync.sync(&account, SyncMode::Incremental).await,
            Ok(SyncOutcome::Skipped {
                reason: SkipReason::MissingToken
            })
        ));
        assert!(remote.calls().is_empty());
        assert!(events.try_recv().is_err());
        assert!(!sync.is_running("u1", SyncMode::Incremental));
    }

    #[tokio::test]
    async fn second_sync_of_same_mode_is_skipped_and_flag_released_on_drop() {
        let store = Arc::new(memory_store().await);
        let remote = Arc::new(ScriptedRemote::default());
        remote.set_hanging("session", true);
        let sync = synchronizer(store, Arc::clone(&remote));
        let account = tokens("u1");

        let mut stuck = Box::pin(sync.sync(&account, SyncMode::Incremental));
        let timed_out = tokio::time::timeout(Duration::from_millis(50), &mut stuck).await;
        assert!(timed_out.is_err());
        assert!(sync.is_running("u1", SyncMode::Incremental));

        assert!(matches!(
            sync.sync(&account, SyncMode::Incremental).await,
            Ok(SyncOutcome::Skipped {
                reason: SkipReason::AlreadyRunning
            })
        ));
        assert!(!sync.is_running("u1", SyncMode::Full));

        drop(stuck);
        assert!(!sync.is_running("u1", SyncMode::Incremental));

        remote.set_hanging("session", false);
        let report = report(sync.sync(&account, SyncMode::Incremental).await);
        assert_eq!(report.saved, 0);
    }

    #[tokio::test]
    async fn different_accounts_sync_concurrently() {
        let store = Arc::new(memory_store().await);
        let remote = Arc::new(
            ScriptedRemote::default().with_pool(PoolType::Special.tag(), vec![special("1")]),
        );
        remote.set_hanging("session-a", true);
        let sync = synchronizer(store, Arc::clone(&remote));

        let mut account_a = tokens("uA");
        account_a.session_token = Some("session-a".to_string());
        let mut account_b = tokens("uB");
        account_b.session_token = Some("session-b".to_string());

        let mut stuck = Box::pin(sync.sync(&account_a, SyncMode::Incremental));
        let timed_out = tokio::time::timeout(Duration::from_millis(50), &mut stuck).await;
        assert!(timed_out.is_err());
        assert!(sync.is_running("uA", SyncMode::Incremental));
        assert!(!sync.is_running("uB", SyncMode::Incremental));

        let report = report(sync.sync(&account_b, SyncMode::Incremental).await);
        assert_eq!(report.uid, "uB");
        assert_eq!(report.saved, 1);
        assert!(sync.is_running("uA", SyncMode::Incremental));

        drop(stuck);
        assert!(!sync.is_running("uA", SyncMode::Incremental));
    }

    #[tokio::test]
    async fn save_failure_propagates_and_releases_flag() {
        let inner = memory_store().await;
        let store: Arc<dyn LedgerStore> = Arc::new(ReadOnlyStore(inner));
        let remote = Arc::new(
            ScriptedRemote::default().with_pool(PoolType::Special.tag(), vec![special("1")]),
        );
        let sync = synchronizer(store, remote);

        assert!(matches!(
            sync.sync(&tokens("u1"), SyncMode::Incremental).await,
            Err(LedgerError::PersistenceError(_))
        ));
        assert!(!sync.is_running("u1", SyncMode::Incremental));
    }

    #[tokio::test]
    async fn changed_profile_updates_account() {
        let store = Arc::new(memory_store().await);
        let seed = AccountUpsert {
            uid: "u1".to_string(),
            nick_name: Some("old".to_string()),
            session_token: Some("session".to_string()),
            ..AccountUpsert::default()
        };
        assert!(store.upsert_account(&seed).await.is_ok());

        let remote = Arc::new(ScriptedRemote {
            profile: Some(RoleProfile {
                uid: "u1".to_string(),
                role_id: Some("r1".to_string()),
                nick_name: Some("new".to_string()),
                channel_id: Some(1),
            }),
            ..ScriptedRemote::default()
        });
        let sync = synchronizer(Arc::clone(&store) as Arc<dyn LedgerStore>, remote);

        assert!(report_of(&sync).await.account_updated);
        let Ok(accounts) = store.list_accounts().await else {
            panic!("list should succeed");
        };
        assert_eq!(
            accounts.first().and_then(|a| a.nick_name.as_deref()),
            Some("new")
        );

        let mut updated = tokens("u1");
        updated.channel_id = Some(1);
        let again = report(sync.sync(&updated, SyncMode::Incremental).await);
        assert!(!again.account_updated);
    }

    #[test]
    fn cursors_track_highest_seq_per_pool() {
        let records = vec![special("9"), special("10"), weapon("wp", "3"), special("")];
        let cursors = cursors_of(&records);
        assert_eq!(cursors.get(PoolType::Special.tag()), Some(&SeqId::new("10")));
        assert_eq!(cursors.get("wp"), Some(&SeqId::new("3")));
        assert_eq!(cursors.len(), 2);
    }

    #[test]
    fn empty_seq_id_is_never_at_or_below_cursor() {
        let cursor = SeqId::new("5");
        assert!(is_new(&special(""), Some(&cursor)));
        assert!(is_new(&special("6"), Some(&cursor)));
        assert!(!is_new(&special("5"), Some(&cursor)));
        assert!(is_new(&special("1"), None));
    }
}
