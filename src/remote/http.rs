//! `reqwest` implementation of [`RemoteSource`].
//!
//! Record endpoints are paginated newest first. Each page is requested
//! with the `seq_id` of the last record seen, until the source reports no
//! more pages, the incremental cursor is reached, or the per-pool cap is
//! hit. Every response carries a `code` (or `status`) envelope that must be
//! zero.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{PoolTarget, RemoteSource, Session, WeaponPool};
use crate::config::LedgerConfig;
use crate::domain::{PoolType, Provider, PullRecord, RoleProfile, SeqId};
use crate::error::LedgerError;

/// HTTP client for the provider's record and role endpoints.
#[derive(Debug, Clone)]
pub struct HttpRemoteSource {
    client: reqwest::Client,
    language: String,
    page_delay: Duration,
    max_records: usize,
    base_url: Option<String>,
}

impl HttpRemoteSource {
    /// Builds a client with the given request timeout and default paging.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError::Remote`] if the TLS backend cannot be
    /// initialized.
    pub fn new(timeout: Duration) -> Result<Self, LedgerError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            language: "zh-cn".to_string(),
            page_delay: Duration::from_millis(100),
            max_records: 10_000,
            base_url: None,
        })
    }

    /// Builds a client from the remote settings of `config`.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError::Remote`] if the client cannot be built.
    pub fn from_config(config: &LedgerConfig) -> Result<Self, LedgerError> {
        Ok(Self::new(config.remote_timeout)?
            .with_language(&config.language)
            .with_page_delay(config.remote_page_delay)
            .with_max_records(config.remote_max_records_per_pool))
    }

    /// Sets the `lang` query parameter.
    #[must_use]
    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    /// Sets the pause between two pages of the same pool.
    #[must_use]
    pub const fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// Sets the per-pool record cap.
    #[must_use]
    pub const fn with_max_records(mut self, max_records: usize) -> Self {
        self.max_records = max_records;
        self
    }

    /// Sends every request to `base_url` instead of the provider hosts.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.trim_end_matches('/').to_string());
        self
    }

    fn record_url(&self, provider: Provider, path: &str) -> String {
        match &self.base_url {
            Some(base) => format!("{base}{path}"),
            None => format!("https://ef-webview.{}.com{path}", provider.host()),
        }
    }

    /// Role queries go to the same host for every distribution.
    fn role_url(&self) -> String {
        const PATH: &str = "/game/role/v1/query_role_list";
        match &self.base_url {
            Some(base) => format!("{base}{PATH}"),
            None => format!("https://u8.hypergryph.com{PATH}"),
        }
    }

    async fn get_json(&self, url: &str, params: &[(&str, &str)]) -> Result<Value, LedgerError> {
        let json = self
            .client
            .get(url)
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        Ok(json)
    }
}

#[async_trait]
impl RemoteSource for HttpRemoteSource {
    async fn fetch_pool_records(
        &self,
        session: &Session,
        target: &PoolTarget,
        since: Option<&SeqId>,
    ) -> Result<Vec<PullRecord>, LedgerError> {
        let (url, pool_param) = match target {
            PoolTarget::Character(pool_type) => (
                self.record_url(session.provider, "/api/record/char"),
                ("pool_type", pool_type.tag()),
            ),
            PoolTarget::Weapon { pool_id } => (
                self.record_url(session.provider, "/api/record/weapon"),
                ("pool_id", pool_id.as_str()),
            ),
        };

        let mut records: Vec<PullRecord> = Vec::new();
        let mut next_seq: Option<SeqId> = None;

        'pages: loop {
            let mut params = vec![
                ("token", session.token.as_str()),
                ("server_id", session.server_id.as_str()),
                ("lang", self.language.as_str()),
                pool_param,
            ];
            if let Some(seq) = &next_seq {
                params.push(("seq_id", seq.as_str()));
            }

            tracing::debug!(pool = %target, seq_id = ?next_seq, "fetching page");
            let json = self.get_json(&url, &params).await?;
            check_envelope(&json)?;

            let Some(list) = json.pointer("/data/list").and_then(Value::as_array) else {
                break;
            };
            if list.is_empty() {
                break;
            }

            for item in list {
                let record = parse_record(item, target);
                if !record.seq_id.is_empty()
                    && let Some(stop) = since
                    && record.seq_id <= *stop
                {
                    tracing::debug!(pool = %target, %stop, "reached cursor");
                    break 'pages;
                }
                records.push(record);
            }

            let last = records
                .iter()
                .rev()
                .find(|r| !r.seq_id.is_empty())
                .map(|r| r.seq_id.clone());
            if last.is_none() || last == next_seq {
                break;
            }
            next_seq = last;

            if records.len() >= self.max_records {
                tracing::warn!(pool = %target, cap = self.max_records, "record cap reached");
                break;
            }
            if json.pointer("/data/hasMore").and_then(Value::as_bool) == Some(false) {
                break;
            }

            tokio::time::sleep(self.page_delay).await;
        }

        tracing::debug!(pool = %target, fetched = records.len(), "pool fetched");
        Ok(records)
    }

    async fn fetch_weapon_pools(&self, session: &Session) -> Result<Vec<WeaponPool>, LedgerError> {
        let url = self.record_url(session.provider, "/api/record/weapon/pool");
        let params = [
            ("token", session.token.as_str()),
            ("server_id", session.server_id.as_str()),
            ("lang", self.language.as_str()),
        ];
        let json = self.get_json(&url, &params).await?;
        check_envelope(&json)?;

        let pools: Vec<WeaponPool> = json
            .get("data")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|item| WeaponPool {
                        pool_id: text(item, "poolId"),
                        pool_name: text(item, "poolName"),
                    })
                    .filter(|p| !p.pool_id.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        tracing::debug!(count = pools.len(), "weapon pools fetched");
        Ok(pools)
    }

    async fn fetch_profile(&self, session: &Session) -> Result<Option<RoleProfile>, LedgerError> {
        let body = json!({
            "token": session.token,
            "serverId": session.server_id,
        });
        let json = self
            .client
            .post(self.role_url())
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        check_envelope(&json)?;
        Ok(parse_profile(&json))
    }
}

/// Reads an integer that may be encoded as a JSON number or a numeric
/// string.
fn json_i64(value: &Value, key: &str) -> Option<i64> {
    let v = value.get(key)?;
    if let Some(n) = v.as_i64() {
        return Some(n);
    }
    if let Some(n) = v.as_u64() {
        return i64::try_from(n).ok();
    }
    v.as_str().and_then(|s| s.trim().parse::<i64>().ok())
}

fn text(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn flag(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Fails unless the response's `code` (or `status`) is zero.
fn check_envelope(json: &Value) -> Result<(), LedgerError> {
    let code = json_i64(json, "code")
        .or_else(|| json_i64(json, "status"))
        .unwrap_or(-1);
    if code == 0 {
        return Ok(());
    }
    let msg = json
        .get("msg")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map_or_else(|| format!("request rejected with code {code}"), str::to_string);
    Err(LedgerError::Remote(msg))
}

fn parse_record(item: &Value, target: &PoolTarget) -> PullRecord {
    let (name_key, id_key, pool_type, default_pool) = match target {
        PoolTarget::Character(pool_type) => ("charName", "charId", *pool_type, ""),
        PoolTarget::Weapon { pool_id } => {
            ("weaponName", "weaponId", PoolType::Weapon, pool_id.as_str())
        }
    };

    let item_id = text(item, id_key);
    let name = item
        .get(name_key)
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
        .map_or_else(|| item_id.clone(), str::to_string);
    let pool_id = item
        .get("poolId")
        .and_then(Value::as_str)
        .unwrap_or(default_pool)
        .to_string();

    PullRecord {
        name,
        item_id,
        rarity: json_i64(item, "rarity")
            .and_then(|r| u8::try_from(r).ok())
            .unwrap_or(0),
        pool_id,
        pool_name: text(item, "poolName"),
        seq_id: SeqId::new(text(item, "seqId")),
        pulled_at: json_i64(item, "gachaTs").unwrap_or(0),
        pool_type: pool_type.tag().to_string(),
        is_free: flag(item, "isFree"),
        is_new: flag(item, "isNew"),
    }
}

fn parse_profile(json: &Value) -> Option<RoleProfile> {
    let data = json.get("data")?;
    let uid = data
        .get("uid")
        .and_then(|v| {
            v.as_str()
                .map(str::to_string)
                .or_else(|| v.as_i64().map(|n| n.to_string()))
        })
        .filter(|uid| !uid.is_empty())?;

    let role = data
        .get("roles")
        .and_then(Value::as_array)
        .and_then(|roles| {
            roles.iter().find(|r| {
                r.get("roleId")
                    .and_then(Value::as_str)
                    .is_some_and(|id| !id.is_empty())
            })
        });

    Some(RoleProfile {
        uid,
        role_id: role
            .and_then(|r| r.get("roleId"))
            .and_then(Value::as_str)
            .map(str::to_string),
        nick_name: role
            .and_then(|r| r.get("nickName").or_else(|| r.get("nick_name")))
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .map(str::to_string),
        channel_id: json_i64(data, "channelId"),
    })
}
