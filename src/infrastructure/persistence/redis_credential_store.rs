//! Redis implementation of the credential store.
//!
//! Layout:
//!
//! - `rm:sel:<selector>` - hash with `user`, `hash`, `exp` (unix millis),
//!   expiring at `exp` via `PEXPIREAT`
//! - `rm:user:<user>` - set of the user's selectors
//!
//! Every operation touching more than one key runs as a single Lua script, so
//! Redis executes it atomically. The scripts derive some key names from their
//! arguments, so only single-node (non-cluster) Redis is supported.
//!
//! Records expire natively, but their entries in the user sets do not.
//! [`CredentialStore::purge_expired`] sweeps the user sets and drops
//! selectors whose record is gone.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use redis::{AsyncCommands, Client, Script, aio::ConnectionManager};
use tracing::{debug, info, warn};

use crate::domain::entities::StoredCredential;
use crate::domain::repositories::{CredentialStore, MAX_SELECTOR_ATTEMPTS};
use crate::error::RememberMeError;
use crate::utils::selector::generate_selector;

const INSERT_SCRIPT: &str = r"
if redis.call('EXISTS', KEYS[1]) == 1 then return 0 end
redis.call('HSET', KEYS[1], 'user', ARGV[1], 'hash', ARGV[2], 'exp', ARGV[3])
redis.call('PEXPIREAT', KEYS[1], ARGV[3])
redis.call('SADD', KEYS[2], ARGV[4])
return 1
";

// KEYS: record, new user set. ARGV: user, hash, exp, selector, user-set prefix, expected hash ('' = any)
const REPLACE_SCRIPT: &str = r"
if redis.call('EXISTS', KEYS[1]) == 0 then return -1 end
if ARGV[6] ~= '' and redis.call('HGET', KEYS[1], 'hash') ~= ARGV[6] then return 0 end
local previous = redis.call('HGET', KEYS[1], 'user')
if previous and previous ~= ARGV[1] then
  redis.call('SREM', ARGV[5] .. previous, ARGV[4])
end
redis.call('HSET', KEYS[1], 'user', ARGV[1], 'hash', ARGV[2], 'exp', ARGV[3])
redis.call('PEXPIREAT', KEYS[1], ARGV[3])
redis.call('SADD', KEYS[2], ARGV[4])
return 1
";

const DELETE_SELECTOR_SCRIPT: &str = r"
local user = redis.call('HGET', KEYS[1], 'user')
redis.call('DEL', KEYS[1])
if user then redis.call('SREM', ARGV[2] .. user, ARGV[1]) end
return 1
";

const DELETE_USER_SCRIPT: &str = r"
local selectors = redis.call('SMEMBERS', KEYS[1])
for _, selector in ipairs(selectors) do
  redis.call('DEL', ARGV[1] .. selector)
end
redis.call('DEL', KEYS[1])
return #selectors
";

// KEYS: user set. ARGV: selector-key prefix
const PRUNE_USER_SCRIPT: &str = r"
local pruned = 0
for _, selector in ipairs(redis.call('SMEMBERS', KEYS[1])) do
  if redis.call('EXISTS', ARGV[1] .. selector) == 0 then
    redis.call('SREM', KEYS[1], selector)
    pruned = pruned + 1
  end
end
return pruned
";

/// Keys fetched per `SCAN` round trip during a purge.
const SCAN_BATCH: usize = 200;

/// Redis store for remember-me credentials.
///
/// Records expire natively at their credential expiration. Expirations are
/// kept with millisecond precision.
pub struct RedisCredentialStore {
    conn: ConnectionManager,
    key_prefix: String,
    insert_script: Script,
    replace_script: Script,
    delete_selector_script: Script,
    delete_user_script: Script,
    prune_user_script: Script,
}

impl RedisCredentialStore {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`RememberMeError::StoreUnavailable`] if the URL is invalid,
    /// the connection cannot be established, or the PING fails.
    pub async fn connect(redis_url: &str) -> Result<Self, RememberMeError> {
        info!("Connecting to Redis credential store");

        let client = Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        let mut test_conn = conn.clone();
        test_conn.ping::<()>().await?;

        info!("Connected to Redis credential store");

        Ok(Self::with_connection(conn, "rm:"))
    }

    /// Builds a store on an existing connection with a custom key namespace.
    pub fn with_connection(conn: ConnectionManager, key_prefix: impl Into<String>) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
            insert_script: Script::new(INSERT_SCRIPT),
            replace_script: Script::new(REPLACE_SCRIPT),
            delete_selector_script: Script::new(DELETE_SELECTOR_SCRIPT),
            delete_user_script: Script::new(DELETE_USER_SCRIPT),
            prune_user_script: Script::new(PRUNE_USER_SCRIPT),
        }
    }

    fn selector_prefix(&self) -> String {
        format!("{}sel:", self.key_prefix)
    }

    fn user_prefix(&self) -> String {
        format!("{}user:", self.key_prefix)
    }

    fn selector_key(&self, selector: &str) -> String {
        format!("{}{}", self.selector_prefix(), selector)
    }

    fn user_key(&self, user: &str) -> String {
        format!("{}{}", self.user_prefix(), user)
    }

    /// Runs the replace script; returns the raw script status
    /// (`1` replaced, `0` hash mismatch, `-1` missing).
    async fn replace(
        &self,
        selector: &str,
        expected_hash: &str,
        user: &str,
        validator_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<i64, RememberMeError> {
        let mut conn = self.conn.clone();

        let status: i64 = self
            .replace_script
            .key(self.selector_key(selector))
            .key(self.user_key(user))
            .arg(user)
            .arg(validator_hash)
            .arg(expires_at.timestamp_millis())
            .arg(selector)
            .arg(self.user_prefix())
            .arg(expected_hash)
            .invoke_async(&mut conn)
            .await?;

        Ok(status)
    }
}

fn parse_record(fields: HashMap<String, String>) -> Result<StoredCredential, RememberMeError> {
    let field = |name: &str| {
        fields.get(name).cloned().ok_or_else(|| {
            RememberMeError::StoreUnavailable(format!("credential record missing field '{name}'"))
        })
    };

    let millis: i64 = field("exp")?
        .parse()
        .map_err(|_| RememberMeError::StoreUnavailable("invalid expiration".to_string()))?;
    let expires_at = Utc
        .timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| RememberMeError::StoreUnavailable("expiration out of range".to_string()))?;

    Ok(StoredCredential::new(field("user")?, field("hash")?, expires_at))
}

#[async_trait]
impl CredentialStore for RedisCredentialStore {
    async fn get(&self, selector: &str) -> Result<StoredCredential, RememberMeError> {
        let mut conn = self.conn.clone();

        let fields: HashMap<String, String> = conn.hgetall(self.selector_key(selector)).await?;
        if fields.is_empty() {
            debug!("Credential lookup MISS");
            return Err(RememberMeError::NotFound);
        }

        parse_record(fields)
    }

    async fn insert(
        &self,
        user: &str,
        validator_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String, RememberMeError> {
        let mut conn = self.conn.clone();

        for _ in 0..MAX_SELECTOR_ATTEMPTS {
            let selector = generate_selector()?;

            let inserted: i64 = self
                .insert_script
                .key(self.selector_key(&selector))
                .key(self.user_key(user))
                .arg(user)
                .arg(validator_hash)
                .arg(expires_at.timestamp_millis())
                .arg(&selector)
                .invoke_async(&mut conn)
                .await?;

            if inserted == 1 {
                return Ok(selector);
            }

            warn!("Selector collision on insert, retrying");
        }

        Err(RememberMeError::StoreUnavailable(
            "could not allocate a unique selector".to_string(),
        ))
    }

    async fn update(
        &self,
        selector: &str,
        user: &str,
        validator_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RememberMeError> {
        match self
            .replace(selector, "", user, validator_hash, expires_at)
            .await?
        {
            -1 => Err(RememberMeError::NotFound),
            _ => Ok(()),
        }
    }

    async fn rotate(
        &self,
        selector: &str,
        expected_hash: &str,
        user: &str,
        validator_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, RememberMeError> {
        // An empty expected hash would match anything in the script.
        if expected_hash.is_empty() {
            return Ok(false);
        }

        match self
            .replace(selector, expected_hash, user, validator_hash, expires_at)
            .await?
        {
            -1 => Err(RememberMeError::NotFound),
            1 => Ok(true),
            _ => Ok(false),
        }
    }

    async fn delete_selector(&self, selector: &str) -> Result<(), RememberMeError> {
        let mut conn = self.conn.clone();

        let _: i64 = self
            .delete_selector_script
            .key(self.selector_key(selector))
            .arg(selector)
            .arg(self.user_prefix())
            .invoke_async(&mut conn)
            .await?;

        Ok(())
    }

    async fn delete_user(&self, user: &str) -> Result<(), RememberMeError> {
        let mut conn = self.conn.clone();

        let removed: i64 = self
            .delete_user_script
            .key(self.user_key(user))
            .arg(self.selector_prefix())
            .invoke_async(&mut conn)
            .await?;

        debug!(removed, "Deleted user credentials");
        Ok(())
    }

    /// Drops user-set entries whose record already expired; returns how many.
    ///
    /// Records themselves are removed by Redis at their expiration, so `now`
    /// is not consulted.
    async fn purge_expired(&self, _now: DateTime<Utc>) -> Result<u64, RememberMeError> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", self.user_prefix());

        let mut user_keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;
            user_keys.extend(keys);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        let mut pruned: u64 = 0;
        for key in user_keys {
            let removed: u64 = self
                .prune_user_script
                .key(&key)
                .arg(self.selector_prefix())
                .invoke_async(&mut conn)
                .await?;
            pruned += removed;
        }

        if pruned > 0 {
            info!(pruned, "Pruned expired selectors from user index");
        }
        Ok(pruned)
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.conn.clone();
        conn.ping::<()>().await.is_ok()
    }
}
