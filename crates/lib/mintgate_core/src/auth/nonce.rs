//! Single-use nonce registry backing replay protection.
//!
//! A nonce key binds a request's timestamp, caller, and message prefix.
//! Consuming a key is an atomic check-and-insert: for any key, exactly
//! one concurrent caller wins. Entries age out by their *embedded*
//! request timestamp, not their insertion time, so a replayed-late
//! request cannot outlive its window.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use sqlx::PgPool;
use thiserror::Error;

use alloy_primitives::Address;

/// Number of leading message characters embedded in a nonce key.
const MESSAGE_PREFIX_CHARS: usize = 32;

/// Errors from nonce registry backends.
#[derive(Debug, Error)]
pub enum NonceStoreError {
    #[error("nonce store database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Derive the registry key for a request.
///
/// The address renders in EIP-55 checksum form, so the same wallet always
/// produces the same key regardless of how the caller cased it.
pub fn nonce_key(timestamp: i64, caller: Address, message: &str) -> String {
    let prefix: String = message.chars().take(MESSAGE_PREFIX_CHARS).collect();
    format!("{timestamp}-{caller}-{prefix}")
}

/// Registry of consumed request nonces.
#[async_trait]
pub trait NonceStore: Send + Sync {
    /// Consume `key`, remembering the request timestamp it embeds.
    /// Returns `false` when the key was already consumed.
    async fn accept(&self, key: &str, stamped_at: i64) -> Result<bool, NonceStoreError>;

    /// Drop entries whose embedded timestamp is strictly before `cutoff`.
    /// Returns the number of entries removed.
    async fn evict_older_than(&self, cutoff: i64) -> Result<u64, NonceStoreError>;
}

/// Process-local nonce registry.
///
/// Entries vanish on restart, which reopens the replay window for at most
/// the freshness window. Wire [`PgNonceStore`] where that window matters.
#[derive(Debug, Default)]
pub struct MemoryNonceStore {
    entries: DashMap<String, i64>,
}

impl MemoryNonceStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl NonceStore for MemoryNonceStore {
    async fn accept(&self, key: &str, stamped_at: i64) -> Result<bool, NonceStoreError> {
        match self.entries.entry(key.to_owned()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(stamped_at);
                Ok(true)
            }
        }
    }

    async fn evict_older_than(&self, cutoff: i64) -> Result<u64, NonceStoreError> {
        let before = self.entries.len();
        self.entries.retain(|_, stamped_at| *stamped_at >= cutoff);
        Ok(before.saturating_sub(self.entries.len()) as u64)
    }
}

/// Durable nonce registry backed by Postgres.
///
/// Survives restarts; the insert races on the primary key so concurrent
/// consumers of the same nonce serialize in the database.
#[derive(Debug, Clone)]
pub struct PgNonceStore {
    pool: PgPool,
}

impl PgNonceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NonceStore for PgNonceStore {
    async fn accept(&self, key: &str, stamped_at: i64) -> Result<bool, NonceStoreError> {
        let result = sqlx::query(
            "INSERT INTO auth_nonces (nonce_key, stamped_at) VALUES ($1, $2)
             ON CONFLICT (nonce_key) DO NOTHING",
        )
        .bind(key)
        .bind(stamped_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn evict_older_than(&self, cutoff: i64) -> Result<u64, NonceStoreError> {
        let result = sqlx::query("DELETE FROM auth_nonces WHERE stamped_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
