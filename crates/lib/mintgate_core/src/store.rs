//! Durable deployment records and per-address session state.
//!
//! The write side is the [`DeploymentRecorder`] capability: one call
//! records a deployment and bumps the caller's session counters as a
//! single atomic step. The read side is plain query functions over the
//! same tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::eligibility::EligibilityReport;
use crate::models::{Deployment, DeploymentSummary, NewDeployment, UserSession, UserStats};

/// Postgres `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Errors recording a deployment.
#[derive(Debug, Error)]
pub enum RecordError {
    /// A deployment with this id is already recorded. The first record
    /// stands; nothing was overwritten.
    #[error("deployment already recorded")]
    DuplicateDeployment,

    /// The record store could not be reached or the write failed.
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for RecordError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
                return RecordError::DuplicateDeployment;
            }
        }
        RecordError::Unavailable(e.to_string())
    }
}

/// Records completed deployments exactly once.
#[async_trait]
pub trait DeploymentRecorder: Send + Sync {
    /// Durably record a deployment and update the caller's session in one
    /// atomic step. The deployment id is the idempotency key.
    async fn record(
        &self,
        deployment: &NewDeployment,
        eligibility: &EligibilityReport,
    ) -> Result<(), RecordError>;
}

// =============================================================================
// Postgres recorder
// =============================================================================

/// Postgres-backed recorder. The deployment insert and the session upsert
/// commit in a single transaction; the session counter is bumped with a
/// server-side expression so concurrent deployments by one address
/// serialize on the row instead of racing a read-modify-write.
#[derive(Debug, Clone)]
pub struct PgRecorder {
    pool: PgPool,
}

impl PgRecorder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeploymentRecorder for PgRecorder {
    async fn record(
        &self,
        deployment: &NewDeployment,
        eligibility: &EligibilityReport,
    ) -> Result<(), RecordError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO deployments (id, token_address, deployed_by, tx_hash, token_config, status)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(deployment.id)
        .bind(deployment.token_address.to_string())
        .bind(deployment.deployed_by.to_string())
        .bind(deployment.tx_hash.to_string())
        .bind(sqlx::types::Json(&deployment.config))
        .bind(deployment.status.as_str())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO user_sessions (user_address, last_known_balance, last_verified_at, deployment_count)
             VALUES ($1, $2, $3, 1)
             ON CONFLICT (user_address) DO UPDATE SET
                 last_known_balance = EXCLUDED.last_known_balance,
                 last_verified_at = EXCLUDED.last_verified_at,
                 deployment_count = user_sessions.deployment_count + 1",
        )
        .bind(deployment.deployed_by.to_string())
        .bind(eligibility.balance.to_string())
        .bind(eligibility.checked_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

// =============================================================================
// In-memory recorder
// =============================================================================

/// In-memory recorder with the same idempotency and counter-atomicity
/// contract as [`PgRecorder`]; used in tests and database-free demos.
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    deployments: DashMap<Uuid, Deployment>,
    sessions: DashMap<String, UserSession>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded deployment count.
    pub fn len(&self) -> usize {
        self.deployments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deployments.is_empty()
    }

    /// Fetch a recorded deployment.
    pub fn get(&self, id: Uuid) -> Option<Deployment> {
        self.deployments.get(&id).map(|d| d.clone())
    }

    /// Session deployment counter for an address, 0 when absent.
    pub fn deployment_count(&self, address: &str) -> i64 {
        self.sessions
            .get(address)
            .map(|s| s.deployment_count)
            .unwrap_or(0)
    }
}

#[async_trait]
impl DeploymentRecorder for MemoryRecorder {
    async fn record(
        &self,
        deployment: &NewDeployment,
        eligibility: &EligibilityReport,
    ) -> Result<(), RecordError> {
        use dashmap::mapref::entry::Entry;

        match self.deployments.entry(deployment.id) {
            Entry::Occupied(_) => return Err(RecordError::DuplicateDeployment),
            Entry::Vacant(slot) => {
                slot.insert(Deployment {
                    id: deployment.id,
                    token_address: deployment.token_address.to_string(),
                    deployed_by: deployment.deployed_by.to_string(),
                    tx_hash: deployment.tx_hash.to_string(),
                    token_config: deployment.config.clone(),
                    created_at: Utc::now(),
                    status: deployment.status,
                });
            }
        }

        let address = deployment.deployed_by.to_string();
        self.sessions
            .entry(address.clone())
            .and_modify(|session| {
                session.last_known_balance = Some(eligibility.balance.to_string());
                session.last_verified_at = Some(eligibility.checked_at);
                session.deployment_count += 1;
            })
            .or_insert_with(|| UserSession {
                user_address: address,
                last_known_balance: Some(eligibility.balance.to_string()),
                last_verified_at: Some(eligibility.checked_at),
                deployment_count: 1,
            });

        Ok(())
    }
}

// =============================================================================
// Read queries
// =============================================================================

/// One page of an address's deployment history, newest first, plus the
/// total row count.
pub async fn list_deployments_by_address(
    pool: &PgPool,
    address: &str,
    page: u32,
    limit: u32,
) -> Result<(Vec<DeploymentSummary>, i64), sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM deployments WHERE deployed_by = $1")
        .bind(address)
        .fetch_one(pool)
        .await?;

    let offset = i64::from(page.saturating_sub(1)) * i64::from(limit);
    let rows = sqlx::query_as::<_, DeploymentSummary>(
        "SELECT id, token_address, tx_hash,
                token_config->>'name' AS token_name,
                token_config->>'symbol' AS token_symbol,
                created_at, status
         FROM deployments
         WHERE deployed_by = $1
         ORDER BY created_at DESC, id DESC
         LIMIT $2 OFFSET $3",
    )
    .bind(address)
    .bind(i64::from(limit))
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((rows, total))
}

/// Fetch one deployment with its stored config.
pub async fn get_deployment(pool: &PgPool, id: Uuid) -> Result<Option<Deployment>, sqlx::Error> {
    sqlx::query_as::<_, Deployment>(
        "SELECT id, token_address, deployed_by, tx_hash, token_config, created_at, status
         FROM deployments
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Aggregate per-address statistics across deployments and session state.
pub async fn get_user_stats(pool: &PgPool, address: &str) -> Result<UserStats, sqlx::Error> {
    let (total, successful, failed, first, latest): (
        i64,
        i64,
        i64,
        Option<DateTime<Utc>>,
        Option<DateTime<Utc>>,
    ) = sqlx::query_as(
        "SELECT COUNT(*),
                COUNT(*) FILTER (WHERE status = 'completed'),
                COUNT(*) FILTER (WHERE status = 'failed'),
                MIN(created_at),
                MAX(created_at)
         FROM deployments
         WHERE deployed_by = $1",
    )
    .bind(address)
    .fetch_one(pool)
    .await?;

    let session = sqlx::query_as::<_, UserSession>(
        "SELECT user_address, last_known_balance, last_verified_at, deployment_count
         FROM user_sessions
         WHERE user_address = $1",
    )
    .bind(address)
    .fetch_optional(pool)
    .await?;

    Ok(UserStats {
        total_deployments: total,
        successful_deployments: successful,
        failed_deployments: failed,
        first_deployment: first,
        latest_deployment: latest,
        asset_balance: session.as_ref().and_then(|s| s.last_known_balance.clone()),
        last_verified_at: session.and_then(|s| s.last_verified_at),
    })
}
