//! Domain models for token deployments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use thiserror::Error;
use uuid::Uuid;

use alloy_primitives::{Address, B256};

// =============================================================================
// Token configuration
// =============================================================================

/// Configuration for a token to be deployed.
///
/// Field declaration order fixes the JSON key order, which is what keeps
/// the canonical signed message deterministic. New fields go at the end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub pool: PoolConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault: Option<VaultConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub airdrop: Option<AirdropConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fees: Option<FeesConfig>,
}

/// Liquidity pool settings for the new token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolConfig {
    /// Token the pool pairs against.
    pub paired_token: String,
    /// Liquidity position layout.
    pub positions: PoolPositions,
}

/// Liquidity position layouts offered at deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolPositions {
    Standard,
    Project,
}

/// Supply share locked in a vesting vault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultConfig {
    /// Percentage of supply to lock (0-30).
    pub percentage: u8,
    /// Lockup duration in seconds.
    pub lockup_duration: u64,
    /// Vesting duration in seconds after the lockup ends.
    pub vesting_duration: u64,
}

/// Merkle-gated airdrop allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirdropConfig {
    /// Merkle root of the claim set (0x + 64 hex chars).
    pub merkle_root: String,
    /// Token amount allocated to the airdrop.
    pub amount: u64,
    /// Lockup duration in seconds.
    pub lockup_duration: u64,
    /// Vesting duration in seconds.
    pub vesting_duration: u64,
}

/// Fee schedule: a named preset or a custom structure the deployer
/// understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeesConfig {
    Preset(FeePreset),
    Custom(serde_json::Value),
}

/// Built-in fee schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeePreset {
    DynamicBasic,
    StaticBasic,
}

// =============================================================================
// Deployment records
// =============================================================================

/// Lifecycle status of a recorded deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Pending,
    Completed,
    Failed,
}

/// Raised when a status column holds a value outside the known set.
#[derive(Debug, Error)]
#[error("unknown deployment status '{0}'")]
pub struct UnknownStatus(String);

impl DeploymentStatus {
    /// Database/text representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl TryFrom<String> for DeploymentStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A deployment about to be recorded: the facts established by a
/// successful chain submission.
#[derive(Debug, Clone)]
pub struct NewDeployment {
    pub id: Uuid,
    pub token_address: Address,
    pub deployed_by: Address,
    pub tx_hash: B256,
    pub config: TokenConfig,
    pub status: DeploymentStatus,
}

/// A recorded token deployment.
#[derive(Debug, Clone, FromRow)]
pub struct Deployment {
    pub id: Uuid,
    pub token_address: String,
    pub deployed_by: String,
    pub tx_hash: String,
    #[sqlx(json)]
    pub token_config: TokenConfig,
    pub created_at: DateTime<Utc>,
    #[sqlx(try_from = "String")]
    pub status: DeploymentStatus,
}

/// History projection: one deployment without the full stored config.
#[derive(Debug, Clone, FromRow)]
pub struct DeploymentSummary {
    pub id: Uuid,
    pub token_address: String,
    pub tx_hash: String,
    pub token_name: Option<String>,
    pub token_symbol: Option<String>,
    pub created_at: DateTime<Utc>,
    #[sqlx(try_from = "String")]
    pub status: DeploymentStatus,
}

/// Cached per-address verification state.
#[derive(Debug, Clone, FromRow)]
pub struct UserSession {
    pub user_address: String,
    pub last_known_balance: Option<String>,
    pub last_verified_at: Option<DateTime<Utc>>,
    pub deployment_count: i64,
}

/// Aggregate per-address deployment statistics.
#[derive(Debug, Clone, Default)]
pub struct UserStats {
    pub total_deployments: i64,
    pub successful_deployments: i64,
    pub failed_deployments: i64,
    pub first_deployment: Option<DateTime<Utc>>,
    pub latest_deployment: Option<DateTime<Utc>>,
    pub asset_balance: Option<String>,
    pub last_verified_at: Option<DateTime<Utc>>,
}
