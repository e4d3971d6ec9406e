//! Wire types for the HTTP API. All bodies are camelCase JSON.

use mintgate_core::models::{DeploymentStatus, TokenConfig};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error envelope used by every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// `GET /health` response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub uptime: u64,
}

/// `GET /api/auth/verify-balance/{address}` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub balance: String,
    pub decimals: u8,
    pub is_qualified: bool,
    pub min_required: String,
    pub last_checked: String,
}

/// `POST /api/auth/verify-signature` request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifySignatureRequest {
    pub user_address: String,
    pub signature: String,
    pub message: String,
    pub timestamp: i64,
}

/// `POST /api/auth/verify-signature` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifySignatureResponse {
    pub success: bool,
    pub user_address: String,
    pub balance: String,
    pub decimals: u8,
    pub is_qualified: bool,
}

/// `POST /api/deploy/token` request body.
///
/// `message` is optional: when absent the server rebuilds the canonical
/// deploy message from the other fields before verifying the signature.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployTokenRequest {
    pub token_config: TokenConfig,
    pub signature: String,
    pub user_address: String,
    pub timestamp: i64,
    #[serde(default)]
    pub message: Option<String>,
}

/// `POST /api/deploy/token` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployTokenResponse {
    pub success: bool,
    pub deployment_id: Uuid,
    pub token_address: String,
    pub tx_hash: String,
    pub explorer_url: String,
    /// False when the token deployed but its record could not be written.
    pub recorded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// `POST /api/deploy/simulate` request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateRequest {
    pub token_config: TokenConfig,
    pub user_address: String,
}

/// `POST /api/deploy/simulate` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateResponse {
    pub success: bool,
    pub estimated_address: Option<String>,
    pub gas_estimate: Option<String>,
}

/// One row of `GET /api/tokens/deployments/{address}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRow {
    pub id: Uuid,
    pub token_address: String,
    pub tx_hash: String,
    pub token_name: Option<String>,
    pub token_symbol: Option<String>,
    pub created_at: String,
    pub status: DeploymentStatus,
    pub explorer_url: String,
}

/// Pagination envelope for list endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total_count: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

/// `GET /api/tokens/deployments/{address}` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentListResponse {
    pub deployments: Vec<DeploymentRow>,
    pub pagination: Pagination,
}

/// `GET /api/tokens/deployment/{id}` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentDetailResponse {
    pub id: Uuid,
    pub token_address: String,
    pub deployed_by: String,
    pub tx_hash: String,
    pub token_config: TokenConfig,
    pub created_at: String,
    pub status: DeploymentStatus,
    pub explorer_url: String,
}

/// `GET /api/tokens/stats/{address}` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatsResponse {
    pub total_deployments: i64,
    pub successful_deployments: i64,
    pub failed_deployments: i64,
    pub first_deployment: Option<String>,
    pub latest_deployment: Option<String>,
    pub asset_balance: String,
    pub last_verified: Option<String>,
    pub success_rate: String,
}
