//! Deployment history and statistics request handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use uuid::Uuid;

use mintgate_core::store;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{
    DeploymentDetailResponse, DeploymentListResponse, DeploymentRow, Pagination,
    UserStatsResponse,
};
use crate::validate::parse_address;

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    page: Option<u32>,
    limit: Option<u32>,
}

/// `GET /api/tokens/deployments/{address}` — paginated deployment history,
/// newest first.
pub async fn deployments_handler(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<DeploymentListResponse>> {
    let address = parse_address(&address, "address")?;
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

    let (rows, total_count) =
        store::list_deployments_by_address(&state.pool, &address.to_string(), page, limit).await?;

    let deployments = rows
        .into_iter()
        .map(|row| DeploymentRow {
            explorer_url: state.config.explorer_token_url(&row.token_address),
            id: row.id,
            token_address: row.token_address,
            tx_hash: row.tx_hash,
            token_name: row.token_name,
            token_symbol: row.token_symbol,
            created_at: row.created_at.to_rfc3339(),
            status: row.status,
        })
        .collect();

    let total_pages = if total_count == 0 {
        0
    } else {
        (total_count + i64::from(limit) - 1) / i64::from(limit)
    };
    Ok(Json(DeploymentListResponse {
        deployments,
        pagination: Pagination {
            page,
            limit,
            total_count,
            total_pages,
            has_next: i64::from(page) < total_pages,
            has_prev: page > 1 && total_count > 0,
        },
    }))
}

/// `GET /api/tokens/deployment/{id}` — one deployment with its stored
/// config.
pub async fn deployment_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DeploymentDetailResponse>> {
    let id = id
        .parse::<Uuid>()
        .map_err(|_| AppError::Validation("id is not a valid deployment id".into()))?;

    let deployment = store::get_deployment(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("deployment {id} not found")))?;

    Ok(Json(DeploymentDetailResponse {
        explorer_url: state.config.explorer_token_url(&deployment.token_address),
        id: deployment.id,
        token_address: deployment.token_address,
        deployed_by: deployment.deployed_by,
        tx_hash: deployment.tx_hash,
        token_config: deployment.token_config,
        created_at: deployment.created_at.to_rfc3339(),
        status: deployment.status,
    }))
}

/// `GET /api/tokens/stats/{address}` — aggregate per-address statistics.
pub async fn stats_handler(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> AppResult<Json<UserStatsResponse>> {
    let address = parse_address(&address, "address")?;
    let stats = store::get_user_stats(&state.pool, &address.to_string()).await?;

    let success_rate = if stats.total_deployments == 0 {
        "N/A".to_string()
    } else {
        let rate =
            stats.successful_deployments as f64 * 100.0 / stats.total_deployments as f64;
        format!("{rate:.1}%")
    };

    Ok(Json(UserStatsResponse {
        total_deployments: stats.total_deployments,
        successful_deployments: stats.successful_deployments,
        failed_deployments: stats.failed_deployments,
        first_deployment: stats.first_deployment.map(|t| t.to_rfc3339()),
        latest_deployment: stats.latest_deployment.map(|t| t.to_rfc3339()),
        asset_balance: stats.asset_balance.unwrap_or_else(|| "0".into()),
        last_verified: stats.last_verified_at.map(|t| t.to_rfc3339()),
        success_rate,
    }))
}
