//! Token deployment request handlers.

use axum::Json;
use axum::extract::State;
use mintgate_core::auth::AuthRequest;
use mintgate_core::auth::message::canonical_deploy_message;
use mintgate_core::deploy::DeployOutcome;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{
    DeployTokenRequest, DeployTokenResponse, SimulateRequest, SimulateResponse,
};
use crate::validate::{parse_address, validate_token_config};

/// `POST /api/deploy/token` — authenticate, gate and deploy a token.
pub async fn deploy_token_handler(
    State(state): State<AppState>,
    Json(body): Json<DeployTokenRequest>,
) -> AppResult<Json<DeployTokenResponse>> {
    let caller = parse_address(&body.user_address, "userAddress")?;
    validate_token_config(&body.token_config)?;

    // Clients may omit the signed message; it is deterministic given the
    // config, caller and timestamp.
    let message = match body.message {
        Some(message) => message,
        None => canonical_deploy_message(&body.token_config, caller, body.timestamp)
            .map_err(|e| AppError::Internal(e.to_string()))?,
    };

    let request = AuthRequest {
        caller_address: caller,
        signature: body.signature,
        message,
        timestamp: body.timestamp,
    };
    let outcome = state.deploy.deploy(&request, &body.token_config).await?;

    let recorded = matches!(outcome, DeployOutcome::Recorded(_));
    let warning = match &outcome {
        DeployOutcome::Recorded(_) => None,
        DeployOutcome::RecordedPartially { record_error, .. } => Some(format!(
            "token deployed but the record could not be written: {record_error}"
        )),
    };
    let receipt = outcome.receipt();
    let token_address = receipt.token_address.to_string();

    Ok(Json(DeployTokenResponse {
        success: true,
        deployment_id: receipt.deployment_id,
        explorer_url: state.config.explorer_token_url(&token_address),
        token_address,
        tx_hash: receipt.tx_hash.to_string(),
        recorded,
        warning,
    }))
}

/// `POST /api/deploy/simulate` — dry-run a deployment for a qualified
/// address.
pub async fn simulate_handler(
    State(state): State<AppState>,
    Json(body): Json<SimulateRequest>,
) -> AppResult<Json<SimulateResponse>> {
    let caller = parse_address(&body.user_address, "userAddress")?;
    validate_token_config(&body.token_config)?;

    let simulated = state.deploy.simulate(caller, &body.token_config).await?;
    Ok(Json(SimulateResponse {
        success: true,
        estimated_address: simulated.estimated_address.map(|a| a.to_string()),
        gas_estimate: simulated.gas_estimate,
    }))
}
