//! Wallet verification request handlers.

use axum::Json;
use axum::extract::{Path, State};
use mintgate_core::auth::AuthRequest;
use tracing::warn;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{BalanceResponse, VerifySignatureRequest, VerifySignatureResponse};
use crate::validate::parse_address;

/// `GET /api/auth/verify-balance/{address}` — eligibility check without a
/// signature.
pub async fn verify_balance_handler(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> AppResult<Json<BalanceResponse>> {
    let address = parse_address(&address, "address")?;
    let report = state.eligibility.check(address).await?;
    Ok(Json(BalanceResponse {
        balance: report.balance.to_string(),
        decimals: report.decimals,
        is_qualified: report.is_qualified,
        min_required: report.min_required.to_string(),
        last_checked: report.checked_at.to_rfc3339(),
    }))
}

/// `POST /api/auth/verify-signature` — full request authentication plus
/// the eligibility gate.
pub async fn verify_signature_handler(
    State(state): State<AppState>,
    Json(body): Json<VerifySignatureRequest>,
) -> AppResult<Json<VerifySignatureResponse>> {
    let caller = parse_address(&body.user_address, "userAddress")?;

    let request = AuthRequest {
        caller_address: caller,
        signature: body.signature,
        message: body.message,
        timestamp: body.timestamp,
    };
    state.authenticator.authenticate(&request).await?;

    let report = state.eligibility.check(caller).await?;
    if !report.is_qualified {
        warn!(
            caller = %caller,
            balance = %report.balance,
            min_required = %report.min_required,
            "signature verified but balance below threshold"
        );
        return Err(AppError::Unauthorized {
            kind: "insufficient_balance",
            message: format!(
                "insufficient balance: {} held, {} required",
                report.balance, report.min_required
            ),
        });
    }

    Ok(Json(VerifySignatureResponse {
        success: true,
        user_address: caller.to_string(),
        balance: report.balance.to_string(),
        decimals: report.decimals,
        is_qualified: report.is_qualified,
    }))
}
