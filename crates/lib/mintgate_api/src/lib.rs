//! # mintgate_api
//!
//! HTTP API library for Mintgate: wallet verification, gated token
//! deployment, and deployment history endpoints.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod validate;

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};

use mintgate_core::auth::authenticator::RequestAuthenticator;
use mintgate_core::clock::SystemClock;
use mintgate_core::deploy::DeployService;
use mintgate_core::eligibility::EligibilityChecker;

use crate::config::ApiConfig;
use crate::handlers::{auth, deploy, health, tokens};
use crate::middleware::rate_limit::{RateLimiter, RatePolicy};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub pool: PgPool,
    /// API configuration.
    pub config: ApiConfig,
    /// Signed-request authenticator.
    pub authenticator: Arc<RequestAuthenticator>,
    /// Asset-holding eligibility checker.
    pub eligibility: Arc<EligibilityChecker>,
    /// Deployment orchestrator.
    pub deploy: Arc<DeployService>,
    /// Process start, for the health probe.
    pub started_at: Instant,
}

/// Run embedded database migrations.
///
/// Delegates to `mintgate_core::migrate::migrate()` which owns the
/// migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    mintgate_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let global_limit = Arc::new(RateLimiter::new(
        RatePolicy::global(),
        Arc::new(SystemClock),
    ));
    let deploy_limit = Arc::new(RateLimiter::new(
        RatePolicy::deploy(),
        Arc::new(SystemClock),
    ));

    // Deployment routes carry their own, much tighter budget.
    let deploy_routes = Router::new()
        .route("/api/deploy/token", post(deploy::deploy_token_handler))
        .route("/api/deploy/simulate", post(deploy::simulate_handler))
        .layer(axum::middleware::from_fn_with_state(
            deploy_limit,
            middleware::rate_limit::enforce,
        ));

    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/auth/verify-balance/{address}",
            get(auth::verify_balance_handler),
        )
        .route(
            "/api/auth/verify-signature",
            post(auth::verify_signature_handler),
        )
        .route(
            "/api/tokens/deployments/{address}",
            get(tokens::deployments_handler),
        )
        .route(
            "/api/tokens/deployment/{id}",
            get(tokens::deployment_handler),
        )
        .route("/api/tokens/stats/{address}", get(tokens::stats_handler))
        .merge(deploy_routes)
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(cors)
        .layer(axum::middleware::from_fn_with_state(
            global_limit,
            middleware::rate_limit::enforce,
        ))
        .with_state(state)
}
