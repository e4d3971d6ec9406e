//! Mintgate API server binary.
//!
//! Wires the production collaborators (Postgres nonce store and recorder,
//! JSON-RPC ledger, deploy relay) into the HTTP router and serves it.

use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use mintgate_core::auth::authenticator::RequestAuthenticator;
use mintgate_core::auth::nonce::PgNonceStore;
use mintgate_core::auth::signature::Eip191Verifier;
use mintgate_core::clock::SystemClock;
use mintgate_core::config::{AuthConfig, ChainConfig, EligibilityConfig, RelayConfig};
use mintgate_core::deploy::DeployService;
use mintgate_core::eligibility::EligibilityChecker;
use mintgate_core::evm::{EvmTokenLedger, RelayTokenDeployer};
use mintgate_core::store::PgRecorder;

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "mintgate_server", about = "Mintgate API server")]
struct Args {
    /// Address to bind the HTTP listener.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3003")]
    bind_addr: String,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/mintgate"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// JSON-RPC endpoint for reading the gating asset.
    #[arg(long, env = "RPC_URL", default_value = "https://mainnet.base.org")]
    rpc_url: String,

    /// ERC-20 contract address of the gating asset.
    #[arg(long, env = "ASSET_TOKEN_ADDRESS")]
    asset_token: String,

    /// Base URL of the deploy relay holding the operator key.
    #[arg(long, env = "DEPLOY_RELAY_URL")]
    relay_url: String,

    /// Seconds a signed request stays acceptable after its timestamp.
    #[arg(long, env = "FRESHNESS_WINDOW_SECS", default_value_t = 300)]
    freshness_window_secs: i64,

    /// Seconds of clock skew tolerated for future timestamps.
    #[arg(long, env = "FUTURE_TOLERANCE_SECS", default_value_t = 60)]
    future_tolerance_secs: i64,

    /// Seconds a consumed nonce is retained before eviction.
    #[arg(long, env = "NONCE_MAX_AGE_SECS", default_value_t = 600)]
    nonce_max_age_secs: i64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,mintgate_api=debug,mintgate_core=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    info!(bind_addr = %args.bind_addr, "starting mintgate_server");

    // Validate all configuration before touching the network.
    let auth_config = AuthConfig::new(
        args.freshness_window_secs,
        args.future_tolerance_secs,
        args.nonce_max_age_secs,
    )?;
    let chain_config = ChainConfig::new(&args.rpc_url, &args.asset_token)?;
    let relay_config = RelayConfig::new(&args.relay_url)?;

    info!(
        rpc_url = %chain_config.rpc_url,
        asset_token = %chain_config.asset_token,
        relay_url = %relay_config.base_url,
        "chain configuration loaded"
    );

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&args.database_url)
        .await?;

    info!("running database migrations");
    mintgate_api::migrate(&pool).await?;

    let clock = Arc::new(SystemClock);
    let authenticator = Arc::new(RequestAuthenticator::new(
        auth_config,
        Arc::new(PgNonceStore::new(pool.clone())),
        Arc::new(Eip191Verifier),
        Arc::clone(&clock) as _,
    ));
    let eligibility = Arc::new(EligibilityChecker::new(
        EligibilityConfig::default(),
        Arc::new(EvmTokenLedger::new(chain_config)?),
        clock as _,
    ));
    let deploy = Arc::new(DeployService::new(
        Arc::clone(&authenticator),
        Arc::clone(&eligibility),
        Arc::new(RelayTokenDeployer::new(relay_config)?),
        Arc::new(PgRecorder::new(pool.clone())),
    ));

    let state = mintgate_api::AppState {
        pool,
        config: mintgate_api::config::ApiConfig::from_env(),
        authenticator,
        eligibility,
        deploy,
        started_at: Instant::now(),
    };

    let app = mintgate_api::router(state);

    let listener = tokio::net::TcpListener::bind(&args.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    // Peer addresses feed the rate limiter when no proxy header is set.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
