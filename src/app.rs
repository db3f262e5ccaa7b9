/*
 * Responsibility
 * - tracing 初期化 → Config 読み込み → 依存生成 → Router 組み立て
 * - axum::serve() で起動 (remote addr をログに出すため connect info 付き)
 */
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::middleware::http::{self, HttpLimits};
use crate::repos::{PgOrganizationsStore, PgUsersStore};
use crate::services::auth::{Authenticator, JwtCookieAuthenticator};
use crate::{api, state::AppState};

fn init_tracing() {
    // RUST_LOG=info,principal_gate=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    tracing::info!(
        env = ?config.app_env,
        addr = %config.addr,
        use_auth = config.use_auth(),
        "starting gate"
    );
    if !config.use_auth() {
        tracing::warn!("TOKEN_SECRET not set; authentication and authorization are disabled");
    }

    let state = build_state(&config).await?;
    let app = build_router(state, config.http);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let db = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to DATABASE_URL")?;

    let authenticator = config.token_secret.as_ref().map(|secret| {
        Arc::new(JwtCookieAuthenticator::new(
            secret.as_bytes(),
            config.session.clone(),
        )) as Arc<dyn Authenticator>
    });

    Ok(AppState::new(
        authenticator,
        Arc::new(PgUsersStore::new(db.clone())),
        Arc::new(PgOrganizationsStore::new(db)),
    )
    .with_call_timeout(config.call_timeout))
}

pub fn build_router(state: AppState, limits: HttpLimits) -> Router {
    let state = state.bounded_by(limits.timeout);
    let router = Router::new()
        .nest("/api/v1", api::v1::routes(&state))
        .with_state(state);

    http::apply(router, limits)
}
