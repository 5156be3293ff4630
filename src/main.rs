//! Battle orchestrator binary entrypoint wiring configuration, the Supabase
//! store, the realtime broadcaster and the REST layer.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use battle_orchestrator::{
    config::AppConfig,
    dao::battle_store::supabase::{SupabaseBattleStore, SupabaseConfig},
    routes,
    services::{broadcaster::RealtimeBroadcaster, token_issuer::TokenIssuer},
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::from_env().context("loading configuration")?;
    let tokens = TokenIssuer::from_config(&config).context("preparing realtime tokens")?;
    info!(issuer = tokens.issuer(), "realtime token issuer ready");

    let store = SupabaseBattleStore::connect(SupabaseConfig::new(
        config.supabase_url.as_str(),
        config.service_role_key.as_str(),
    ))
    .context("building battle store client")?;
    let broadcaster = RealtimeBroadcaster::new(
        &config.supabase_url,
        &config.service_role_key,
        Arc::new(tokens),
    )
    .context("building realtime broadcaster")?;

    let app_state = AppState::new(Arc::new(store), Arc::new(broadcaster));
    let app = build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "cannot install SIGTERM handler; waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
