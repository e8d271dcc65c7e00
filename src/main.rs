//! wizard-relay server entry point.
//!
//! Starts the Axum server with the `/ws` relay endpoint.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use wizard_relay::app_state::AppState;
use wizard_relay::audit::AuditLog;
use wizard_relay::config::RelayConfig;
use wizard_relay::relay::EventRelay;
use wizard_relay::session::SessionRegistry;
use wizard_relay::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = RelayConfig::from_env()?;
    tracing::info!(
        addr = %config.listen_addr,
        audit_log = %config.audit_log_path.display(),
        "starting wizard-relay"
    );

    // Build relay context
    let registry = Arc::new(SessionRegistry::new());
    let audit = AuditLog::new(config.audit_log_path);
    let relay = Arc::new(EventRelay::new(registry, audit));

    let app_state = AppState { relay };

    // Build router
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
