use std::net::SocketAddr;
use std::sync::Arc;

use axum_extra::extract::cookie::Key;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gatehouse_access::TracingAuditLog;
use gatehouse_server::config::ServerConfig;
use gatehouse_server::gateway::{self, AppState};
use gatehouse_server::provider::Auth0Client;

#[tokio::main]
async fn main() {
    // Stdout line-flushes every event, so audit records survive abrupt
    // process termination.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    let cookie_key = Key::derive_from(config.secret_key.as_bytes());

    // Initialize the OIDC client
    tracing::info!("Discovering OIDC provider...");
    let provider = Auth0Client::discover(&config.oidc, &config.redirect_uri())
        .await
        .expect("failed to discover OIDC provider");

    let state = Arc::new(AppState::new(
        Arc::new(provider),
        Arc::new(TracingAuditLog),
        cookie_key,
        config.session.clone(),
        config.home_url(),
    ));

    let app = gateway::router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.listen_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("server error");
}
