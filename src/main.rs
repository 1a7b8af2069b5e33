use std::sync::{Arc, Mutex};

use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use alou::config::AppConfig;
use alou::db;
use alou::handlers;
use alou::services::gateway::crm::{CrmIdentityGateway, CrmTicketingGateway};
use alou::services::gateway::simulated::{SimulatedIdentityGateway, SimulatedTicketingGateway};
use alou::services::gateway::{IdentityGateway, TicketingGateway};
use alou::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    match db::queries::expire_old_sessions(&conn) {
        Ok(0) => {}
        Ok(n) => tracing::info!("expired {n} stale sessions"),
        Err(e) => tracing::warn!(error = %e, "failed to expire stale sessions"),
    }

    let (identity, ticketing): (Box<dyn IdentityGateway>, Box<dyn TicketingGateway>) =
        match config.gateway_provider.as_str() {
            "crm" => {
                anyhow::ensure!(
                    !config.crm_base_url.is_empty(),
                    "CRM_BASE_URL must be set when GATEWAY_PROVIDER=crm"
                );
                tracing::info!("using CRM gateways (url: {})", config.crm_base_url);
                (
                    Box::new(CrmIdentityGateway::new(
                        config.crm_base_url.clone(),
                        config.crm_api_token.clone(),
                    )),
                    Box::new(CrmTicketingGateway::new(
                        config.crm_base_url.clone(),
                        config.crm_api_token.clone(),
                    )),
                )
            }
            _ => {
                tracing::info!(
                    "using simulated gateways (failure rate: {})",
                    config.gateway_failure_rate
                );
                (
                    Box::new(SimulatedIdentityGateway::new(
                        config.identity_latency_ms,
                        config.gateway_failure_rate,
                        config.existing_complaint_rate,
                    )),
                    Box::new(SimulatedTicketingGateway::new(
                        config.ticketing_latency_ms,
                        config.gateway_failure_rate,
                    )),
                )
            }
        };

    let cors = if config.allowed_origin == "*" {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(config.allowed_origin.parse::<HeaderValue>()?)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any)
    };

    let state = Arc::new(AppState::new(
        Arc::new(Mutex::new(conn)),
        config.clone(),
        identity,
        ticketing,
    ));

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/chat/sessions", post(handlers::chat::start_session))
        .route("/api/chat/sessions/:id", get(handlers::chat::get_session))
        .route(
            "/api/chat/sessions/:id/message",
            post(handlers::chat::post_message),
        )
        .route(
            "/api/chat/sessions/:id/option",
            post(handlers::chat::post_option),
        )
        .route(
            "/api/chat/sessions/:id/restart",
            post(handlers::chat::restart_session),
        )
        .route("/api/chat/sessions/:id/kpis", get(handlers::chat::get_kpis))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
