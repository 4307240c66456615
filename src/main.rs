use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use leadbook::config::AppConfig;
use leadbook::db;
use leadbook::handlers;
use leadbook::services::messaging::whatsapp::WhatsAppCloudProvider;
use leadbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let messaging = WhatsAppCloudProvider::new(
        config.whatsapp_api_token.clone(),
        config.whatsapp_phone_id.clone(),
    );

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        messaging: Box::new(messaging),
    });

    let app = Router::new()
        .route("/", get(handlers::health::home))
        .route("/health", get(handlers::health::health))
        .route("/webhook", get(handlers::webhook::verify_webhook))
        .route("/webhook", post(handlers::webhook::receive_event))
        .route(
            "/scheduling/lead/:lead_id",
            get(handlers::scheduling::get_lead_status),
        )
        .route(
            "/scheduling/select-window",
            post(handlers::scheduling::select_window),
        )
        .route(
            "/api/admin/appointments",
            get(handlers::admin::list_appointments),
        )
        .route(
            "/api/admin/appointments/:id/confirm",
            post(handlers::admin::confirm_appointment),
        )
        .route(
            "/api/admin/appointments/:id/reject",
            post(handlers::admin::reject_appointment),
        )
        .route(
            "/api/admin/appointments/:id/complete",
            post(handlers::admin::complete_appointment),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
