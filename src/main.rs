use time::Duration;
use tower_http::cors::CorsLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::Key};
use tracing_subscriber::EnvFilter;

use carteira_server::{AppState, Classifier, app_router, config::Config, constants::*, database};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env().map_err(|e| format!("Configuration error: {}", e))?;

    let db = database::init_db(&config.data_path)
        .await
        .map_err(|e| format!("Failed to initialize database: {}", e))?;

    let classifier = Classifier::new(config.classifier_url.clone(), config.classifier_timeout);

    let app_state = AppState { db, classifier };

    let store = MemoryStore::default();
    let session_key = Key::try_from(config.session_secret.as_bytes())
        .map_err(|e| format!("Invalid session secret: {}", e))?;

    // Secure cookies only when explicitly running behind HTTPS
    let is_production = std::env::var("PRODUCTION")
        .map(|val| val.to_lowercase() == "true")
        .unwrap_or(false);

    let session_layer = SessionManagerLayer::new(store)
        .with_secure(is_production)
        .with_name(SESSION_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::days(SESSION_EXPIRY_DAYS)))
        .with_signed(session_key);

    let frontend_origin =
        std::env::var("FRONTEND_ORIGIN").unwrap_or_else(|_| "http://localhost:8080".to_string());

    let frontend_origin_header = frontend_origin
        .parse::<axum::http::HeaderValue>()
        .map_err(|e| format!("Invalid FRONTEND_ORIGIN '{}': {}", frontend_origin, e))?;

    let cors = CorsLayer::new()
        .allow_origin(frontend_origin_header)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
            axum::http::header::COOKIE,
        ])
        .allow_credentials(true);

    let app = app_router(app_state).layer(cors).layer(session_layer);

    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", bind_address, e))?;

    tracing::info!(%bind_address, "server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| format!("Server error: {}", e))?;

    Ok(())
}
