//! FitCore API Gateway
//!
//! The main entry point for all external API requests.
//! Handles:
//! - Authentication and authorization
//! - Rate limiting
//! - Request routing
//! - Observability (logging, metrics, tracing)

mod extract;
mod handlers;
mod middleware;

use axum::{
    routing::{get, post, put},
    Router,
};
use fitcore_common::{
    audit::AuditLogger,
    auth::JwtManager,
    config::AppConfig,
    db::{DbPool, Repository},
    embeddings::{self, Embedder},
    metrics as app_metrics,
    planner::{HttpPlanner, Planner},
};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub jwt: Arc<JwtManager>,
    pub planner: Arc<dyn Planner>,
    pub embedder: Arc<dyn Embedder>,
    pub audit: AuditLogger,
}

impl AppState {
    /// Repository over the shared pool
    pub fn repo(&self) -> Repository {
        Repository::new(self.db.clone())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));
    if config.observability.json_logging {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    info!("Starting FitCore API Gateway v{}", fitcore_common::VERSION);

    let config = Arc::new(config);

    // Initialize metrics
    app_metrics::register_metrics();
    if config.observability.metrics_port > 0 {
        let metrics_addr =
            SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .install()?;
        info!("Prometheus exporter listening on {}", metrics_addr);
    }

    // Initialize database connection and apply pending migrations
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;
    db.run_migrations().await?;

    // Auth
    let jwt = Arc::new(JwtManager::new(
        &config.auth.jwt_secret,
        config.auth.jwt_expiration_secs,
    ));

    // External collaborators
    let planner: Arc<dyn Planner> = Arc::new(HttpPlanner::new(&config.planner)?);
    let embedder = embeddings::create_embedder(&config.embedding)?;

    // Fire-and-forget audit writer
    let (audit, _audit_task) = AuditLogger::spawn(
        Repository::new(db.clone()),
        config.audit.channel_capacity,
    );

    // Create app state
    let state = AppState {
        config: config.clone(),
        db,
        jwt,
        planner,
        embedder,
        audit,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // API routes
    let api_routes = Router::new()
        // Auth endpoints (no bearer token)
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))

        // Profile endpoints
        .route("/profile", get(handlers::profile::get_profile))
        .route("/profile", put(handlers::profile::update_profile))
        .route("/profile/password", post(handlers::profile::change_password))

        // AI assistant endpoint
        .route("/ai/plan", post(handlers::plan::plan))

        // Chat bookkeeping endpoints
        .route("/chat/sessions", get(handlers::chat::list_sessions))
        .route(
            "/chat/sessions/{session_id}/title",
            put(handlers::chat::set_session_title),
        )
        .route("/chat/history", get(handlers::chat::list_history))

        // Website knowledge-base endpoints
        .route("/website-kb/query", post(handlers::kb::query))
        .route("/website-kb/reindex", post(handlers::kb::reindex))

        // Training program endpoints
        .route("/programs", post(handlers::programs::create_program))
        .route("/programs", get(handlers::programs::list_programs))
        .route(
            "/programs/{id}/assign",
            post(handlers::programs::assign_program),
        )

        // Site settings endpoints
        .route("/settings/{key}", get(handlers::settings::get_setting))
        .route("/settings/{key}", put(handlers::settings::put_setting));

    let mut router = Router::new()
        // Health endpoints (no auth)
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .nest("/api", api_routes);

    if state.config.rate_limit.enabled {
        let rps = state.config.rate_limit.requests_per_second;
        let limiter =
            middleware::rate_limit::create_rate_limiter(rps, state.config.rate_limit.burst);
        router = router.layer(axum::middleware::from_fn(
            move |request: axum::extract::Request, next: axum::middleware::Next| {
                let limiter = limiter.clone();
                async move {
                    middleware::rate_limit::rate_limit_middleware(request, next, limiter, rps).await
                }
            },
        ));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
