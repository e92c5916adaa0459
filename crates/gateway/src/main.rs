//! PropPilot API Gateway
//!
//! The HTTP entry point for the conversational property search.
//! Handles:
//! - Chat requests through the extraction/query/synthesis pipeline
//! - Paginated property listing
//! - Health, readiness and Prometheus metrics
//! - Observability (logging, metrics, request ids)

mod handlers;
mod middleware;

use axum::{
    body::Body,
    http::Request,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use proppilot_common::{
    config::{AppConfig, ObservabilityConfig},
    context::{ContextStore, PipelineOrchestrator},
    db::create_store,
    llm::create_registry,
    metrics,
};
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, info_span};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pipeline: Arc<PipelineOrchestrator>,
    pub metrics: Option<PrometheusHandle>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Arc::new(AppConfig::load()?);
    init_tracing(&config.observability);

    info!(
        service = %config.observability.service_name,
        version = proppilot_common::VERSION,
        environment = %config.server.environment,
        "Starting PropPilot API Gateway"
    );

    let metrics_handle = if config.observability.metrics_enabled {
        let handle = PrometheusBuilder::new()
            .set_buckets(metrics::LATENCY_BUCKETS)?
            .install_recorder()?;
        metrics::register_metrics();
        Some(handle)
    } else {
        None
    };

    let store = create_store(&config.store).await?;
    let providers = Arc::new(create_registry(&config.llm)?);
    let context = Arc::new(ContextStore::new(config.chat.context_turns));
    let pipeline = PipelineOrchestrator::new(providers, store, context, config.chat.clone());

    let state = AppState {
        config: config.clone(),
        pipeline: Arc::new(pipeline),
        metrics: metrics_handle,
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Install the global tracing subscriber; `RUST_LOG` overrides the configured level
fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logging {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }
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

    let service = state.config.observability.service_name.clone();
    let trace = TraceLayer::new_for_http().make_span_with(move |request: &Request<Body>| {
        info_span!(
            "request",
            service = %service,
            method = %request.method(),
            uri = %request.uri()
        )
    });

    let api_routes = Router::new()
        .route("/chat", post(handlers::chat::chat))
        .route("/properties", get(handlers::properties::list_properties));

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .route("/metrics", get(handlers::health::metrics))
        .route_layer(axum::middleware::from_fn(
            middleware::request_metrics::track_requests,
        ))
        .layer(TimeoutLayer::new(state.config.request_timeout()))
        .layer(trace)
        .layer(cors)
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
