use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sn7meta_api::{create_router, ApiConfig, AppState, DeltaModel, LinearDeltaModel};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sn7meta_api=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env();

    // Load the model once at startup
    let model: Arc<dyn DeltaModel> = match &config.model_path {
        Some(path) => Arc::new(
            LinearDeltaModel::from_path(path)
                .with_context(|| format!("Failed to load model from {}", path.display()))?,
        ),
        None => {
            tracing::warn!("SN7_MODEL_PATH not set, serving the difference baseline");
            Arc::new(LinearDeltaModel::difference_baseline())
        }
    };

    tracing::info!(port = config.port, model = model.name(), "Starting building growth prediction API");

    let origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid SN7_CORS_ORIGIN '{}'", config.cors_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let app = create_router(Arc::new(AppState::new(model)))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Listening on {}", addr);
    tracing::info!("CORS enabled for {}", config.cors_origin);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
