use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use leafmap_client::{HttpScoringClient, MemoryScoringService};
use leafmap_core::ports::ScoringService;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use leafmap_api::{create_router, ApiConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leafmap_api=info,leafmap_core=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env();
    let session_config = config.session_config().context("Invalid LeafMap configuration")?;

    tracing::info!(
        port = config.port,
        scoring_url = %session_config.scoring_url.value,
        timeout_secs = session_config.request_timeout_secs.value,
        "Starting LeafMap API server"
    );
    for (key, (value, source)) in session_config.to_inspection_map() {
        tracing::debug!(key = %key, value = %value, ?source, "Resolved setting");
    }

    // Scoring backend: local files when LEAFMAP_DATA_DIR is set, otherwise the remote service
    let service: Arc<dyn ScoringService> = match &config.data_dir {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "Using in-memory scoring service");
            let service = MemoryScoringService::load_dir(dir)
                .with_context(|| format!("Failed to load scoring data from {}", dir.display()))?;
            Arc::new(service)
        }
        None => {
            tracing::info!("Using remote scoring service (set LEAFMAP_DATA_DIR for local files)");
            Arc::new(HttpScoringClient::from_config(&session_config))
        }
    };

    let state = AppState::load(service, session_config).await.context(
        "Failed to load the location catalog.\n\
         Remediation:\n\
         1. Ensure the scoring service is running\n\
         2. Verify LEAFMAP_SCORING_URL is correct",
    )?;

    let cors = CorsLayer::new()
        .allow_origin(config.cors_origin.parse::<HeaderValue>().context("Invalid LEAFMAP_CORS_ORIGIN")?)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let app = create_router(Arc::new(state)).layer(TraceLayer::new_for_http()).layer(cors);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await.with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Listening on {}", addr);
    tracing::info!("CORS enabled for {}", config.cors_origin);

    axum::serve(listener, app).await?;
    Ok(())
}
