use crate::config::PipelineConfig;
use crate::error::Result;
use crate::pipeline::matcher::CrossStageMatcher;
use crate::pipeline::render::DashboardRenderer;
use crate::pipeline::store::read_stage;
use crate::types::{CanonicalItem, SocialPost, SummaryRecord};
use axum::{
    http::{Method, StatusCode},
    response::{Html, IntoResponse, Json},
    routing::get,
    Extension, Router,
};
use hyper::Server;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Render the dashboard from whatever the hand-off files hold right now
pub fn render_dashboard(config: &PipelineConfig) -> Result<String> {
    let articles: Vec<CanonicalItem> = read_stage(&config.articles_path())?;
    let summaries: Vec<SummaryRecord> = read_stage(&config.summaries_path())?;
    let posts: Vec<SocialPost> = read_stage(&config.posts_path())?;

    let renderer = DashboardRenderer::new(
        CrossStageMatcher::from_config(&config.matching),
        config.dashboard.clone(),
    );
    Ok(renderer.render(&articles, &summaries, &posts))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "news-pipeline-dashboard",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn dashboard(Extension(config): Extension<Arc<PipelineConfig>>) -> impl IntoResponse {
    match render_dashboard(&config) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Dashboard render failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

pub fn create_server(config: Arc<PipelineConfig>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/", get(dashboard))
        .route("/health", get(health))
        .layer(Extension(config))
        .layer(ServiceBuilder::new().layer(cors))
}

pub async fn start_server(config: PipelineConfig, port: u16) -> anyhow::Result<()> {
    let app = create_server(Arc::new(config));
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("🚀 Dashboard running on http://localhost:{}", port);
    info!("💚 Health check: http://localhost:{}/health", port);

    Server::bind(&addr).serve(app.into_make_service()).await?;
    Ok(())
}
