mod config;
mod errors;
mod generation;
mod layout;
mod llm_client;
mod render;
mod routes;
mod sheet;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::generation::generator::SheetGenerator;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed values or an invalid layout policy)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cheatsheet API v{}", env!("CARGO_PKG_VERSION"));

    let page = &config.layout.page;
    let fonts = &config.layout.fonts;
    info!(
        "Layout policy: {:.1}x{:.1}pt page, {:.1}pt margin, fonts {}/{}/{}",
        page.width, page.height, page.margin, fonts.header, fonts.content, fonts.code
    );

    // Initialize LLM client only when a key is configured
    let generator: Option<Arc<dyn SheetGenerator>> = match &config.anthropic_api_key {
        Some(key) => {
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Some(Arc::new(LlmClient::new(key.clone())))
        }
        None => {
            warn!("ANTHROPIC_API_KEY not set; /api/v1/sheets/generate is disabled");
            None
        }
    };

    // Build app state
    let state = AppState::new(config.clone(), generator)?;

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
