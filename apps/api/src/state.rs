use std::sync::Arc;

use crate::config::Config;
use crate::generation::generator::SheetGenerator;
use crate::layout::LayoutService;
use crate::render::Palette;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Validated once at startup; read-only afterwards.
    pub layout: Arc<LayoutService>,
    pub palette: Arc<Palette>,
    /// `None` when no API key is configured.
    pub generator: Option<Arc<dyn SheetGenerator>>,
}

impl AppState {
    pub fn new(config: Config, generator: Option<Arc<dyn SheetGenerator>>) -> anyhow::Result<Self> {
        let layout = LayoutService::new(config.layout.clone())?;
        Ok(Self {
            config,
            layout: Arc::new(layout),
            palette: Arc::new(Palette::default()),
            generator,
        })
    }
}
