use std::sync::Arc;

use poliza_core::acquire::{DefaultSource, DocumentSource};
use poliza_core::extraction::ExtractionPipeline;
use poliza_core::models::config::{PolizaConfig, ServerConfig};
use poliza_core::Catalog;

/// Shared per-process state. Cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ExtractionPipeline>,
    pub source: Arc<dyn DocumentSource>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Build the catalog, pipeline and document source from configuration.
    pub fn new(config: &PolizaConfig) -> anyhow::Result<Self> {
        let catalog = match &config.extraction.catalog_path {
            Some(path) => Catalog::from_file(path)?,
            None => Catalog::builtin()?,
        };
        let pipeline = ExtractionPipeline::from_config(Arc::new(catalog), &config.extraction);
        let source = DefaultSource::new(&config.fetch, &config.pdf)?;

        Ok(Self::with_source(
            pipeline,
            Arc::new(source),
            config.server.clone(),
        ))
    }

    pub fn with_source(
        pipeline: ExtractionPipeline,
        source: Arc<dyn DocumentSource>,
        config: ServerConfig,
    ) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            source,
            config: Arc::new(config),
        }
    }
}
