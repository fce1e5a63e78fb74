use std::path::Path;

use poliza_core::PolizaConfig;
use poliza_web::{AppState, app};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "poliza_web=info,poliza_core=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match std::env::var("POLIZA_CONFIG") {
        Ok(path) => PolizaConfig::from_file(Path::new(&path))?,
        Err(_) => PolizaConfig::default(),
    };

    let state = AppState::new(&config)?;
    tracing::info!(
        "Loaded catalog with {} document types",
        state.pipeline.catalog().document_types().len()
    );

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!("Starting poliza-web on http://{}", config.server.bind);
    axum::serve(listener, app(state)).await?;

    Ok(())
}
