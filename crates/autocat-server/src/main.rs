mod api;
mod middleware;

use std::sync::Arc;

use autocat_engine::{CatalogEngine, EngineConfig};
use autocat_source::{FileTaxonomySource, HttpCatalogClient, TaxonomySource};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = autocat_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let client = Arc::new(HttpCatalogClient::from_config(&config)?);
    let taxonomy: Arc<dyn TaxonomySource> = match &config.taxonomy_path {
        Some(path) => Arc::new(FileTaxonomySource::load(path)?),
        None => client.clone(),
    };
    let engine = CatalogEngine::new(taxonomy, client, EngineConfig::from_app_config(&config));

    let app = build_app(AppState { engine });

    tracing::info!(
        addr = %config.bind_addr,
        env = %config.env,
        upstream = %config.api_base_url,
        cache = config.cache_enabled,
        "starting catalog server"
    );
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
