mod api;
mod middleware;

use std::sync::Arc;

use giftrec_affiliate::AffiliateClient;
use giftrec_core::Catalog;
use giftrec_recommend::{RecommendSettings, Recommender};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState, CredentialPresence};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = giftrec_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let catalog = match &config.catalog_path {
        Some(path) => giftrec_core::load_catalog(path)?,
        None => Catalog::builtin(),
    };

    let client = AffiliateClient::from_config(&config)?;
    if !client.is_configured() {
        tracing::warn!("upstream credentials not set; recommendations will be empty");
    }

    let state = AppState {
        recommender: Arc::new(Recommender::new(
            client,
            catalog,
            RecommendSettings::from_config(&config),
        )),
        credentials: CredentialPresence::from_config(&config),
    };
    let app = build_app(state, config.diagnostics_enabled);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        addr = %config.bind_addr,
        env = %config.env,
        diagnostics = config.diagnostics_enabled,
        "giftrec-server listening"
    );
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
