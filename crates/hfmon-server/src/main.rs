mod api;
mod middleware;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::{AuthState, RateLimitState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Arc::new(hfmon_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let watchlist = hfmon_core::load_watchlist(&config.watchlist_path).with_context(|| {
        format!("loading watchlist from {}", config.watchlist_path.display())
    })?;
    let collectors = hfmon_collectors::CollectorSet::from_config(&config, &watchlist.galleries)?;

    tracing::info!(
        env = %config.env,
        keywords = watchlist.keywords.len(),
        youtube = collectors.supports(hfmon_core::Channel::Youtube),
        blog = collectors.supports(hfmon_core::Channel::Blog),
        tistory = collectors.supports(hfmon_core::Channel::Tistory),
        dc = collectors.supports(hfmon_core::Channel::Dc),
        data_dir = %config.data_dir.display(),
        "starting hfmon server"
    );

    let auth = AuthState::from_keys(&config.api_keys, config.is_development())?;
    let rate_limit = RateLimitState::per_minute(config.rate_limit_per_minute);
    let app = build_app(
        AppState::new(Arc::clone(&config), watchlist, collectors),
        auth,
        rate_limit,
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
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
