use anyhow::Context;
use tracing::{info, warn};

use annotate_api::app::{self, AppServices};
use annotate_auth::IdentityResolver;
use annotate_infra::{AppConfig, SyncPoller};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    annotate_observability::init_from_env();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let resolver = IdentityResolver::from_settings(&config.auth)
        .context("authentication gate is misconfigured")?;

    tokio::fs::create_dir_all(&config.data_dir)
        .await
        .with_context(|| format!("failed to create {}", config.data_dir.display()))?;

    let services = AppServices::from_config(&config);

    // Pull before touching the comment file so a fresh checkout picks up the
    // remote copy instead of creating an empty one.
    let poller = SyncPoller::new(services.sync.clone(), config.sync.poll_interval)
        .start()
        .await;

    services
        .initialize()
        .await
        .context("failed to initialize comment database")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(
        addr = %listener.local_addr()?,
        verification = resolver.verifies_tokens(),
        sync = services.sync.is_configured(),
        "listening"
    );

    let app = app::build_app(services, resolver);
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .context("server failed")?;

    if let Some(poller) = poller {
        poller.shutdown().await;
    }
    info!("shut down");
    Ok(())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => wait_for_ctrl_c().await,
        }
    }
    #[cfg(not(unix))]
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    until_signal(tokio::signal::ctrl_c()).await
}

/// Resolves when `signal` fires. If the listener cannot be installed the
/// server keeps running rather than shutting down at once.
async fn until_signal(signal: impl std::future::Future<Output = std::io::Result<()>>) {
    if let Err(e) = signal.await {
        warn!(error = %e, "cannot listen for shutdown signals; stop the process externally");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn delivered_signal_shuts_down() {
        let done = tokio::time::timeout(Duration::from_millis(200), until_signal(async { Ok(()) })).await;
        assert!(done.is_ok());
    }

    #[tokio::test]
    async fn unregistrable_signal_keeps_serving() {
        let failing = async { Err(std::io::Error::other("signal driver unavailable")) };
        let done = tokio::time::timeout(Duration::from_millis(100), until_signal(failing)).await;
        assert!(done.is_err());
    }
}
