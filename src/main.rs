use std::time::Duration;

use slowcinema::{AppState, Config, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,slowcinema=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;

    let store = Store::connect(&config.database_url, &config.pool).await?;
    let (state, worker) = AppState::new(store.clone(), &config.site_url, config.revalidate_rps);

    let app = slowcinema::app(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    // The router owned the last sender; once it is gone the worker drains and exits.
    match tokio::time::timeout(Duration::from_secs(5), worker).await {
        Ok(Ok(())) => {},
        Ok(Err(err)) => tracing::warn!(error = %err, "revalidation worker ended abnormally"),
        Err(_) => tracing::warn!("revalidation worker still busy at shutdown"),
    }
    store.close().await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
