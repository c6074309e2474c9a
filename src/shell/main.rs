use std::net::SocketAddr;

use sample_tasks::shell::config::Settings;
use sample_tasks::shell::http::router;
use sample_tasks::shell::state::AppState;
use sample_tasks::shell::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the settings file and defaults still apply.
    let _ = dotenvy::dotenv();

    let settings = Settings::load()?;
    telemetry::init(&settings.logging.filter);
    tracing::info!(environment = settings.environment.as_str(), "starting sample tasks service");

    let state = AppState::from_settings(&settings).await?;
    let app = router(state, settings.slow_request_thresholds());

    let addr: SocketAddr = settings.server.address().parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP endpoint: http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("sample tasks service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received, draining connections");
}
