mod api;
mod error;
mod router;
mod state;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use vigil_backend::Registry;
use vigil_core::Config;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,vigil_server=debug".into()),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    vigil_core::config::load_dotenv();
    init_tracing();

    let config = Config::from_env();

    // One HTTP client for every backend retrieval; the timeout bounds the
    // single blocking network call a request is allowed.
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.backend.request_timeout_secs))
        .build()?;
    let registry = Registry::with_defaults(client);
    info!(backends = ?registry.names(), "backend registry initialized");

    let app = router::build_router(Arc::new(state::AppState::new(registry)));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
