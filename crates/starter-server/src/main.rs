//! saas-starter HTTP Server
//!
//! Serves the checkout API, the Stripe webhook receiver and the compiled
//! web frontend.

use tower_http::services::ServeDir;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use starter_server::{AppState, config::ServerConfig, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env().inspect_err(|e| {
        tracing::error!("Configuration error: {}", e);
        tracing::error!("  Set STRIPE_SECRET_KEY, STRIPE_PUBLISHABLE_KEY, STRIPE_WEBHOOK_SECRET and PUBLIC_BASE_URL in .env");
    })?;
    tracing::info!(?config, "Loaded configuration");

    let state = AppState::from_config(&config);

    let app = router(state).fallback_service(ServeDir::new(&config.static_dir));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("saas-starter server running on http://{}", config.bind_addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                      - Health check");
    tracing::info!("  GET  /api/config                  - Publishable key");
    tracing::info!("  POST /api/create-checkout-session - Create Stripe checkout");
    tracing::info!("  POST /api/webhook                 - Stripe webhook");

    axum::serve(listener, app).await?;

    Ok(())
}
