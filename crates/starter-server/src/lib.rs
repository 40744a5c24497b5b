//! saas-starter HTTP API
//!
//! Axum router for checkout session creation and Stripe webhooks.

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{client_config, create_checkout_session, health_check, stripe_webhook};
pub use crate::state::AppState;

/// Build the API router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/config", get(client_config))
        .route("/api/create-checkout-session", post(create_checkout_session))
        .route("/api/webhook", post(stripe_webhook))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
