//! API Client

use serde::Deserialize;

use crate::checkout::{CheckoutError, CheckoutRequest, SessionResponse};

/// Reply from `/api/config`
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub publishable_key: String,
}

fn api_url(path: &str) -> String {
    let origin = web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_else(|| "http://localhost:3000".into());
    format!("{origin}{path}")
}

/// Fetch the Stripe publishable key
pub async fn fetch_client_config() -> Result<ClientConfig, CheckoutError> {
    let response = reqwest::Client::new()
        .get(api_url("/api/config"))
        .send()
        .await
        .map_err(|e| CheckoutError::ProviderUnavailable(e.to_string()))?;

    response
        .json()
        .await
        .map_err(|e| CheckoutError::ProviderUnavailable(e.to_string()))
}

/// Ask the server for a checkout session.
///
/// Error replies are decoded too; they simply carry no `sessionId`.
pub async fn create_checkout_session(request: &CheckoutRequest) -> Result<SessionResponse, CheckoutError> {
    let response = reqwest::Client::new()
        .post(api_url("/api/create-checkout-session"))
        .json(request)
        .send()
        .await
        .map_err(|e| CheckoutError::Request(e.to_string()))?;

    let status = response.status();
    let body: SessionResponse = response
        .json()
        .await
        .map_err(|e| CheckoutError::Request(format!("{status}: {e}")))?;

    if let Some(error) = &body.error {
        leptos::logging::warn!("Checkout session request returned {status}: {error}");
    }

    Ok(body)
}
