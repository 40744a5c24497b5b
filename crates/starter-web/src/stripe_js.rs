//! Stripe.js Interop
//!
//! Loads `https://js.stripe.com/v3` on demand and drives
//! `redirectToCheckout` for the browser [`CheckoutDriver`].

use js_sys::{Object, Promise, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlScriptElement, Window};

use crate::api;
use crate::checkout::{
    CheckoutDriver, CheckoutError, CheckoutRequest, RedirectReply, SessionResponse,
};

const STRIPE_JS_URL: &str = "https://js.stripe.com/v3";

#[wasm_bindgen]
extern "C" {
    /// A Stripe.js client instance
    #[wasm_bindgen(js_name = Stripe)]
    pub type StripeJs;

    #[wasm_bindgen(catch, js_name = Stripe)]
    fn init_stripe(publishable_key: &str) -> Result<StripeJs, JsValue>;

    #[wasm_bindgen(method, js_name = redirectToCheckout)]
    fn redirect_to_checkout(this: &StripeJs, options: &JsValue) -> Promise;
}

fn js_message(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            Reflect::get(value, &JsValue::from_str("message"))
                .ok()
                .and_then(|m| m.as_string())
        })
        .unwrap_or_else(|| format!("{value:?}"))
}

fn unavailable(reason: impl Into<String>) -> CheckoutError {
    CheckoutError::ProviderUnavailable(reason.into())
}

async fn inject_script(window: &Window) -> Result<(), CheckoutError> {
    let document = window.document().ok_or_else(|| unavailable("no document"))?;
    let script: HtmlScriptElement = document
        .create_element("script")
        .map_err(|e| unavailable(js_message(&e)))?
        .dyn_into()
        .map_err(|_| unavailable("not a script element"))?;
    script.set_src(STRIPE_JS_URL);

    let loaded = Promise::new(&mut |resolve, reject| {
        script.set_onload(Some(&resolve));
        script.set_onerror(Some(&reject));
    });

    document
        .head()
        .ok_or_else(|| unavailable("no <head>"))?
        .append_child(&script)
        .map_err(|e| unavailable(js_message(&e)))?;

    JsFuture::from(loaded)
        .await
        .map(|_| ())
        .map_err(|_| unavailable(format!("could not load {STRIPE_JS_URL}")))
}

/// Load Stripe.js if needed and initialise it with `publishable_key`
pub async fn load_stripe(publishable_key: &str) -> Result<StripeJs, CheckoutError> {
    let window = web_sys::window().ok_or_else(|| unavailable("no window"))?;

    let present = Reflect::get(&window, &JsValue::from_str("Stripe"))
        .map(|v| v.is_function())
        .unwrap_or(false);
    if !present {
        inject_script(&window).await?;
    }

    init_stripe(publishable_key).map_err(|e| unavailable(js_message(&e)))
}

/// Redirect to the hosted checkout page.
///
/// Resolves only if Stripe reports an error instead of navigating.
pub async fn open_checkout(stripe: &StripeJs, session_id: &str) -> Result<(), CheckoutError> {
    let options = Object::new();
    Reflect::set(&options, &JsValue::from_str("sessionId"), &JsValue::from_str(session_id))
        .map_err(|e| CheckoutError::Request(js_message(&e)))?;

    let reply = match JsFuture::from(stripe.redirect_to_checkout(&options)).await {
        Ok(result) => {
            let error =
                Reflect::get(&result, &JsValue::from_str("error")).unwrap_or(JsValue::UNDEFINED);
            RedirectReply::Resolved {
                error: (!error.is_undefined() && !error.is_null()).then(|| js_message(&error)),
            }
        }
        Err(e) => RedirectReply::Rejected(js_message(&e)),
    };

    reply.into_result()
}

/// Checkout driver backed by the real browser
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserDriver;

impl CheckoutDriver for BrowserDriver {
    type Provider = StripeJs;

    async fn load_provider(&self) -> Result<StripeJs, CheckoutError> {
        let config = api::fetch_client_config().await?;
        load_stripe(&config.publishable_key).await
    }

    async fn create_session(&self, request: &CheckoutRequest) -> Result<SessionResponse, CheckoutError> {
        api::create_checkout_session(request).await
    }

    async fn redirect(&self, provider: &StripeJs, session_id: &str) -> Result<(), CheckoutError> {
        open_checkout(provider, session_id).await
    }

    fn alert(&self, message: &str) {
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(message);
        }
    }
}
