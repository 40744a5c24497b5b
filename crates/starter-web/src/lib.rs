//! saas-starter Web Frontend
//!
//! Leptos-based WASM checkout button. A static pricing page mounts one
//! button per price with [`mount_checkout`]; clicking it creates a session
//! on the server and redirects to Stripe's hosted checkout.

mod api;
mod checkout;
mod components;
mod stripe_js;

pub use checkout::{
    CheckoutDriver, CheckoutError, CheckoutMode, CheckoutOutcome, CheckoutPhase, CheckoutRequest,
    RedirectReply, SessionResponse, run_checkout,
};
pub use components::StripeCheckout;
pub use stripe_js::{BrowserDriver, StripeJs, load_stripe, open_checkout};

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

/// WASM entry point
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
}

/// Mount a checkout button inside the element with id `target_id`.
///
/// `mode` is `"payment"` for a one-time purchase; anything else subscribes.
#[wasm_bindgen]
pub fn mount_checkout(target_id: &str, price_id: String, mode: &str, label: String) -> Result<(), JsValue> {
    let parent = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(target_id))
        .ok_or_else(|| JsValue::from_str(&format!("no element #{target_id}")))?
        .dyn_into::<web_sys::HtmlElement>()?;

    let mode = if mode == "payment" {
        CheckoutMode::Payment
    } else {
        CheckoutMode::Subscription
    };

    leptos::mount::mount_to(parent, move || {
        view! { <StripeCheckout price_id=price_id mode=mode>{label.clone()}</StripeCheckout> }
    })
    .forget();

    Ok(())
}
