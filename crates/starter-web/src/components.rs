//! UI Components

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::checkout::{CheckoutMode, CheckoutPhase, CheckoutRequest, run_checkout};
use crate::stripe_js::BrowserDriver;

/// Button that starts a Stripe Checkout for one price.
///
/// Disabled and labelled "Loading..." while a checkout is under way.
#[component]
pub fn StripeCheckout(
    #[prop(into)] price_id: String,
    #[prop(optional)] mode: CheckoutMode,
    children: ChildrenFn,
    #[prop(optional, into)] class: String,
) -> impl IntoView {
    let phase = RwSignal::new(CheckoutPhase::Idle);

    let on_click = move |_| {
        if !phase.try_update(CheckoutPhase::begin).unwrap_or(false) {
            return;
        }

        let request = CheckoutRequest {
            price_id: price_id.clone(),
            mode,
        };
        spawn_local(async move {
            let outcome = run_checkout(&BrowserDriver, &request).await;
            phase.update(|p| p.settle(&outcome));
        });
    };

    view! {
        <button class=class on:click=on_click disabled=move || phase.with(CheckoutPhase::is_busy)>
            {move || {
                if phase.with(CheckoutPhase::is_busy) {
                    "Loading...".into_any()
                } else {
                    children().into_any()
                }
            }}
        </button>
    }
}
