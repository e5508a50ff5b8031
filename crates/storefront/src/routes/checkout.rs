//! Checkout route handlers.
//!
//! `/checkout` opens a hosted payment session and shows a confirmation page
//! linking to it. The provider sends the customer back to
//! `/checkout/success` (which places the order) or `/checkout/cancel`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect},
};
use tracing::instrument;

use larder_core::{Price, ResolvedCart};

use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::CurrentUser;
use crate::services::cart::CartService;
use crate::services::checkout::create_checkout_session;
use crate::services::orders::OrderService;
use crate::state::AppState;

/// Checkout confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout.html")]
pub struct CheckoutTemplate {
    pub current_user: Option<CurrentUser>,
    pub cart: ResolvedCart,
    pub total: Price,
    pub session_id: String,
    pub checkout_url: Option<String>,
    pub publishable_key: String,
    /// The customer came back from the provider without paying.
    pub cancelled: bool,
}

async fn render_checkout(
    state: &AppState,
    user: CurrentUser,
    cancelled: bool,
) -> Result<CheckoutTemplate> {
    let cart = CartService::new(state.pool(), state.catalog())
        .get_cart(user.id)
        .await?;

    let config = state.config();
    let summary = create_checkout_session(
        state.payments(),
        cart,
        config.stripe.currency,
        config.absolute_url("/checkout/success"),
        config.absolute_url("/checkout/cancel"),
    )
    .await?;

    Ok(CheckoutTemplate {
        current_user: Some(user),
        cart: summary.cart,
        total: summary.total,
        session_id: summary.session.id,
        checkout_url: summary.session.url,
        publishable_key: config.stripe.publishable_key.clone(),
        cancelled,
    })
}

/// Open a checkout session for the cart.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse> {
    render_checkout(&state, user, false).await
}

/// Payment succeeded: place the order.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn success(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Redirect> {
    let order = OrderService::new(state.pool()).place_order(user.id).await?;

    add_breadcrumb(
        "checkout",
        "Checkout completed",
        Some(&[("order_id", order.id.to_string().as_str())]),
    );
    Ok(Redirect::to("/orders"))
}

/// Payment abandoned: show the checkout page again with a fresh session.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse> {
    tracing::info!("Checkout cancelled by customer");
    render_checkout(&state, user, true).await
}
