//! Cart route handlers.
//!
//! All cart routes require a logged-in user; mutations redirect back to
//! `/cart`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tracing::instrument;

use larder_core::{Price, ProductId, ResolvedCart};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::CurrentUser;
use crate::services::cart::CartService;
use crate::state::AppState;

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart.html")]
pub struct CartTemplate {
    pub current_user: Option<CurrentUser>,
    pub cart: ResolvedCart,
    pub total: Price,
}

/// Form carrying the product to add or remove.
#[derive(Debug, Deserialize)]
pub struct CartProductForm {
    pub product_id: String,
}

impl CartProductForm {
    fn product_id(&self) -> Result<ProductId> {
        self.product_id
            .parse()
            .map_err(|_| AppError::NotFound(format!("product {}", self.product_id)))
    }
}

/// Display the cart.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse> {
    let cart = CartService::new(state.pool(), state.catalog())
        .get_cart(user.id)
        .await?;
    let total = cart.total();

    Ok(CartTemplate {
        current_user: Some(user),
        cart,
        total,
    })
}

/// Add one unit of a product to the cart.
#[instrument(skip_all, fields(user_id = %user.id, product_id = %form.product_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<CartProductForm>,
) -> Result<Redirect> {
    let product_id = form.product_id()?;
    CartService::new(state.pool(), state.catalog())
        .add_to_cart(user.id, product_id)
        .await?;

    add_breadcrumb(
        "cart",
        "Added product to cart",
        Some(&[("product_id", form.product_id.as_str())]),
    );
    Ok(Redirect::to("/cart"))
}

/// Remove a product from the cart entirely.
#[instrument(skip_all, fields(user_id = %user.id, product_id = %form.product_id))]
pub async fn delete_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<CartProductForm>,
) -> Result<Redirect> {
    let product_id = form.product_id()?;
    CartService::new(state.pool(), state.catalog())
        .remove_from_cart(user.id, product_id)
        .await?;

    Ok(Redirect::to("/cart"))
}

/// Empty the cart.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Redirect> {
    CartService::new(state.pool(), state.catalog())
        .clear_cart(user.id)
        .await?;

    Ok(Redirect::to("/cart"))
}
