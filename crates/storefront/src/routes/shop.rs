//! Catalog route handlers: shop index, product list and product detail.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use larder_core::{Pagination, Product, ProductId};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::CurrentUser;
use crate::state::AppState;

/// Pagination query parameters.
///
/// `page` is kept as raw text so that `?page=abc` or `?page=` falls back to
/// the first page instead of failing extraction.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<String>,
}

impl PaginationQuery {
    /// The requested page, or `None` when absent or not a positive integer.
    #[must_use]
    pub fn page(&self) -> Option<u32> {
        self.page.as_deref().and_then(|p| p.trim().parse().ok())
    }
}

/// Paginated product listing, shared by `/` and `/products`.
#[derive(Template, WebTemplate)]
#[template(path = "shop/index.html")]
pub struct ProductListTemplate {
    pub current_user: Option<CurrentUser>,
    pub title: &'static str,
    /// Path the pagination links point at.
    pub base_path: &'static str,
    pub products: Vec<Product>,
    pub pagination: Pagination,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "shop/product_detail.html")]
pub struct ProductDetailTemplate {
    pub current_user: Option<CurrentUser>,
    pub product: Product,
}

async fn product_list(
    state: &AppState,
    current_user: Option<CurrentUser>,
    page: Option<u32>,
    title: &'static str,
    base_path: &'static str,
) -> Result<ProductListTemplate> {
    let page = state.catalog().list_products(page).await?;

    Ok(ProductListTemplate {
        current_user,
        title,
        base_path,
        products: page.items,
        pagination: page.pagination,
    })
}

/// Display the shop front page.
#[instrument(skip(state, current_user))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(current_user): OptionalAuth,
    Query(query): Query<PaginationQuery>,
) -> Result<impl IntoResponse> {
    product_list(&state, current_user, query.page(), "Shop", "/").await
}

/// Display the product listing.
#[instrument(skip(state, current_user))]
pub async fn products(
    State(state): State<AppState>,
    OptionalAuth(current_user): OptionalAuth,
    Query(query): Query<PaginationQuery>,
) -> Result<impl IntoResponse> {
    product_list(&state, current_user, query.page(), "All Products", "/products").await
}

/// Display a single product.
#[instrument(skip(state, current_user))]
pub async fn product_detail(
    State(state): State<AppState>,
    OptionalAuth(current_user): OptionalAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id: ProductId = id
        .parse()
        .map_err(|_| AppError::NotFound(format!("product {id}")))?;
    let product = state.catalog().get_product(id).await?;

    Ok(ProductDetailTemplate {
        current_user,
        product,
    })
}
