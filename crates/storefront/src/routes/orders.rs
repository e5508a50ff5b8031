//! Order route handlers: placing orders, order history and invoices.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Redirect},
};
use tracing::instrument;

use larder_core::{Order, OrderId};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::CurrentUser;
use crate::services::invoice::{invoice_file_name, render_invoice};
use crate::services::orders::OrderService;
use crate::state::AppState;

/// Order history page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders.html")]
pub struct OrdersTemplate {
    pub current_user: Option<CurrentUser>,
    pub orders: Vec<Order>,
}

/// Turn the cart into an order.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Redirect> {
    let order = OrderService::new(state.pool()).place_order(user.id).await?;

    add_breadcrumb(
        "orders",
        "Placed order",
        Some(&[("order_id", order.id.to_string().as_str())]),
    );
    Ok(Redirect::to("/orders"))
}

/// Display the user's orders, newest first.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse> {
    let orders = OrderService::new(state.pool()).list_orders(user.id).await?;

    Ok(OrdersTemplate {
        current_user: Some(user),
        orders,
    })
}

/// Render an order's invoice as PDF.
///
/// The PDF is archived to disk and returned inline. A failed archive write is
/// logged and does not fail the request.
#[instrument(skip_all, fields(user_id = %user.id, order_id = %id))]
pub async fn invoice(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let order_id: OrderId = id
        .parse()
        .map_err(|_| AppError::NotFound(format!("order {id}")))?;
    let order = OrderService::new(state.pool()).get_order(order_id).await?;

    let requester = user.id;
    let bytes = tokio::task::spawn_blocking(move || render_invoice(&order, requester))
        .await
        .map_err(|e| AppError::Internal(format!("invoice task failed: {e}")))??;

    if let Err(e) = state.invoices().store(order_id, &bytes).await {
        tracing::warn!(error = %e, dir = %state.invoices().dir().display(), "Failed to archive invoice");
    }

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", invoice_file_name(order_id)),
            ),
        ],
        bytes,
    ))
}
