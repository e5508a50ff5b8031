//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Forms with field-level validation re-render themselves and never reach this type.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::filters;
use crate::models::CurrentUser;
use crate::services::auth::AuthError;
use crate::services::cart::CartError;
use crate::services::catalog::CatalogError;
use crate::services::checkout::{CheckoutError, PaymentError};
use crate::services::invoice::InvoiceError;
use crate::services::orders::OrdersError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Input was rejected.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The resource belongs to someone else.
    #[error("Forbidden")]
    Forbidden,

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Payment provider call failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorPage<'a> {
    current_user: Option<CurrentUser>,
    status: u16,
    title: &'a str,
    message: &'a str,
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Payment(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Message safe to show to the client.
    fn public_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::NotFound(_) => "The page you were looking for does not exist.".to_string(),
            Self::Forbidden => "You are not allowed to view this page.".to_string(),
            Self::Database(_) | Self::Internal(_) => {
                "Something went wrong on our side. Please try again later.".to_string()
            }
            Self::Payment(_) => {
                "The payment provider could not be reached. Please try again later.".to_string()
            }
        }
    }

    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Payment(_) | Self::Internal(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let status = self.status();
        let message = self.public_message();
        let page = ErrorPage {
            current_user: None,
            status: status.as_u16(),
            title: status.canonical_reason().unwrap_or("Error"),
            message: &message,
        };

        match page.render() {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to render error page");
                (status, message).into_response()
            }
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(id) => Self::NotFound(format!("product {id}")),
            CatalogError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::ProductNotFound(id) => Self::NotFound(format!("product {id}")),
            CartError::UserNotFound => Self::NotFound("user".to_string()),
            CartError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<OrdersError> for AppError {
    fn from(err: OrdersError) -> Self {
        match err {
            OrdersError::EmptyCart => Self::Validation("Your cart is empty.".to_string()),
            OrdersError::NotFound(id) => Self::NotFound(format!("order {id}")),
            OrdersError::Repository(RepositoryError::NotFound) => {
                Self::NotFound("user".to_string())
            }
            OrdersError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::EmptyCart => Self::Validation("Your cart is empty.".to_string()),
            CheckoutError::Price(e) => Self::Internal(e.to_string()),
            CheckoutError::Payment(e) => Self::Payment(e),
        }
    }
}

impl From<InvoiceError> for AppError {
    fn from(err: InvoiceError) -> Self {
        match err {
            InvoiceError::Forbidden => Self::Forbidden,
            InvoiceError::Render(msg) => Self::Internal(msg),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Repository(e) => Self::Database(e),
            AuthError::PasswordHash => Self::Internal("password hashing failed".to_string()),
            other => Self::Validation(
                other
                    .field_errors()
                    .and_then(|errors| errors.first_message().map(str::to_string))
                    .unwrap_or_else(|| other.to_string()),
            ),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added product", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use larder_core::{OrderId, ProductId};

    use super::*;

    fn get_status(err: impl Into<AppError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product 123".to_string());
        assert_eq!(err.to_string(), "Not found: product 123");

        let err = AppError::Validation("Your cart is empty.".to_string());
        assert_eq!(err.to_string(), "Validation error: Your cart is empty.");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::Validation("test".to_string())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(get_status(AppError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(PaymentError::InvalidResponse("bad".to_string())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_domain_errors_map_to_status() {
        assert_eq!(
            get_status(CatalogError::NotFound(ProductId::new(9))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(OrdersError::NotFound(OrderId::new(9))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(OrdersError::EmptyCart),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(CheckoutError::EmptyCart),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(get_status(InvoiceError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(
            get_status(AuthError::PasswordHash),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_forbidden_and_not_found_hide_details() {
        let forbidden = AppError::Forbidden.public_message();
        let missing = AppError::NotFound("order 42".to_string()).public_message();
        assert!(!forbidden.contains("42"));
        assert!(!missing.contains("42"));
    }

    #[test]
    fn test_auth_error_uses_field_message() {
        let err: AppError = AuthError::UserNotFound.into();
        assert_eq!(err.public_message(), "E-mail not found.");
    }
}
