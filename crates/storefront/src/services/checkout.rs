//! Checkout session creation.
//!
//! Translates a resolved cart into payment-provider line items and hands
//! them to a [`PaymentGateway`]. The provider hosts the payment page; on
//! success it redirects back to `/checkout/success`, which places the order.

use std::future::Future;

use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use larder_core::{CurrencyCode, Price, PriceError, ResolvedCart};

/// Errors from a payment provider.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Transport failure talking to the provider.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider rejected the request.
    #[error("provider returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The provider's response could not be understood.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

/// Errors from checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("invalid price: {0}")]
    Price(#[from] PriceError),

    #[error(transparent)]
    Payment(#[from] PaymentError),
}

/// One line item sent to the payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutLineItem {
    pub name: String,
    pub description: Option<String>,
    /// Unit price in minor units (cents).
    pub unit_amount: i64,
    pub currency: CurrencyCode,
    pub quantity: u32,
}

/// A request to open a hosted checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    pub line_items: Vec<CheckoutLineItem>,
    pub success_url: String,
    pub cancel_url: String,
}

/// Session handle returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub id: String,
    /// Hosted payment page, when the provider returns one.
    pub url: Option<String>,
}

/// A payment provider that can open hosted checkout sessions.
pub trait PaymentGateway: Send + Sync {
    /// Open a checkout session for the given line items.
    fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> impl Future<Output = Result<CheckoutSession, PaymentError>> + Send;
}

/// Everything the checkout page needs to render.
#[derive(Debug, Clone)]
pub struct CheckoutSummary {
    pub session: CheckoutSession,
    pub cart: ResolvedCart,
    pub total: Price,
}

/// Build provider line items from a resolved cart.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart` for an empty cart and
/// `CheckoutError::Price` if a price cannot be expressed in minor units.
pub fn build_line_items(
    cart: &ResolvedCart,
    currency: CurrencyCode,
) -> Result<Vec<CheckoutLineItem>, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    cart.lines
        .iter()
        .map(|line| {
            let description = Some(line.product.description.trim())
                .filter(|d| !d.is_empty())
                .map(str::to_string);

            Ok(CheckoutLineItem {
                name: line.product.title.clone(),
                description,
                unit_amount: line.product.price.to_minor_units()?,
                currency,
                quantity: line.quantity,
            })
        })
        .collect()
}

/// Open a checkout session for a resolved cart.
///
/// The cart is validated before the provider is called, so an empty cart
/// never reaches the gateway. Provider errors are returned as-is, without retry.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart`, `CheckoutError::Price` or
/// `CheckoutError::Payment`.
#[instrument(skip_all, fields(lines = cart.lines.len()))]
pub async fn create_checkout_session<G: PaymentGateway>(
    gateway: &G,
    cart: ResolvedCart,
    currency: CurrencyCode,
    success_url: String,
    cancel_url: String,
) -> Result<CheckoutSummary, CheckoutError> {
    let request = CheckoutSessionRequest {
        line_items: build_line_items(&cart, currency)?,
        success_url,
        cancel_url,
    };

    let session = gateway.create_checkout_session(&request).await?;
    tracing::info!(session_id = %session.id, "Checkout session created");

    let total = cart.total();
    Ok(CheckoutSummary {
        session,
        cart,
        total,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use rust_decimal::Decimal;

    use larder_core::{Cart, Product, ProductId};

    use super::*;

    #[derive(Default)]
    struct FakeGateway {
        requests: Mutex<Vec<CheckoutSessionRequest>>,
        fail: bool,
    }

    impl PaymentGateway for FakeGateway {
        async fn create_checkout_session(
            &self,
            request: &CheckoutSessionRequest,
        ) -> Result<CheckoutSession, PaymentError> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(PaymentError::Api {
                    status: 402,
                    message: "card_declined".to_string(),
                });
            }
            Ok(CheckoutSession {
                id: "cs_test_123".to_string(),
                url: Some("https://pay.test/cs_test_123".to_string()),
            })
        }
    }

    fn product(id: i32, price: &str, description: &str) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            price: Price::new(price.parse::<Decimal>().unwrap()).unwrap(),
            description: description.to_string(),
            image_url: String::new(),
        }
    }

    fn resolved_cart() -> ResolvedCart {
        let mut cart = Cart::new();
        cart.add(ProductId::new(1));
        cart.add(ProductId::new(1));
        cart.add(ProductId::new(2));
        cart.resolve(&[product(1, "10", "A book"), product(2, "5.25", "  ")])
    }

    #[test]
    fn test_line_items_use_minor_units() {
        let items = build_line_items(&resolved_cart(), CurrencyCode::USD).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].unit_amount, 1000);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].description.as_deref(), Some("A book"));
        assert_eq!(items[1].unit_amount, 525);
        assert_eq!(items[1].description, None);
    }

    #[test]
    fn test_line_items_sum_matches_total() {
        let cart = resolved_cart();
        let items = build_line_items(&cart, CurrencyCode::USD).unwrap();
        let minor_total: i64 = items
            .iter()
            .map(|i| i.unit_amount * i64::from(i.quantity))
            .sum();
        assert_eq!(minor_total, cart.total().to_minor_units().unwrap());
    }

    #[tokio::test]
    async fn test_create_session_passes_urls_and_total() {
        let gateway = FakeGateway::default();
        let summary = create_checkout_session(
            &gateway,
            resolved_cart(),
            CurrencyCode::USD,
            "http://shop.test/checkout/success".to_string(),
            "http://shop.test/checkout/cancel".to_string(),
        )
        .await
        .unwrap();

        assert_eq!(summary.session.id, "cs_test_123");
        assert_eq!(summary.total.to_string(), "$25.25");

        let requests = gateway.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].success_url, "http://shop.test/checkout/success");
        assert_eq!(requests[0].cancel_url, "http://shop.test/checkout/cancel");
    }

    #[tokio::test]
    async fn test_empty_cart_never_calls_gateway() {
        let gateway = FakeGateway::default();
        let result = create_checkout_session(
            &gateway,
            ResolvedCart::default(),
            CurrencyCode::USD,
            String::new(),
            String::new(),
        )
        .await;

        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
        assert!(gateway.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_provider_error_surfaces() {
        let gateway = FakeGateway {
            fail: true,
            ..FakeGateway::default()
        };
        let result = create_checkout_session(
            &gateway,
            resolved_cart(),
            CurrencyCode::USD,
            String::new(),
            String::new(),
        )
        .await;

        assert!(matches!(
            result,
            Err(CheckoutError::Payment(PaymentError::Api { status: 402, .. }))
        ));
        assert_eq!(gateway.requests.lock().unwrap().len(), 1);
    }
}
