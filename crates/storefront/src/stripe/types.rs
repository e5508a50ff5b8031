//! Stripe wire types.
//!
//! Stripe's API takes `application/x-www-form-urlencoded` bodies with
//! bracketed keys for nested fields (`line_items[0][price_data][currency]`).

use serde::Deserialize;

use crate::services::checkout::CheckoutSessionRequest;

/// Flatten a checkout request into Stripe's form encoding.
#[must_use]
pub fn checkout_session_form(request: &CheckoutSessionRequest) -> Vec<(String, String)> {
    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        ("payment_method_types[]".to_string(), "card".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
    ];

    for (i, item) in request.line_items.iter().enumerate() {
        let prefix = format!("line_items[{i}]");
        form.push((format!("{prefix}[quantity]"), item.quantity.to_string()));
        form.push((
            format!("{prefix}[price_data][currency]"),
            item.currency.as_gateway_str().to_string(),
        ));
        form.push((
            format!("{prefix}[price_data][unit_amount]"),
            item.unit_amount.to_string(),
        ));
        form.push((
            format!("{prefix}[price_data][product_data][name]"),
            item.name.clone(),
        ));
        if let Some(description) = &item.description {
            form.push((
                format!("{prefix}[price_data][product_data][description]"),
                description.clone(),
            ));
        }
    }

    form
}

/// The subset of a Stripe Checkout Session object we use.
#[derive(Debug, Deserialize)]
pub struct StripeCheckoutSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Stripe error envelope.
#[derive(Debug, Deserialize)]
pub struct StripeErrorResponse {
    pub error: StripeErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct StripeErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

impl StripeErrorBody {
    /// Human-readable summary for logs.
    #[must_use]
    pub fn summary(&self) -> String {
        let kind = self.kind.as_deref().unwrap_or("unknown_error");
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => format!("{kind}/{code}: {message}"),
            (None, Some(message)) => format!("{kind}: {message}"),
            (Some(code), None) => format!("{kind}/{code}"),
            (None, None) => kind.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use larder_core::CurrencyCode;

    use super::*;
    use crate::services::checkout::CheckoutLineItem;

    fn value<'a>(form: &'a [(String, String)], key: &str) -> Option<&'a str> {
        form.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_form_encoding() {
        let request = CheckoutSessionRequest {
            line_items: vec![
                CheckoutLineItem {
                    name: "Tea".to_string(),
                    description: Some("Loose leaf".to_string()),
                    unit_amount: 1250,
                    currency: CurrencyCode::USD,
                    quantity: 2,
                },
                CheckoutLineItem {
                    name: "Mug".to_string(),
                    description: None,
                    unit_amount: 800,
                    currency: CurrencyCode::USD,
                    quantity: 1,
                },
            ],
            success_url: "http://shop.test/checkout/success".to_string(),
            cancel_url: "http://shop.test/checkout/cancel".to_string(),
        };

        let form = checkout_session_form(&request);
        assert_eq!(value(&form, "mode"), Some("payment"));
        assert_eq!(value(&form, "payment_method_types[]"), Some("card"));
        assert_eq!(
            value(&form, "success_url"),
            Some("http://shop.test/checkout/success")
        );
        assert_eq!(value(&form, "line_items[0][quantity]"), Some("2"));
        assert_eq!(
            value(&form, "line_items[0][price_data][unit_amount]"),
            Some("1250")
        );
        assert_eq!(
            value(&form, "line_items[0][price_data][currency]"),
            Some("usd")
        );
        assert_eq!(
            value(&form, "line_items[0][price_data][product_data][description]"),
            Some("Loose leaf")
        );
        assert_eq!(
            value(&form, "line_items[1][price_data][product_data][name]"),
            Some("Mug")
        );
        assert_eq!(
            value(&form, "line_items[1][price_data][product_data][description]"),
            None
        );
    }

    #[test]
    fn test_parse_session_and_error() {
        let session: StripeCheckoutSession =
            serde_json::from_str(r#"{"id":"cs_1","object":"checkout.session","url":null}"#)
                .unwrap();
        assert_eq!(session.id, "cs_1");
        assert!(session.url.is_none());

        let err: StripeErrorResponse = serde_json::from_str(
            r#"{"error":{"type":"invalid_request_error","code":"parameter_missing","message":"Missing line_items"}}"#,
        )
        .unwrap();
        assert_eq!(
            err.error.summary(),
            "invalid_request_error/parameter_missing: Missing line_items"
        );
    }
}
