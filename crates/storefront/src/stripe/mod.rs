//! Stripe Checkout client.
//!
//! Implements [`PaymentGateway`] by posting form-encoded requests to
//! `POST /v1/checkout/sessions`, authenticated with the secret key.

pub mod types;

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use crate::config::StripeConfig;
use crate::services::checkout::{
    CheckoutSession, CheckoutSessionRequest, PaymentError, PaymentGateway,
};
use types::{StripeCheckoutSession, StripeErrorResponse, checkout_session_form};

/// Client for the Stripe API.
#[derive(Clone)]
pub struct StripeClient {
    inner: Arc<StripeClientInner>,
}

struct StripeClientInner {
    client: reqwest::Client,
    api_base: String,
    secret_key: SecretString,
}

impl StripeClient {
    /// Create a new Stripe client.
    #[must_use]
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            inner: Arc::new(StripeClientInner {
                client: reqwest::Client::new(),
                api_base: config.api_base.clone(),
                secret_key: config.secret_key.clone(),
            }),
        }
    }
}

impl PaymentGateway for StripeClient {
    #[instrument(skip_all, fields(line_items = request.line_items.len()))]
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let url = format!("{}/checkout/sessions", self.inner.api_base);

        let response = self
            .inner
            .client
            .post(&url)
            .bearer_auth(self.inner.secret_key.expose_secret())
            .form(&checkout_session_form(request))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<StripeErrorResponse>(&body).map_or_else(
                |_| body.chars().take(200).collect::<String>(),
                |e| e.error.summary(),
            );
            tracing::error!(status = %status, message = %message, "Stripe returned non-success status");
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let session: StripeCheckoutSession = serde_json::from_str(&body)
            .map_err(|e| PaymentError::InvalidResponse(e.to_string()))?;

        Ok(CheckoutSession {
            id: session.id,
            url: session.url,
        })
    }
}
