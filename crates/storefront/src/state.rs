//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::catalog::CatalogService;
use crate::services::email::EmailService;
use crate::services::invoice::InvoiceArchive;
use crate::stripe::StripeClient;

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("SMTP configuration error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Collaborators that talk to the
/// outside world are built once at startup and handed out from here.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    catalog: CatalogService,
    payments: StripeClient,
    email: EmailService,
    invoices: InvoiceArchive,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP relay cannot be configured.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, StateError> {
        let email = EmailService::new(config.email.as_ref(), &config.base_url)?;
        let payments = StripeClient::new(&config.stripe);
        Ok(Self::with_services(config, pool, payments, email))
    }

    /// Assemble state from already-built collaborators.
    #[must_use]
    pub fn with_services(
        config: StorefrontConfig,
        pool: PgPool,
        payments: StripeClient,
        email: EmailService,
    ) -> Self {
        let catalog = CatalogService::new(pool.clone(), config.page_size);
        let invoices = InvoiceArchive::new(config.invoice_dir.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog,
                payments,
                email,
                invoices,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Get a reference to the payment gateway.
    #[must_use]
    pub fn payments(&self) -> &StripeClient {
        &self.inner.payments
    }

    #[must_use]
    pub fn email(&self) -> &EmailService {
        &self.inner.email
    }

    /// Get a reference to the on-disk invoice archive.
    #[must_use]
    pub fn invoices(&self) -> &InvoiceArchive {
        &self.inner.invoices
    }
}
