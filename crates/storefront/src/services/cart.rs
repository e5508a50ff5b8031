//! Cart operations for the logged-in user.

use sqlx::PgPool;
use thiserror::Error;
use tracing::{instrument, warn};

use larder_core::{ProductId, ResolvedCart, UserId};

use super::catalog::{CatalogError, CatalogService};
use crate::db::{CartRepository, RepositoryError};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The product to add does not exist.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The cart owner no longer exists.
    #[error("user not found")]
    UserNotFound,

    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for CartError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::UserNotFound,
            other => Self::Repository(other),
        }
    }
}

impl From<CatalogError> for CartError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(id) => Self::ProductNotFound(id),
            CatalogError::Repository(e) => Self::Repository(e),
        }
    }
}

/// Cart service bound to one request.
pub struct CartService<'a> {
    carts: CartRepository<'a>,
    catalog: &'a CatalogService,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, catalog: &'a CatalogService) -> Self {
        Self {
            carts: CartRepository::new(pool),
            catalog,
        }
    }

    /// Add one unit of a product, returning its new quantity in the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` if the product does not exist.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn add_to_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<u32, CartError> {
        self.catalog.get_product(product_id).await?;
        let quantity = self.carts.modify(user_id, |cart| cart.add(product_id)).await?;
        tracing::info!(quantity, "Added product to cart");
        Ok(quantity)
    }

    /// Remove a product entirely. Removing an absent product is not an error.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if persistence fails.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn remove_from_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, CartError> {
        let removed = self
            .carts
            .modify(user_id, |cart| cart.remove(product_id))
            .await?;
        Ok(removed)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if persistence fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn clear_cart(&self, user_id: UserId) -> Result<(), CartError> {
        self.carts.modify(user_id, |cart| cart.clear()).await?;
        Ok(())
    }

    /// The cart joined with current product details. Entries whose product
    /// has left the catalog are skipped.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if a query fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_cart(&self, user_id: UserId) -> Result<ResolvedCart, CartError> {
        let cart = self.carts.get(user_id).await?;
        let products = self.catalog.get_products(&cart.product_ids()).await?;
        let resolved = cart.resolve(&products);

        if !resolved.missing.is_empty() {
            warn!(missing = ?resolved.missing, "Cart references products no longer in the catalog");
        }
        Ok(resolved)
    }
}
