//! Order placement and history.

use sqlx::PgPool;
use thiserror::Error;
use tracing::{instrument, warn};

use larder_core::{Cart, NewOrder, Order, OrderError, OrderId, UserId};

use crate::db::orders::insert_order;
use crate::db::products::select_by_ids;
use crate::db::{OrderRepository, RepositoryError, carts};

/// Errors from order operations.
#[derive(Debug, Error)]
pub enum OrdersError {
    /// Nothing in the cart resolves to a product.
    #[error("cart is empty")]
    EmptyCart,

    #[error("order {0} not found")]
    NotFound(OrderId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<OrderError> for OrdersError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::EmptyCart => Self::EmptyCart,
        }
    }
}

/// Order service bound to one request.
pub struct OrderService<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Snapshot the user's cart into an order and empty the cart.
    ///
    /// Runs in one transaction holding the user row lock: the order, its
    /// items and the cleared cart are committed together or not at all.
    ///
    /// # Errors
    ///
    /// Returns `OrdersError::EmptyCart` if no cart entry resolves to a product.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn place_order(&self, user_id: UserId) -> Result<Order, OrdersError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let (customer, cart) = carts::lock_customer_cart(&mut *tx, user_id).await?;
        let products = select_by_ids(&mut *tx, &cart.product_ids()).await?;
        let resolved = cart.resolve(&products);
        if !resolved.missing.is_empty() {
            warn!(missing = ?resolved.missing, "Dropping cart entries for products no longer in the catalog");
        }

        let new_order = NewOrder::from_cart(customer, &resolved)?;
        let order = insert_order(&mut *tx, &new_order).await?;
        carts::store_cart(&mut *tx, user_id, &Cart::new()).await?;

        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(order_id = %order.id, total = %order.total(), "Order placed");
        Ok(order)
    }

    /// All of a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrdersError::Repository` if a query fails.
    pub async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>, OrdersError> {
        Ok(OrderRepository::new(self.pool)
            .list_for_user(user_id)
            .await?)
    }

    /// Fetch one order.
    ///
    /// # Errors
    ///
    /// Returns `OrdersError::NotFound` if no order has this id.
    pub async fn get_order(&self, id: OrderId) -> Result<Order, OrdersError> {
        OrderRepository::new(self.pool)
            .get_by_id(id)
            .await?
            .ok_or(OrdersError::NotFound(id))
    }
}
