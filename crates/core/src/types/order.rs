//! Order types.
//!
//! An [`Order`] is an immutable snapshot of a cart taken at placement time.
//! Product data is copied by value into each [`OrderItem`] so that later
//! catalog edits never change what a historical order (or its invoice) shows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cart::ResolvedCart;
use super::email::Email;
use super::id::{OrderId, ProductId, UserId};
use super::price::Price;
use super::product::Product;

/// Errors building an order.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("cannot place an order from an empty cart")]
    EmptyCart,
}

/// Product data as it was when the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub product_id: ProductId,
    pub title: String,
    pub price: Price,
    pub description: String,
    pub image_url: String,
}

impl From<&Product> for ProductSnapshot {
    fn from(product: &Product) -> Self {
        Self {
            product_id: product.id,
            title: product.title.clone(),
            price: product.price,
            description: product.description.clone(),
            image_url: product.image_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub quantity: u32,
    pub product: ProductSnapshot,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}

/// The customer an order belongs to, denormalized onto the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCustomer {
    pub user_id: UserId,
    pub name: String,
    pub email: Email,
}

/// An order that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer: OrderCustomer,
    pub items: Vec<OrderItem>,
}

impl NewOrder {
    /// Snapshot a resolved cart into an order.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::EmptyCart` if the cart has no resolvable lines.
    pub fn from_cart(customer: OrderCustomer, cart: &ResolvedCart) -> Result<Self, OrderError> {
        if cart.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let items = cart
            .lines
            .iter()
            .map(|line| OrderItem {
                quantity: line.quantity,
                product: ProductSnapshot::from(&line.product),
            })
            .collect();

        Ok(Self { customer, items })
    }

    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(OrderItem::line_total).sum()
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer: OrderCustomer,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(OrderItem::line_total).sum()
    }

    #[must_use]
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.customer.user_id == user_id
    }
}
