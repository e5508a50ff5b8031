//! Order persistence.
//!
//! Orders are written once and never updated. Item rows copy the product
//! fields by value so historical orders are unaffected by catalog edits.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use larder_core::{
    Email, NewOrder, Order, OrderCustomer, OrderId, OrderItem, Price, ProductId, ProductSnapshot,
    UserId,
};

use super::RepositoryError;

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    user_name: String,
    user_email: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    order_id: OrderId,
    quantity: i64,
    product_id: ProductId,
    title: String,
    price: Decimal,
    description: String,
    image_url: String,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "invalid quantity {} on order {}",
                row.quantity, row.order_id
            ))
        })?;
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price on order {}: {e}", row.order_id))
        })?;

        Ok(Self {
            quantity,
            product: ProductSnapshot {
                product_id: row.product_id,
                title: row.title,
                price,
                description: row.description,
                image_url: row.image_url,
            },
        })
    }
}

fn build_order(row: OrderRow, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
    let email = Email::parse(&row.user_email).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid email on order {}: {e}", row.id))
    })?;

    Ok(Order {
        id: row.id,
        customer: OrderCustomer {
            user_id: row.user_id,
            name: row.user_name,
            email,
        },
        items,
        created_at: row.created_at,
    })
}

/// Insert an order and its items on an existing connection.
///
/// Callers run this inside the same transaction that clears the cart.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if any insert fails.
pub async fn insert_order(
    conn: &mut PgConnection,
    order: &NewOrder,
) -> Result<Order, RepositoryError> {
    let (id, created_at): (OrderId, DateTime<Utc>) = sqlx::query_as(
        r"
        INSERT INTO storefront.order (user_id, user_name, user_email)
        VALUES ($1, $2, $3)
        RETURNING id, created_at
        ",
    )
    .bind(order.customer.user_id)
    .bind(&order.customer.name)
    .bind(order.customer.email.as_str())
    .fetch_one(&mut *conn)
    .await?;

    for (position, item) in (0_i32..).zip(&order.items) {
        sqlx::query(
            r"
            INSERT INTO storefront.order_item
                (order_id, position, quantity, product_id, title, price, description, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(id)
        .bind(position)
        .bind(i64::from(item.quantity))
        .bind(item.product.product_id)
        .bind(&item.product.title)
        .bind(item.product.price.amount())
        .bind(&item.product.description)
        .bind(&item.product.image_url)
        .execute(&mut *conn)
        .await?;
    }

    Ok(Order {
        id,
        customer: order.customer.clone(),
        items: order.items.clone(),
        created_at,
    })
}

/// Repository for reading placed orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All orders for a user, newest first, each with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, user_name, user_email, created_at
            FROM storefront.order
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<i32> = rows.iter().map(|r| r.id.as_i32()).collect();
        let mut items = self.items_for(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let order_items = items.remove(&row.id).unwrap_or_default();
                build_order(row, order_items)
            })
            .collect()
    }

    /// Get one order with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, user_name, user_email, created_at
            FROM storefront.order
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut items = self.items_for(&[id.as_i32()]).await?;
        let order_items = items.remove(&id).unwrap_or_default();
        build_order(row, order_items).map(Some)
    }

    async fn items_for(
        &self,
        order_ids: &[i32],
    ) -> Result<HashMap<OrderId, Vec<OrderItem>>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT order_id, quantity, product_id, title, price, description, image_url
            FROM storefront.order_item
            WHERE order_id = ANY($1)
            ORDER BY order_id, position
            ",
        )
        .bind(order_ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            let order_id = row.order_id;
            grouped
                .entry(order_id)
                .or_default()
                .push(OrderItem::try_from(row)?);
        }
        Ok(grouped)
    }
}
