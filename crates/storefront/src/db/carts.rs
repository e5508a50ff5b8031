//! Cart persistence.
//!
//! Carts live in the `cart` JSONB column of `storefront.user`. Every mutation
//! is a read-modify-write inside a transaction that holds `FOR UPDATE` on the
//! user row, so concurrent mutations for one user are applied one at a time.

use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use larder_core::{Cart, Email, OrderCustomer, UserId};

use super::RepositoryError;

#[derive(sqlx::FromRow)]
struct CartRow {
    id: UserId,
    name: String,
    email: String,
    cart: Json<Cart>,
}

/// Lock the user row and return its owner details and cart.
///
/// Must be called inside a transaction; the lock is held until it ends.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the user does not exist.
pub async fn lock_customer_cart(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<(OrderCustomer, Cart), RepositoryError> {
    let row = sqlx::query_as::<_, CartRow>(
        r"
        SELECT id, name, email, cart
        FROM storefront.user
        WHERE id = $1
        FOR UPDATE
        ",
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(RepositoryError::NotFound)?;

    let email = Email::parse(&row.email).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
    })?;

    let customer = OrderCustomer {
        user_id: row.id,
        name: row.name,
        email,
    };
    Ok((customer, row.cart.0))
}

/// Overwrite a user's cart.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the user does not exist.
pub async fn store_cart(
    conn: &mut PgConnection,
    user_id: UserId,
    cart: &Cart,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE storefront.user
        SET cart = $2, updated_at = NOW()
        WHERE id = $1
        ",
    )
    .bind(user_id)
    .bind(Json(cart))
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

/// Repository for cart reads and locked mutations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Read a user's cart without locking.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn get(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let cart: Option<Json<Cart>> =
            sqlx::query_scalar("SELECT cart FROM storefront.user WHERE id = $1")
                .bind(user_id)
                .fetch_optional(self.pool)
                .await?;

        cart.map(|c| c.0).ok_or(RepositoryError::NotFound)
    }

    /// Apply `f` to the user's cart under a row lock and persist the result.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist, or
    /// `RepositoryError::Database` if any statement fails (nothing is written).
    pub async fn modify<F, T>(&self, user_id: UserId, f: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut Cart) -> T + Send,
        T: Send,
    {
        let mut tx = self.pool.begin().await?;

        let (_, mut cart) = lock_customer_cart(&mut *tx, user_id).await?;
        let output = f(&mut cart);
        store_cart(&mut *tx, user_id, &cart).await?;

        tx.commit().await?;
        Ok(output)
    }
}
