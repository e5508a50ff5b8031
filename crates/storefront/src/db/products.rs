//! Product catalog queries.

use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};

use larder_core::{NewProduct, PageRequest, Price, Product, ProductId};

use super::RepositoryError;

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    title: String,
    price: Decimal,
    description: String,
    image_url: String,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for product {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            title: row.title,
            price,
            description: row.description,
            image_url: row.image_url,
        })
    }
}

fn into_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
    rows.into_iter().map(Product::try_from).collect()
}

/// Fetch the products with the given ids, in id order. Unknown ids are skipped.
///
/// Generic over the executor so it can run inside a cart or order transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn select_by_ids<'e>(
    executor: impl PgExecutor<'e>,
    ids: &[ProductId],
) -> Result<Vec<Product>, RepositoryError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let raw_ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
    let rows = sqlx::query_as::<_, ProductRow>(
        r"
        SELECT id, title, price, description, image_url
        FROM storefront.product
        WHERE id = ANY($1)
        ORDER BY id
        ",
    )
    .bind(raw_ids)
    .fetch_all(executor)
    .await?;

    into_products(rows)
}

/// Repository for catalog reads and seeding.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of products ordered by id, plus the total product count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_page(
        &self,
        request: PageRequest,
    ) -> Result<(Vec<Product>, u64), RepositoryError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM storefront.product")
            .fetch_one(self.pool)
            .await?;

        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, title, price, description, image_url
            FROM storefront.product
            ORDER BY id
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(request.limit())
        .bind(request.offset())
        .fetch_all(self.pool)
        .await?;

        let total = u64::try_from(total).map_err(|_| {
            RepositoryError::DataCorruption(format!("negative product count {total}"))
        })?;

        Ok((into_products(rows)?, total))
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, title, price, description, image_url
            FROM storefront.product
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Get several products by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        select_by_ids(self.pool, ids).await
    }

    /// Insert a product (used by the seed command).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO storefront.product (title, price, description, image_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, price, description, image_url
            ",
        )
        .bind(&product.title)
        .bind(product.price.amount())
        .bind(&product.description)
        .bind(&product.image_url)
        .fetch_one(self.pool)
        .await?;

        Product::try_from(row)
    }
}
