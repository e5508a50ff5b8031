//! Product catalog service.
//!
//! Read-only listing and lookup. Single-product lookups are cached in-process
//! for a short time since the storefront never writes to the catalog.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, instrument};

use larder_core::{Page, PageRequest, Pagination, Product, ProductId};

use crate::db::{ProductRepository, RepositoryError};

const CACHE_CAPACITY: u64 = 1000;
const CACHE_TTL: Duration = Duration::from_secs(60);

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("product {0} not found")]
    NotFound(ProductId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Catalog access shared across handlers.
#[derive(Clone)]
pub struct CatalogService {
    inner: Arc<CatalogServiceInner>,
}

struct CatalogServiceInner {
    pool: PgPool,
    page_size: u32,
    cache: Cache<ProductId, Product>,
}

impl CatalogService {
    #[must_use]
    pub fn new(pool: PgPool, page_size: u32) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(CatalogServiceInner {
                pool,
                page_size,
                cache,
            }),
        }
    }

    /// One page of products ordered by id. A page past the end is empty.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, page: Option<u32>) -> Result<Page<Product>, CatalogError> {
        let request = PageRequest::new(page, self.inner.page_size);
        let (items, total) = ProductRepository::new(&self.inner.pool)
            .list_page(request)
            .await?;

        Ok(Page {
            items,
            pagination: Pagination::new(request, total),
        })
    }

    /// Look up a single product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no product has this id.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        if let Some(product) = self.inner.cache.get(&id).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let product = ProductRepository::new(&self.inner.pool)
            .get_by_id(id)
            .await?
            .ok_or(CatalogError::NotFound(id))?;

        self.inner.cache.insert(id, product.clone()).await;
        Ok(product)
    }

    /// Look up several products, skipping ids that do not exist.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, CatalogError> {
        Ok(ProductRepository::new(&self.inner.pool)
            .get_many(ids)
            .await?)
    }
}
