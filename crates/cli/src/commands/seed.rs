//! Catalog seeding from YAML.
//!
//! # File Format
//!
//! ```yaml
//! - title: Smoked Paprika
//!   price: "4.50"
//!   description: Sweet and smoky, from La Vera.
//!   image_url: https://cdn.example.com/paprika.jpg
//! - title: Sea Salt Flakes
//!   price: "6.00"
//! ```
//!
//! Prices must be positive; `description` and `image_url` default to empty.

use std::path::Path;

use larder_core::NewProduct;
use larder_storefront::db::ProductRepository;

use super::{CommandError, database_url};

/// Parse a YAML list of products.
///
/// # Errors
///
/// Returns `CommandError::Yaml` if the document is not a list of valid products.
pub fn parse_products(yaml: &str) -> Result<Vec<NewProduct>, CommandError> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Insert every product in `path` and return how many were created.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or an insert fails.
/// Products inserted before a failing one are kept.
pub async fn products(path: &Path) -> Result<usize, CommandError> {
    let yaml = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CommandError::Io {
            path: path.display().to_string(),
            source,
        })?;
    let products = parse_products(&yaml)?;
    tracing::info!(count = products.len(), file = %path.display(), "Loaded seed file");

    let pool = larder_storefront::db::create_pool(&database_url()?).await?;
    let repo = ProductRepository::new(&pool);

    for product in &products {
        let created = repo.insert(product).await?;
        tracing::info!(product_id = %created.id, title = %created.title, "Inserted product");
    }

    Ok(products.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_products_with_defaults() {
        let yaml = r#"
- title: Smoked Paprika
  price: "4.50"
  description: Sweet and smoky.
  image_url: https://cdn.example.com/paprika.jpg
- title: Sea Salt Flakes
  price: "6"
"#;
        let products = parse_products(yaml).unwrap_or_default();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].title, "Smoked Paprika");
        assert_eq!(products[0].price.to_string(), "$4.50");
        assert_eq!(products[1].description, "");
        assert_eq!(products[1].image_url, "");
    }

    #[test]
    fn test_parse_rejects_missing_price() {
        assert!(matches!(
            parse_products("- title: Nothing"),
            Err(CommandError::Yaml(_))
        ));
    }
}
