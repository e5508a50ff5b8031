//! Integration tests for the Larder storefront.
//!
//! These tests drive a running storefront over HTTP. They require:
//! - A migrated `PostgreSQL` database (`larder-cli migrate`)
//! - At least one product (`larder-cli seed products <file>`)
//! - The storefront server running (`cargo run -p larder-storefront`)
//!
//! Run with: `cargo test -p larder-integration-tests -- --ignored`
//!
//! Set `STOREFRONT_BASE_URL` to point at a server other than
//! `http://localhost:3000`.

use reqwest::{Client, redirect};

/// Base URL for the storefront (configurable via environment).
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Build a client with a cookie jar that does not follow redirects, so tests
/// can assert on `Location` headers.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialised.
pub fn client() -> reqwest::Result<Client> {
    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .build()
}

/// A fresh email address so repeated runs never collide.
#[must_use]
pub fn unique_email() -> String {
    format!("it-{}@example.com", uuid::Uuid::new_v4().simple())
}

/// Collect the numeric ids following `marker` in an HTML page, in order.
///
/// `ids_after(html, "href=\"/products/")` returns every product id linked
/// from a listing page.
#[must_use]
pub fn ids_after(html: &str, marker: &str) -> Vec<i64> {
    html.match_indices(marker)
        .filter_map(|(start, _)| {
            let rest = html.get(start + marker.len()..)?;
            let end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            rest.get(..end)?.parse().ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_after_extracts_numbers() {
        let html = r#"<a href="/products/12">A</a><a href="/products/7" class="btn">B</a><a href="/products/x">"#;
        assert_eq!(ids_after(html, "href=\"/products/"), vec![12, 7]);
    }

    #[test]
    fn test_unique_emails_differ() {
        assert_ne!(unique_email(), unique_email());
    }
}
