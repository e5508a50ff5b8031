//! Integration tests for the signed-in purchase flow: signup, login, cart,
//! order placement and invoice download.
//!
//! These tests require a running storefront with a seeded catalog. See the
//! crate docs.

use larder_integration_tests::{client, ids_after, storefront_base_url, unique_email};
use reqwest::{Client, StatusCode, header};

const PASSWORD: &str = "correct horse battery";

/// Sign up a fresh account and log it in, leaving the session cookie in the
/// client's jar.
async fn signed_in_client() -> Client {
    let client = client().expect("Failed to create HTTP client");
    let base_url = storefront_base_url();
    let email = unique_email();

    let resp = client
        .post(format!("{base_url}/signup"))
        .form(&[
            ("name", "Integration Tester"),
            ("email", email.as_str()),
            ("password", PASSWORD),
            ("confirm_password", PASSWORD),
        ])
        .send()
        .await
        .expect("Failed to sign up");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[header::LOCATION], "/login");

    let resp = client
        .post(format!("{base_url}/login"))
        .form(&[("email", email.as_str()), ("password", PASSWORD)])
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[header::LOCATION], "/");

    client
}

async fn first_product_id(client: &Client) -> i64 {
    let body = client
        .get(format!("{}/products", storefront_base_url()))
        .send()
        .await
        .expect("Failed to get product list")
        .text()
        .await
        .expect("Failed to read response");
    ids_after(&body, "href=\"/products/")
        .first()
        .copied()
        .expect("No products listed; seed the catalog")
}

async fn cart_page(client: &Client) -> String {
    client
        .get(format!("{}/cart", storefront_base_url()))
        .send()
        .await
        .expect("Failed to get cart")
        .text()
        .await
        .expect("Failed to read response")
}

async fn add_to_cart(client: &Client, product_id: i64) {
    let resp = client
        .post(format!("{}/cart", storefront_base_url()))
        .form(&[("product_id", product_id.to_string())])
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded products"]
async fn test_wrong_password_rerenders_login() {
    let client = client().expect("Failed to create HTTP client");
    let base_url = storefront_base_url();

    let resp = client
        .post(format!("{base_url}/login"))
        .form(&[("email", unique_email().as_str()), ("password", PASSWORD)])
        .send()
        .await
        .expect("Failed to post login");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded products"]
async fn test_cart_add_remove_and_clear() {
    let client = signed_in_client().await;
    let base_url = storefront_base_url();
    let product_id = first_product_id(&client).await;

    add_to_cart(&client, product_id).await;
    add_to_cart(&client, product_id).await;

    let body = cart_page(&client).await;
    assert_eq!(ids_after(&body, "name=\"product_id\" value=\""), vec![product_id]);
    assert!(body.contains("Quantity: 2"));

    let resp = client
        .post(format!("{base_url}/cart/delete-item"))
        .form(&[("product_id", product_id.to_string())])
        .send()
        .await
        .expect("Failed to remove from cart");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let resp = client
        .post(format!("{base_url}/cart/clear"))
        .send()
        .await
        .expect("Failed to clear cart");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    // An empty cart cannot become an order.
    let resp = client
        .post(format!("{base_url}/create-order"))
        .send()
        .await
        .expect("Failed to post create-order");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded products"]
async fn test_concurrent_adds_are_not_lost() {
    const ADDS: usize = 20;

    let client = signed_in_client().await;
    let product_id = first_product_id(&client).await;

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..ADDS {
        let client = client.clone();
        tasks.spawn(async move { add_to_cart(&client, product_id).await });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.expect("add_to_cart task panicked");
    }

    let body = cart_page(&client).await;
    assert!(
        body.contains(&format!("Quantity: {ADDS}")),
        "expected quantity {ADDS} after concurrent adds"
    );
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded products"]
async fn test_order_and_invoice() {
    let client = signed_in_client().await;
    let base_url = storefront_base_url();
    let product_id = first_product_id(&client).await;

    add_to_cart(&client, product_id).await;

    let resp = client
        .post(format!("{base_url}/create-order"))
        .send()
        .await
        .expect("Failed to create order");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[header::LOCATION], "/orders");

    let body = client
        .get(format!("{base_url}/orders"))
        .send()
        .await
        .expect("Failed to list orders")
        .text()
        .await
        .expect("Failed to read response");
    let order_id = ids_after(&body, "href=\"/orders/")
        .first()
        .copied()
        .expect("Order missing from list");

    let resp = client
        .get(format!("{base_url}/orders/{order_id}/invoice"))
        .send()
        .await
        .expect("Failed to get invoice");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/pdf");
    let pdf = resp.bytes().await.expect("Failed to read invoice");
    assert!(pdf.starts_with(b"%PDF"));

    // Placing the order emptied the cart.
    let resp = client
        .post(format!("{base_url}/create-order"))
        .send()
        .await
        .expect("Failed to post create-order");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Another customer cannot read this invoice.
    let other = signed_in_client().await;
    let resp = other
        .get(format!("{base_url}/orders/{order_id}/invoice"))
        .send()
        .await
        .expect("Failed to get invoice");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
