//! Catalog reads and order history.

#![allow(clippy::unwrap_used)]

use emporium_core::{Money, OrderId, OrderStatus, ProductId};
use emporium_integration_tests::{FakeBackend, SHOPPER_EMAIL, Shopper, other_shopper, shopper};
use emporium_storefront::api::ProductFilter;
use emporium_storefront::{ApiClient, ApiError, CatalogApi, CheckoutCoordinator, OrderApi};

/// Log in with a seeded cart and place one order from it.
async fn ordered(
    backend: &FakeBackend,
    rows: &[(&str, Option<&str>, i64)],
) -> (ApiClient, OrderId) {
    backend.seed_cart(SHOPPER_EMAIL, rows);
    let Shopper {
        client, mut store, ..
    } = backend.login(&shopper()).await;
    let order_id = CheckoutCoordinator::new()
        .place_order(&client, &mut store)
        .await
        .unwrap();
    (client, order_id)
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_catalog_lists_and_filters() {
    let backend = FakeBackend::start().await;
    let client = backend.client();

    let products = client.list_products().await.unwrap();
    assert_eq!(products.len(), 3);

    let shoes = ProductFilter::default().category("shoes").apply(products.clone());
    assert_eq!(shoes.len(), 1);
    assert_eq!(shoes.first().unwrap().name, "Trail Runner");

    let totes = ProductFilter::default().search("TOTE").apply(products);
    assert_eq!(totes.first().unwrap().price.to_string(), "₹799.50");
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let backend = FakeBackend::start().await;

    let err = backend
        .client()
        .get_product(&ProductId::new("p-missing"))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::NotFound(ref m) if m == "Product not found"));
}

// =============================================================================
// Orders
// =============================================================================

#[tokio::test]
async fn test_orders_require_a_session() {
    let backend = FakeBackend::start().await;

    let err = backend.client().list_orders().await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized(_)));
}

#[tokio::test]
async fn test_order_history_newest_first() {
    let backend = FakeBackend::start().await;
    let (client, first) = ordered(&backend, &[("p-tee", Some("S"), 1)]).await;
    backend.seed_cart(SHOPPER_EMAIL, &[("p-runner", Some("10"), 2)]);
    let second = client.place_order().await.unwrap();

    let orders = client.list_orders().await.unwrap();

    let ids: Vec<&OrderId> = orders.iter().map(|o| &o.id).collect();
    assert_eq!(ids, vec![&second, &first]);
    let latest = orders.first().unwrap();
    assert_eq!(latest.status, OrderStatus::Pending);
    assert_eq!(latest.total_amount, Money::from_whole(5000));
    assert_eq!(latest.items.first().unwrap().size.as_deref(), Some("10"));
}

#[tokio::test]
async fn test_orders_are_private_to_their_owner() {
    let backend = FakeBackend::start().await;
    let (_, order_id) = ordered(&backend, &[("p-tee", Some("S"), 1)]).await;
    let other = backend.login(&other_shopper()).await;

    let err = other.client.get_order(&order_id).await.unwrap_err();

    assert!(matches!(err, ApiError::NotFound(_)));
    assert!(other.client.list_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cancel_restores_stock() {
    let backend = FakeBackend::start().await;
    let (client, order_id) = ordered(&backend, &[("p-runner", Some("9"), 2)]).await;
    assert_eq!(backend.stock("p-runner", Some("9")), 0);

    client.cancel_order(&order_id).await.unwrap();

    let order = client.get_order(&order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(backend.stock("p-runner", Some("9")), 2);

    let again = client.cancel_order(&order_id).await.unwrap_err();
    assert_eq!(again.server_message(), Some("Order cannot be cancelled"));
}

#[tokio::test]
async fn test_delivered_orders_cannot_be_cancelled() {
    let backend = FakeBackend::start().await;
    let (client, order_id) = ordered(&backend, &[("p-tote", None, 1)]).await;
    backend.set_order_status(order_id.as_str(), OrderStatus::Delivered);

    let err = client.cancel_order(&order_id).await.unwrap_err();

    assert!(matches!(err, ApiError::Rejected { status: 400, .. }));
    assert_eq!(backend.stock("p-tote", None), 2);
}
