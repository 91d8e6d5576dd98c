//! Cart store against the mock gateway: every mutation reconciles with the
//! server cart.

use assert_matches::assert_matches;
use bakery_client::cart::join_lines;
use bakery_client::{ApiError, CartLine};
use bakery_core::{CartItemId, ProductId, QuantityError};
use bakery_integration_tests::MockBackend;
use reqwest::StatusCode;

/// The server cart of `username` joined with the server catalog.
async fn server_view(backend: &MockBackend, username: &str) -> Vec<CartLine> {
    let products = backend
        .storefront()
        .catalog()
        .list()
        .await
        .expect("product list");
    join_lines(backend.cart_of(username), &products)
}

#[tokio::test]
async fn test_add_item_anonymous_makes_no_request() {
    let backend = MockBackend::start().await;
    let app = backend.storefront();

    let result = app.cart().add_item(ProductId::new(1)).await;

    assert_matches!(result, Err(ApiError::NotAuthenticated));
    assert_eq!(backend.request_count(), 0);
    assert!(app.cart().snapshot().items.is_empty());
}

#[tokio::test]
async fn test_add_item_twice_merges_on_server() {
    let backend = MockBackend::start().await;
    let app = backend.logged_in("alice", "pw").await;

    app.cart().add_item(ProductId::new(1)).await.expect("first add");
    app.cart().add_item(ProductId::new(1)).await.expect("second add");

    let cart = app.cart().snapshot();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].name(), "Croissant");
    assert_eq!(cart.items[0].quantity().get(), 2);
    assert!(!cart.is_loading);
    assert_eq!(cart.items, server_view(&backend, "alice").await);
    assert_eq!(
        backend.requests()[..3],
        ["POST /cart/add", "GET /cart", "GET /product/list"]
    );
}

#[tokio::test]
async fn test_remove_item_drops_line() {
    let backend = MockBackend::start().await;
    backend.seed_cart_item(7, "alice", 2, 1);
    backend.seed_cart_item(8, "alice", 1, 3);
    let app = backend.logged_in("alice", "pw").await;
    app.cart().fetch_cart().await.expect("fetch");
    assert!(app.cart().snapshot().contains(CartItemId::new(7)));

    app.cart()
        .remove_item(CartItemId::new(7))
        .await
        .expect("remove");

    let cart = app.cart().snapshot();
    assert!(!cart.contains(CartItemId::new(7)));
    assert!(cart.contains(CartItemId::new(8)));
    assert!(backend.requests().contains(&"DELETE /cart/delete/7".to_string()));
    assert_eq!(cart.items, server_view(&backend, "alice").await);
}

#[tokio::test]
async fn test_update_quantity_below_one_makes_no_request() {
    let backend = MockBackend::start().await;
    backend.seed_cart_item(7, "alice", 2, 2);
    let app = backend.logged_in("alice", "pw").await;
    app.cart().fetch_cart().await.expect("fetch");
    backend.reset_requests();

    for target in [0, -1] {
        let result = app
            .cart()
            .update_quantity(CartItemId::new(7), ProductId::new(2), target)
            .await;
        assert_matches!(result, Err(ApiError::InvalidQuantity(QuantityError::BelowOne(_))));
    }

    assert_eq!(backend.request_count(), 0);
    assert_eq!(app.cart().snapshot().items[0].quantity().get(), 2);
}

#[tokio::test]
async fn test_update_quantity_sets_target() {
    let backend = MockBackend::start().await;
    backend.seed_cart_item(7, "alice", 2, 1);
    let app = backend.logged_in("alice", "pw").await;

    app.cart()
        .update_quantity(CartItemId::new(7), ProductId::new(2), 3)
        .await
        .expect("update");

    let cart = app.cart().snapshot();
    assert_eq!(cart.items[0].quantity().get(), 3);
    assert_eq!(cart.total().to_string(), "6.60");
    assert_eq!(backend.cart_of("alice")[0].quantity.get(), 3);
}

#[tokio::test]
async fn test_reconcile_keeps_lines_for_missing_products() {
    let backend = MockBackend::start().await;
    backend.seed_cart_item(7, "alice", 3, 1);
    backend.seed_cart_item(8, "alice", 1, 2);
    backend.remove_product(3);
    let app = backend.logged_in("alice", "pw").await;

    app.cart().reconcile().await.expect("reconcile");

    let cart = app.cart().snapshot();
    assert_eq!(cart.items.len(), 2);
    assert!(cart.items[0].product.is_none());
    assert_eq!(cart.items[0].name(), "Product #3");
    assert_eq!(cart.total().to_string(), "3.00");
    assert_eq!(cart.item_count(), 3);
}

#[tokio::test]
async fn test_item_count_of_huge_quantities() {
    let backend = MockBackend::start().await;
    backend.seed_cart_item(7, "alice", 1, u32::MAX);
    backend.seed_cart_item(8, "alice", 2, 2);
    let app = backend.logged_in("alice", "pw").await;

    app.cart().fetch_cart().await.expect("fetch");

    assert_eq!(app.cart().snapshot().item_count(), 4_294_967_297);
}

#[tokio::test]
async fn test_clear_cart_empties_server_cart() {
    let backend = MockBackend::start().await;
    for id in 7..10 {
        backend.seed_cart_item(id, "alice", 1, 1);
    }
    let app = backend.logged_in("alice", "pw").await;

    app.cart().clear_cart().await.expect("clear");

    assert!(app.cart().snapshot().items.is_empty());
    assert!(backend.cart_of("alice").is_empty());
}

#[tokio::test]
async fn test_clear_cart_partial_failure_shows_what_is_left() {
    let backend = MockBackend::start().await;
    for id in 7..10 {
        backend.seed_cart_item(id, "alice", 2, 1);
    }
    backend.fail_cart_deletes_after(1);
    let app = backend.logged_in("alice", "pw").await;

    let result = app.cart().clear_cart().await;

    assert_matches!(
        result,
        Err(ApiError::Rejected { status, ref message })
            if status == StatusCode::INTERNAL_SERVER_ERROR && message == "Cart service unavailable"
    );
    let cart = app.cart().snapshot();
    assert_eq!(cart.items.len(), 2);
    assert_eq!(cart.items, server_view(&backend, "alice").await);
    assert!(app.session().is_authenticated());
}

#[tokio::test]
async fn test_fetch_cart_anonymous_is_empty() {
    let backend = MockBackend::start().await;
    let app = backend.storefront();

    app.cart().fetch_cart().await.expect("fetch");

    assert!(app.cart().snapshot().items.is_empty());
    assert_eq!(backend.request_count(), 0);
}
