//! A 401 from any endpoint clears the session and sends the user to login;
//! other failures leave the session alone.

use std::sync::Arc;

use assert_matches::assert_matches;
use bakery_client::cookies::ACCESS_TOKEN_COOKIE;
use bakery_client::session::{MemorySessionCache, SessionCache};
use bakery_client::{ApiError, ErrorKind, Route, SessionStatus, Storefront};
use bakery_core::{CartItemId, ProductId};
use bakery_integration_tests::MockBackend;
use reqwest::StatusCode;

fn assert_logged_out(app: &Storefront) {
    let state = app.session().snapshot();
    assert!(!state.authenticated);
    assert!(state.user.is_none());
    assert_eq!(state.status, SessionStatus::Unauthenticated);
    assert!(app.gateway().cookies().get(ACCESS_TOKEN_COOKIE).is_none());
    assert_eq!(app.navigator().current(), Route::Login);
}

#[tokio::test]
async fn test_expired_session_on_cart_fetch() {
    let backend = MockBackend::start().await;
    let cache = Arc::new(MemorySessionCache::new());
    let app = backend.storefront_with_cache(cache.clone());
    app.session()
        .login("alice", &"pw".to_string().into())
        .await
        .expect("login");
    app.navigator().navigate(Route::Cart);
    backend.expire_sessions();

    let result = app.cart().fetch_cart().await;

    assert_matches!(result, Err(ApiError::Unauthorized));
    assert_logged_out(&app);
    assert!(app.cart().snapshot().items.is_empty());
    assert!(cache.load().expect("cache readable").is_none());
}

#[tokio::test]
async fn test_expired_session_on_any_endpoint() {
    let backend = MockBackend::start().await;

    let app = backend.logged_in("alice", "pw").await;
    backend.expire_sessions();
    assert_matches!(app.orders().list().await, Err(ApiError::Unauthorized));
    assert_logged_out(&app);

    let app = backend.logged_in("alice", "pw").await;
    backend.expire_sessions();
    assert_matches!(
        app.cart()
            .update_quantity(CartItemId::new(1), ProductId::new(1), 2)
            .await,
        Err(ApiError::Unauthorized)
    );
    assert_logged_out(&app);

    let app = backend.logged_in("root", "admin-pw").await;
    backend.expire_sessions();
    assert_matches!(app.warehouse().warehouses().await, Err(ApiError::Unauthorized));
    assert_logged_out(&app);

    let app = backend.logged_in("root", "admin-pw").await;
    backend.expire_sessions();
    assert_matches!(app.staff().couriers().await, Err(ApiError::Unauthorized));
    assert_logged_out(&app);
}

#[tokio::test]
async fn test_forbidden_keeps_session() {
    let backend = MockBackend::start().await;
    let app = backend.logged_in("alice", "pw").await;
    app.navigator().navigate(Route::Orders);

    let result = app.warehouse().warehouses().await;

    let error = result.expect_err("clients cannot list warehouses");
    assert_eq!(error.kind(), ErrorKind::Validation);
    assert_eq!(error.status(), Some(StatusCode::FORBIDDEN));
    assert_eq!(error.user_message(), "Not enough permissions");
    assert!(app.session().is_authenticated());
    assert_eq!(app.navigator().current(), Route::Orders);
}

#[tokio::test]
async fn test_transport_failure_keeps_session() {
    let backend = MockBackend::start().await;
    let cache: Arc<dyn SessionCache> = Arc::new(MemorySessionCache::new());
    let app = backend.storefront_with_cache(cache.clone());
    app.session()
        .login("alice", &"pw".to_string().into())
        .await
        .expect("login");
    app.navigator().navigate(Route::Cart);
    backend.shutdown().await;

    let result = app.orders().list().await;

    let error = result.expect_err("backend is down");
    assert_matches!(error, ApiError::Transport(_));
    assert_eq!(error.kind(), ErrorKind::Transport);
    assert!(app.session().is_authenticated());
    assert!(app.gateway().cookies().get(ACCESS_TOKEN_COOKIE).is_some());
    assert_eq!(app.navigator().current(), Route::Cart);
    assert!(cache.load().expect("cache readable").is_some());
}
