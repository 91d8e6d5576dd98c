//! Admin console services against the mock gateway.

use assert_matches::assert_matches;
use bakery_client::cookies::ACCESS_TOKEN_COOKIE;
use bakery_client::models::{
    BinInput, NewProduct, NewShipment, Registration, ShipmentStatusUpdate, StorageRuleInput,
    WarehouseInput, WmsItem, WmsShortage,
};
use bakery_client::ApiError;
use bakery_core::{
    Email, OrderId, Price, ProductId, Quantity, ShipmentStatus, UserId, UserRole, WarehouseId,
};
use bakery_integration_tests::MockBackend;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};

fn item(product_id: i32, quantity: u32) -> WmsItem {
    WmsItem {
        product_id: ProductId::new(product_id),
        quantity: Quantity::new(quantity).expect("positive quantity"),
    }
}

fn new_product(name: &str) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        short_description: "Sweet".to_string(),
        full_description: "Sweet bun with raisins".to_string(),
        composition: "flour, raisins".to_string(),
        weight: 120.0,
        price: Price::from_cents(95),
        photo: "bun.jpg".to_string(),
        storage_rule_id: None,
    }
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_catalog_add_and_verify_name() {
    let backend = MockBackend::start().await;
    let app = backend.logged_in("root", "admin-pw").await;

    let before = app.catalog().verify_name("Raisin bun").await.expect("verify");
    assert!(!before.exists);

    app.catalog()
        .add(&new_product("Raisin bun"))
        .await
        .expect("add");

    let after = app.catalog().verify_name("Raisin bun").await.expect("verify");
    assert!(after.exists);
    assert_eq!(after.name.as_deref(), Some("Raisin bun"));
    let id = after.id.expect("id of existing product");
    let product = app.catalog().info(id).await.expect("info");
    assert_eq!(product.price, Price::from_cents(95));
}

#[tokio::test]
async fn test_catalog_duplicate_name_message_is_verbatim() {
    let backend = MockBackend::start().await;
    let app = backend.logged_in("root", "admin-pw").await;

    let result = app.catalog().add(&new_product("Croissant")).await;

    assert_matches!(
        result,
        Err(ApiError::Rejected { status, ref message })
            if status == StatusCode::BAD_REQUEST && message == "Product with this name already exists"
    );
}

#[tokio::test]
async fn test_catalog_update_and_missing_product() {
    let backend = MockBackend::start().await;
    let app = backend.logged_in("root", "admin-pw").await;

    let mut changed = new_product("Croissant");
    changed.price = Price::from_cents(175);
    app.catalog()
        .update(ProductId::new(1), &changed)
        .await
        .expect("update");
    let product = app.catalog().info(ProductId::new(1)).await.expect("info");
    assert_eq!(product.price, Price::from_cents(175));

    let missing = app.catalog().info(ProductId::new(404)).await;
    assert_matches!(missing, Err(ApiError::Rejected { status, .. }) if status == StatusCode::NOT_FOUND);
    assert!(app.session().is_authenticated());
}

// =============================================================================
// Warehouse
// =============================================================================

#[tokio::test]
async fn test_warehouse_lifecycle() {
    let backend = MockBackend::start().await;
    let app = backend.logged_in("wendy", "stock").await;

    let created = app
        .warehouse()
        .create_warehouse(&WarehouseInput {
            name: "North".to_string(),
            address: "2 Frost Lane".to_string(),
            working_hours: None,
        })
        .await
        .expect("create");
    assert_eq!(app.warehouse().warehouses().await.expect("list").len(), 2);

    let updated = app
        .warehouse()
        .update_warehouse(
            created.id,
            &WarehouseInput {
                name: "North depot".to_string(),
                address: "2 Frost Lane".to_string(),
                working_hours: Some("08:00-18:00".to_string()),
            },
        )
        .await
        .expect("update");
    assert_eq!(updated.name, "North depot");

    app.warehouse()
        .delete_warehouse(created.id)
        .await
        .expect("delete");
    let names: Vec<String> = app
        .warehouse()
        .warehouses()
        .await
        .expect("list")
        .into_iter()
        .map(|w| w.name)
        .collect();
    assert_eq!(names, ["Central"]);
}

#[tokio::test]
async fn test_delete_warehouse_with_bins_is_rejected() {
    let backend = MockBackend::start().await;
    let app = backend.logged_in("root", "admin-pw").await;

    let result = app.warehouse().delete_warehouse(WarehouseId::new(1)).await;

    assert_matches!(
        result,
        Err(ApiError::Rejected { status, ref message })
            if status == StatusCode::CONFLICT && message == "Warehouse still has bins"
    );
}

#[tokio::test]
async fn test_bins_filtered_by_warehouse() {
    let backend = MockBackend::start().await;
    let app = backend.logged_in("root", "admin-pw").await;

    let north = app
        .warehouse()
        .create_warehouse(&WarehouseInput {
            name: "North".to_string(),
            address: "2 Frost Lane".to_string(),
            working_hours: None,
        })
        .await
        .expect("create warehouse");
    let bin = app
        .warehouse()
        .create_bin(&BinInput {
            warehouse_id: north.id,
            zone: "B".to_string(),
            aisle: "2".to_string(),
            rack: "1".to_string(),
            bin_code: "B-01".to_string(),
            storage_rule_id: None,
            product_id: Some(ProductId::new(3)),
            quantity: Some(12),
        })
        .await
        .expect("create bin");

    let all = app.warehouse().bins(None).await.expect("all bins");
    let north_bins = app.warehouse().bins(Some(north.id)).await.expect("north bins");
    assert_eq!(all.len(), 4);
    assert_eq!(north_bins, [bin.clone()]);
    assert!(backend
        .requests()
        .iter()
        .any(|r| r == "GET /warehouse/locations/bins"));

    app.warehouse().delete_bin(bin.id).await.expect("delete bin");
    assert!(app.warehouse().bins(Some(north.id)).await.expect("bins").is_empty());
}

#[tokio::test]
async fn test_storage_rules() {
    let backend = MockBackend::start().await;
    let app = backend.logged_in("root", "admin-pw").await;

    let rule = app
        .warehouse()
        .create_storage_rule(&StorageRuleInput {
            name: "Frozen".to_string(),
            description: None,
            is_hazardous: false,
            is_oversized: false,
            temp_min: Some(-25.0),
            temp_max: Some(-18.0),
        })
        .await
        .expect("create rule");
    assert_eq!(rule.temp_max, Some(-18.0));
    assert_eq!(app.warehouse().storage_rules().await.expect("rules").len(), 2);

    app.warehouse()
        .delete_storage_rule(rule.id)
        .await
        .expect("delete rule");
    let rules = app.warehouse().storage_rules().await.expect("rules");
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].name, "Dry");
}

#[tokio::test]
async fn test_wms_check_reports_shortages() {
    let backend = MockBackend::start().await;
    let app = backend.logged_in("wendy", "stock").await;

    let ok = app
        .warehouse()
        .check_stock(&[item(1, 10), item(2, 5)])
        .await
        .expect("check");
    assert!(ok.ok);
    assert!(ok.shortages.is_empty());

    let short = app
        .warehouse()
        .check_stock(&[item(1, 10), item(2, 6)])
        .await
        .expect("check");
    assert!(!short.ok);
    assert_eq!(
        short.shortages,
        [WmsShortage {
            product_id: ProductId::new(2),
            requested: 6,
            available: 5,
        }]
    );
}

#[tokio::test]
async fn test_wms_commit_deducts_stock() {
    let backend = MockBackend::start().await;
    let app = backend.logged_in("wendy", "stock").await;

    let committed = app
        .warehouse()
        .commit_stock(&[item(1, 20)])
        .await
        .expect("commit");
    assert!(committed.ok);
    assert_eq!(committed.items[0].deducted, 20);
    assert_eq!(committed.items[0].allocations[0].bin_id.as_i32(), 1);

    let after = app
        .warehouse()
        .check_stock(&[item(1, 31)])
        .await
        .expect("check");
    assert_eq!(after.shortages[0].available, 30);

    let refused = app
        .warehouse()
        .commit_stock(&[item(2, 50)])
        .await
        .expect("commit");
    assert!(!refused.ok);
    assert!(refused.items.is_empty());
}

// =============================================================================
// Shipping
// =============================================================================

#[tokio::test]
async fn test_shipment_lifecycle() {
    let backend = MockBackend::start().await;
    let app = backend.logged_in("root", "admin-pw").await;

    let shipment = app
        .shipping()
        .create(&NewShipment {
            order_id: OrderId::new(100),
            user_id: UserId::new(1),
            address: "5 Baker Street".to_string(),
            courier_id: None,
            items: vec![item(2, 1)],
        })
        .await
        .expect("create");
    assert_eq!(shipment.status, ShipmentStatus::Created);

    let couriers = app.staff().couriers().await.expect("couriers");
    assert_eq!(couriers.len(), 1);
    app.shipping()
        .update_status(
            &shipment.tracking_code,
            &ShipmentStatusUpdate {
                status: ShipmentStatus::InTransit,
                courier_id: Some(couriers[0].id),
            },
        )
        .await
        .expect("update status");

    let in_transit = app
        .shipping()
        .list(Some(ShipmentStatus::InTransit))
        .await
        .expect("list");
    assert_eq!(in_transit.len(), 1);
    assert_eq!(in_transit[0].courier_id, Some(UserId::new(3)));
    assert_eq!(app.shipping().list(None).await.expect("list").len(), 2);
}

#[tokio::test]
async fn test_shipment_unknown_tracking_code() {
    let backend = MockBackend::start().await;
    let app = backend.logged_in("root", "admin-pw").await;

    let result = app
        .shipping()
        .update_status(
            "TRK-9999",
            &ShipmentStatusUpdate {
                status: ShipmentStatus::Delivered,
                courier_id: None,
            },
        )
        .await;

    assert_matches!(
        result,
        Err(ApiError::Rejected { status, ref message })
            if status == StatusCode::NOT_FOUND && message == "Shipment not found"
    );
}

#[tokio::test]
async fn test_shipment_tracking_code_with_slash_is_one_segment() {
    let backend = MockBackend::start().await;
    let app = backend.logged_in("root", "admin-pw").await;

    let result = app
        .shipping()
        .update_status(
            "TRK/0001",
            &ShipmentStatusUpdate {
                status: ShipmentStatus::Delivered,
                courier_id: None,
            },
        )
        .await;

    assert_matches!(
        result,
        Err(ApiError::Rejected { status, .. }) if status == StatusCode::NOT_FOUND
    );
    assert_eq!(backend.requests(), ["PATCH /shipping/TRK%2F0001/status"]);
}

#[tokio::test]
async fn test_verify_name_with_slash() {
    let backend = MockBackend::start().await;
    let app = backend.logged_in("root", "admin-pw").await;

    let check = app.catalog().verify_name(" Rye/wheat ").await.expect("verify");

    assert!(!check.exists);
    assert_eq!(backend.requests(), ["GET /product/verify/Rye%2Fwheat"]);
}

// =============================================================================
// Staff and orders
// =============================================================================

#[tokio::test]
async fn test_staff_list_excludes_clients() {
    let backend = MockBackend::start().await;
    let app = backend.logged_in("root", "admin-pw").await;

    let staff = app.staff().list().await.expect("staff");

    assert_eq!(staff.len(), 3);
    assert!(staff.iter().all(|s| s.user_role != UserRole::Client));
}

#[tokio::test]
async fn test_staff_create_keeps_callers_session() {
    let backend = MockBackend::start().await;
    let app = backend.logged_in("root", "admin-pw").await;
    let own_token = app
        .gateway()
        .cookies()
        .get(ACCESS_TOKEN_COOKIE)
        .map(|t| t.expose_secret().to_string());

    app.staff()
        .create(&Registration {
            username: "dora".to_string(),
            email: Email::parse("dora@bakery.example").expect("valid email"),
            password: SecretString::from("dr1ver-pw"),
            first_name: "Dora".to_string(),
            last_name: "Wheel".to_string(),
            user_role: Some(UserRole::Courier),
        })
        .await
        .expect("create staff");

    let token = app
        .gateway()
        .cookies()
        .get(ACCESS_TOKEN_COOKIE)
        .map(|t| t.expose_secret().to_string());
    assert_eq!(token, own_token);
    assert_eq!(
        app.session().fetch_user().await.map(|u| u.username),
        Some("root".to_string())
    );
    assert_eq!(app.staff().couriers().await.expect("couriers").len(), 2);
}

#[tokio::test]
async fn test_orders_for_current_user() {
    let backend = MockBackend::start().await;

    let alice = backend.logged_in("alice", "pw").await;
    let orders = alice.orders().list().await.expect("orders");
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].total(), Price::from_cents(150));

    let root = backend.logged_in("root", "admin-pw").await;
    assert!(root.orders().list().await.expect("orders").is_empty());

    let anonymous = backend.storefront();
    backend.reset_requests();
    assert_matches!(anonymous.orders().list().await, Err(ApiError::NotAuthenticated));
    assert_eq!(backend.request_count(), 0);
}
