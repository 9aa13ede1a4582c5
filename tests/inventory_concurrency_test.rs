mod common;

use chrono::NaiveDate;
use common::{create_product, create_supplier, receive_stock, TestApp};
use rust_decimal_macros::dec;
use stockflow_api::errors::ServiceError;
use stockflow_api::services::stock;
use uuid::Uuid;

/// Twenty tasks race to reserve one unit each from a pool of ten. The
/// conditional update must admit exactly ten of them, never oversell, and
/// leave the ledger consistent.
#[tokio::test]
async fn concurrent_reservations_never_oversell() {
    let app = TestApp::new().await;
    let warehouse = Uuid::new_v4();
    let supplier = create_supplier(&app, "Acme Supply").await;
    let product = create_product(&app, "SKU-RACE").await;
    receive_stock(
        &app,
        supplier,
        product,
        warehouse,
        dec!(10),
        "LOT-1",
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    )
    .await;

    let mut handles = Vec::new();
    for _ in 0..20 {
        let stock = app.state.services.stock.clone();
        handles.push(tokio::spawn(async move {
            stock
                .try_reserve(product, warehouse, dec!(1), Uuid::new_v4())
                .await
        }));
    }

    let mut successes = 0;
    let mut shortfalls = 0;
    for handle in handles {
        match handle.await.expect("task panicked") {
            Ok(()) => successes += 1,
            Err(ServiceError::InsufficientStock(_)) => shortfalls += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(successes, 10);
    assert_eq!(shortfalls, 10);

    let item = app
        .state
        .services
        .stock
        .get_stock_item(product, warehouse)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item.quantity_on_hand, dec!(10));
    assert_eq!(item.reserved_quantity, dec!(10));
    assert_eq!(item.available(), dec!(0));
}

/// Adjustments racing reservations keep the reserved-leq-on-hand invariant.
#[tokio::test]
async fn adjustment_cannot_undercut_reservations() {
    let app = TestApp::new().await;
    let warehouse = Uuid::new_v4();
    let supplier = create_supplier(&app, "Acme Supply").await;
    let product = create_product(&app, "SKU-ADJ").await;
    receive_stock(
        &app,
        supplier,
        product,
        warehouse,
        dec!(10),
        "LOT-1",
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    )
    .await;

    app.state
        .services
        .stock
        .try_reserve(product, warehouse, dec!(8), Uuid::new_v4())
        .await
        .unwrap();

    // Writing off 5 would leave on-hand 5 < reserved 8.
    let err = app
        .state
        .services
        .stock
        .adjust_stock(product, warehouse, dec!(-5), Some("stocktake".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InsufficientStock(_)));

    // Writing off 2 leaves on-hand 8 = reserved 8.
    app.state
        .services
        .stock
        .adjust_stock(product, warehouse, dec!(-2), Some("stocktake".into()))
        .await
        .unwrap();

    let item = app
        .state
        .services
        .stock
        .get_stock_item(product, warehouse)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item.quantity_on_hand, dec!(8));
    assert_eq!(item.reserved_quantity, dec!(8));
}

/// Every shipment is preceded by a reservation, so shipping more than is
/// reserved signals a corrupted ledger rather than a caller mistake.
#[tokio::test]
async fn shipping_unreserved_stock_reports_a_ledger_fault() {
    let app = TestApp::new().await;
    let warehouse = Uuid::new_v4();
    let supplier = create_supplier(&app, "Acme Supply").await;
    let product = create_product(&app, "SKU-SHIP").await;
    receive_stock(
        &app,
        supplier,
        product,
        warehouse,
        dec!(10),
        "LOT-1",
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    )
    .await;

    let err = stock::ship(app.state.db.as_ref(), product, warehouse, dec!(3))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InternalError(_)));
    assert!(!err.is_client_error());

    let item = app
        .state
        .services
        .stock
        .get_stock_item(product, warehouse)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item.quantity_on_hand, dec!(10));
    assert_eq!(item.reserved_quantity, dec!(0));
}
