mod common;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use common::{create_customer, create_product, create_supplier, receive_stock, TestApp};
use rust_decimal_macros::dec;
use stockflow_api::errors::ServiceError;
use stockflow_api::services::reservations::{CreateSalesOrderInput, OrderLineInput};
use uuid::Uuid;

fn mfg(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn reserving_reduces_available_but_not_on_hand() {
    let app = TestApp::new().await;
    let warehouse = Uuid::new_v4();
    let supplier = create_supplier(&app, "Acme Supply").await;
    let customer = create_customer(&app, "Globex").await;
    let product = create_product(&app, "SKU-0001").await;
    receive_stock(&app, supplier, product, warehouse, dec!(10), "B-001", mfg(2024, 1, 10)).await;

    let order = app
        .state
        .services
        .sales_orders
        .create_order(CreateSalesOrderInput {
            customer_id: customer,
            warehouse_id: warehouse,
            lines: vec![OrderLineInput {
                product_id: product,
                quantity: dec!(4),
                unit_price: dec!(25),
            }],
        })
        .await
        .unwrap();
    assert_eq!(order.status, "DRAFT");
    assert_eq!(order.total_amount, dec!(100));

    let item = app
        .state
        .services
        .stock
        .get_stock_item(product, warehouse)
        .await
        .unwrap()
        .expect("ledger row must exist after receipt");
    assert_eq!(item.quantity_on_hand, dec!(10));
    assert_eq!(item.reserved_quantity, dec!(4));
    assert_eq!(item.available(), dec!(6));
}

#[tokio::test]
async fn order_exceeding_available_fails_and_reserves_nothing() {
    let app = TestApp::new().await;
    let warehouse = Uuid::new_v4();
    let supplier = create_supplier(&app, "Acme Supply").await;
    let customer = create_customer(&app, "Globex").await;
    let product = create_product(&app, "SKU-0002").await;
    receive_stock(&app, supplier, product, warehouse, dec!(10), "B-001", mfg(2024, 1, 10)).await;

    // First order takes 4, leaving 6 available.
    app.state
        .services
        .sales_orders
        .create_order(CreateSalesOrderInput {
            customer_id: customer,
            warehouse_id: warehouse,
            lines: vec![OrderLineInput {
                product_id: product,
                quantity: dec!(4),
                unit_price: dec!(25),
            }],
        })
        .await
        .unwrap();

    let err = app
        .state
        .services
        .sales_orders
        .create_order(CreateSalesOrderInput {
            customer_id: customer,
            warehouse_id: warehouse,
            lines: vec![OrderLineInput {
                product_id: product,
                quantity: dec!(7),
                unit_price: dec!(25),
            }],
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock(_));

    let item = app
        .state
        .services
        .stock
        .get_stock_item(product, warehouse)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item.reserved_quantity, dec!(4), "failed order must not leave a partial hold");
}

#[tokio::test]
async fn multi_line_order_reserves_all_or_nothing() {
    let app = TestApp::new().await;
    let warehouse = Uuid::new_v4();
    let supplier = create_supplier(&app, "Acme Supply").await;
    let customer = create_customer(&app, "Globex").await;
    let plentiful = create_product(&app, "SKU-PLENTY").await;
    let scarce = create_product(&app, "SKU-SCARCE").await;
    receive_stock(&app, supplier, plentiful, warehouse, dec!(50), "B-001", mfg(2024, 1, 10)).await;
    receive_stock(&app, supplier, scarce, warehouse, dec!(2), "B-002", mfg(2024, 1, 10)).await;

    let err = app
        .state
        .services
        .sales_orders
        .create_order(CreateSalesOrderInput {
            customer_id: customer,
            warehouse_id: warehouse,
            lines: vec![
                OrderLineInput {
                    product_id: plentiful,
                    quantity: dec!(5),
                    unit_price: dec!(10),
                },
                OrderLineInput {
                    product_id: scarce,
                    quantity: dec!(3),
                    unit_price: dec!(10),
                },
            ],
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock(_));

    // The first line's reservation must have rolled back with the order.
    let item = app
        .state
        .services
        .stock
        .get_stock_item(plentiful, warehouse)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item.reserved_quantity, dec!(0));
}

#[tokio::test]
async fn cancelling_a_draft_order_releases_its_reservations() {
    let app = TestApp::new().await;
    let warehouse = Uuid::new_v4();
    let supplier = create_supplier(&app, "Acme Supply").await;
    let customer = create_customer(&app, "Globex").await;
    let product = create_product(&app, "SKU-0003").await;
    receive_stock(&app, supplier, product, warehouse, dec!(10), "B-001", mfg(2024, 1, 10)).await;

    let order = app
        .state
        .services
        .sales_orders
        .create_order(CreateSalesOrderInput {
            customer_id: customer,
            warehouse_id: warehouse,
            lines: vec![OrderLineInput {
                product_id: product,
                quantity: dec!(6),
                unit_price: dec!(25),
            }],
        })
        .await
        .unwrap();

    let cancelled = app
        .state
        .services
        .sales_orders
        .cancel_order(order.id)
        .await
        .unwrap();
    assert_eq!(cancelled.status, "CANCELLED");

    let available = app
        .state
        .services
        .stock
        .available_quantity(product, warehouse)
        .await
        .unwrap();
    assert_eq!(available, dec!(10));
}

#[tokio::test]
async fn approved_orders_cannot_be_cancelled() {
    let app = TestApp::new().await;
    let warehouse = Uuid::new_v4();
    let supplier = create_supplier(&app, "Acme Supply").await;
    let customer = create_customer(&app, "Globex").await;
    let product = create_product(&app, "SKU-0004").await;
    receive_stock(&app, supplier, product, warehouse, dec!(10), "B-001", mfg(2024, 1, 10)).await;

    let order = app
        .state
        .services
        .sales_orders
        .create_order(CreateSalesOrderInput {
            customer_id: customer,
            warehouse_id: warehouse,
            lines: vec![OrderLineInput {
                product_id: product,
                quantity: dec!(1),
                unit_price: dec!(25),
            }],
        })
        .await
        .unwrap();
    let approved = app
        .state
        .services
        .sales_orders
        .approve_order(order.id)
        .await
        .unwrap();
    assert_eq!(approved.status, "APPROVED");

    let err = app
        .state
        .services
        .sales_orders
        .cancel_order(order.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidTransition(_));
}

#[tokio::test]
async fn order_for_an_unknown_customer_is_rejected() {
    let app = TestApp::new().await;

    let err = app
        .state
        .services
        .sales_orders
        .create_order(CreateSalesOrderInput {
            customer_id: Uuid::new_v4(),
            warehouse_id: Uuid::new_v4(),
            lines: vec![OrderLineInput {
                product_id: Uuid::new_v4(),
                quantity: dec!(1),
                unit_price: dec!(25),
            }],
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn supplier_party_cannot_place_a_sales_order() {
    let app = TestApp::new().await;
    let supplier = create_supplier(&app, "Acme Supply").await;
    let product = create_product(&app, "SKU-0005").await;

    let err = app
        .state
        .services
        .sales_orders
        .create_order(CreateSalesOrderInput {
            customer_id: supplier,
            warehouse_id: Uuid::new_v4(),
            lines: vec![OrderLineInput {
                product_id: product,
                quantity: dec!(1),
                unit_price: dec!(25),
            }],
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn order_lines_must_reference_existing_products() {
    let app = TestApp::new().await;
    let customer = create_customer(&app, "Globex").await;

    let err = app
        .state
        .services
        .sales_orders
        .create_order(CreateSalesOrderInput {
            customer_id: customer,
            warehouse_id: Uuid::new_v4(),
            lines: vec![OrderLineInput {
                product_id: Uuid::new_v4(),
                quantity: dec!(1),
                unit_price: dec!(25),
            }],
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn order_with_zero_quantity_line_is_rejected() {
    let app = TestApp::new().await;
    let customer = create_customer(&app, "Globex").await;

    let err = app
        .state
        .services
        .sales_orders
        .create_order(CreateSalesOrderInput {
            customer_id: customer,
            warehouse_id: Uuid::new_v4(),
            lines: vec![OrderLineInput {
                product_id: Uuid::new_v4(),
                quantity: dec!(0),
                unit_price: dec!(25),
            }],
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}
