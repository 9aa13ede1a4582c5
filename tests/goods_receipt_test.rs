mod common;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use common::{create_customer, create_product, create_supplier, TestApp};
use rust_decimal_macros::dec;
use stockflow_api::entities::stock_movement::MovementType;
use stockflow_api::errors::ServiceError;
use stockflow_api::events::{Event, EventSender};
use stockflow_api::services::goods_receipt::{ReceiptItemInput, ReceiveGoodsInput};
use stockflow_api::services::purchasing::{CreatePurchaseOrderInput, PurchaseLineInput};
use stockflow_api::services::AppServices;
use tokio::sync::mpsc;
use uuid::Uuid;

fn mfg(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn receiving_books_stock_batch_and_movement_atomically() {
    let app = TestApp::new().await;
    let warehouse = Uuid::new_v4();
    let supplier = create_supplier(&app, "Acme Supply").await;
    let product = create_product(&app, "SKU-0100").await;

    let po = app
        .state
        .services
        .purchase_orders
        .create_order(CreatePurchaseOrderInput {
            supplier_id: supplier,
            lines: vec![PurchaseLineInput {
                product_id: product,
                quantity: dec!(25),
                unit_price: dec!(4),
            }],
        })
        .await
        .unwrap();
    app.state.services.purchase_orders.submit_order(po.id).await.unwrap();

    let grn = app
        .state
        .services
        .goods_receipts
        .receive_goods(ReceiveGoodsInput {
            purchase_order_id: po.id,
            warehouse_id: warehouse,
            items: vec![ReceiptItemInput {
                product_id: product,
                quantity: dec!(25),
                batch_number: "LOT-77".to_string(),
                manufacture_date: mfg(2024, 3, 1),
                expiry_date: Some(mfg(2026, 3, 1)),
                purchase_order_line_id: None,
            }],
        })
        .await
        .unwrap();
    assert!(grn.grn_number.starts_with("GRN-"));

    let (header, lines) = app
        .state
        .services
        .goods_receipts
        .get_receipt(grn.id)
        .await
        .unwrap();
    assert_eq!(header.purchase_order_id, po.id);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, dec!(25));

    let item = app
        .state
        .services
        .stock
        .get_stock_item(product, warehouse)
        .await
        .unwrap()
        .expect("receipt must create the ledger row");
    assert_eq!(item.quantity_on_hand, dec!(25));
    assert_eq!(item.reserved_quantity, dec!(0));

    let movements = app
        .state
        .services
        .stock
        .movements_for_product(product, warehouse)
        .await
        .unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].movement_type, MovementType::Inbound);
    assert_eq!(movements[0].quantity, dec!(25));
    assert_eq!(movements[0].batch_id, Some(lines[0].batch_id));
    assert_eq!(movements[0].reference_id, Some(grn.id));

    let (po_after, _) = app.state.services.purchase_orders.get_order(po.id).await.unwrap();
    assert_eq!(po_after.status, "RECEIVED");
}

#[tokio::test]
async fn customer_party_cannot_be_ordered_from_as_a_supplier() {
    let app = TestApp::new().await;
    let customer = create_customer(&app, "Globex").await;
    let product = create_product(&app, "SKU-0103").await;

    let err = app
        .state
        .services
        .purchase_orders
        .create_order(CreatePurchaseOrderInput {
            supplier_id: customer,
            lines: vec![PurchaseLineInput {
                product_id: product,
                quantity: dec!(5),
                unit_price: dec!(4),
            }],
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn purchase_orders_for_unknown_suppliers_are_rejected() {
    let app = TestApp::new().await;
    let product = create_product(&app, "SKU-0104").await;

    let err = app
        .state
        .services
        .purchase_orders
        .create_order(CreatePurchaseOrderInput {
            supplier_id: Uuid::new_v4(),
            lines: vec![PurchaseLineInput {
                product_id: product,
                quantity: dec!(5),
                unit_price: dec!(4),
            }],
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn receiving_a_draft_order_is_rejected() {
    let app = TestApp::new().await;
    let supplier = create_supplier(&app, "Acme Supply").await;
    let product = create_product(&app, "SKU-0101").await;

    let po = app
        .state
        .services
        .purchase_orders
        .create_order(CreatePurchaseOrderInput {
            supplier_id: supplier,
            lines: vec![PurchaseLineInput {
                product_id: product,
                quantity: dec!(5),
                unit_price: dec!(4),
            }],
        })
        .await
        .unwrap();

    let err = app
        .state
        .services
        .goods_receipts
        .receive_goods(ReceiveGoodsInput {
            purchase_order_id: po.id,
            warehouse_id: Uuid::new_v4(),
            items: vec![ReceiptItemInput {
                product_id: product,
                quantity: dec!(5),
                batch_number: "LOT-1".to_string(),
                manufacture_date: mfg(2024, 3, 1),
                expiry_date: None,
                purchase_order_line_id: None,
            }],
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidTransition(_));
}

#[tokio::test]
async fn a_purchase_order_cannot_be_received_twice() {
    let app = TestApp::new().await;
    let warehouse = Uuid::new_v4();
    let supplier = create_supplier(&app, "Acme Supply").await;
    let product = create_product(&app, "SKU-0102").await;

    let po = app
        .state
        .services
        .purchase_orders
        .create_order(CreatePurchaseOrderInput {
            supplier_id: supplier,
            lines: vec![PurchaseLineInput {
                product_id: product,
                quantity: dec!(5),
                unit_price: dec!(4),
            }],
        })
        .await
        .unwrap();
    app.state.services.purchase_orders.submit_order(po.id).await.unwrap();

    let items = vec![ReceiptItemInput {
        product_id: product,
        quantity: dec!(5),
        batch_number: "LOT-1".to_string(),
        manufacture_date: mfg(2024, 3, 1),
        expiry_date: None,
        purchase_order_line_id: None,
    }];
    app.state
        .services
        .goods_receipts
        .receive_goods(ReceiveGoodsInput {
            purchase_order_id: po.id,
            warehouse_id: warehouse,
            items: items.clone(),
        })
        .await
        .unwrap();

    let err = app
        .state
        .services
        .goods_receipts
        .receive_goods(ReceiveGoodsInput {
            purchase_order_id: po.id,
            warehouse_id: warehouse,
            items,
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidTransition(_));

    // Stock was not double counted.
    let item = app
        .state
        .services
        .stock
        .get_stock_item(product, warehouse)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item.quantity_on_hand, dec!(5));
}

#[tokio::test]
async fn completion_event_fires_after_commit() {
    let app = TestApp::new().await;
    let warehouse = Uuid::new_v4();
    let supplier = create_supplier(&app, "Acme Supply").await;
    let product = create_product(&app, "SKU-0103").await;

    // Wire services against our own channel so the event can be observed.
    let (tx, mut rx) = mpsc::channel(16);
    let services = AppServices::new(app.state.db.clone(), EventSender::new(tx));

    let po = services
        .purchase_orders
        .create_order(CreatePurchaseOrderInput {
            supplier_id: supplier,
            lines: vec![PurchaseLineInput {
                product_id: product,
                quantity: dec!(5),
                unit_price: dec!(4),
            }],
        })
        .await
        .unwrap();
    services.purchase_orders.submit_order(po.id).await.unwrap();

    let grn = services
        .goods_receipts
        .receive_goods(ReceiveGoodsInput {
            purchase_order_id: po.id,
            warehouse_id: warehouse,
            items: vec![ReceiptItemInput {
                product_id: product,
                quantity: dec!(5),
                batch_number: "LOT-1".to_string(),
                manufacture_date: mfg(2024, 3, 1),
                expiry_date: None,
                purchase_order_line_id: None,
            }],
        })
        .await
        .unwrap();

    let mut completed = None;
    while let Ok(event) = rx.try_recv() {
        if let Event::GoodsReceiptCompleted {
            grn_id,
            purchase_order_id,
            ..
        } = event
        {
            completed = Some((grn_id, purchase_order_id));
        }
    }
    assert_eq!(completed, Some((grn.id, po.id)));
}
