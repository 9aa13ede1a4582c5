//! Shared harness: application state backed by a throwaway SQLite file.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;
use stockflow_api::config::AppConfig;
use stockflow_api::db;
use stockflow_api::entities::party::PartyType;
use stockflow_api::services::goods_receipt::{ReceiptItemInput, ReceiveGoodsInput};
use stockflow_api::services::parties::CreatePartyInput;
use stockflow_api::services::products::CreateProductInput;
use stockflow_api::services::purchasing::{CreatePurchaseOrderInput, PurchaseLineInput};
use stockflow_api::AppState;
use tempfile::TempDir;
use uuid::Uuid;

pub struct TestApp {
    pub state: AppState,
    _tmp: TempDir,
}

impl TestApp {
    /// Fresh database, migrated schema, wired services.
    pub async fn new() -> Self {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let db_path = tmp.path().join("stockflow_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "test".to_string(),
        );
        // One connection keeps SQLite from tripping over its own lock.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        Self { state, _tmp: tmp }
    }
}

#[allow(dead_code)]
pub async fn create_customer(app: &TestApp, name: &str) -> Uuid {
    app.state
        .services
        .parties
        .create_party(CreatePartyInput {
            name: name.to_string(),
            party_type: PartyType::Customer,
            email: None,
            phone: None,
            billing_address: None,
        })
        .await
        .expect("failed to create customer")
        .id
}

#[allow(dead_code)]
pub async fn create_supplier(app: &TestApp, name: &str) -> Uuid {
    app.state
        .services
        .parties
        .create_party(CreatePartyInput {
            name: name.to_string(),
            party_type: PartyType::Supplier,
            email: None,
            phone: None,
            billing_address: None,
        })
        .await
        .expect("failed to create supplier")
        .id
}

#[allow(dead_code)]
pub async fn create_product(app: &TestApp, sku: &str) -> Uuid {
    app.state
        .services
        .products
        .create_product(CreateProductInput {
            sku: sku.to_string(),
            name: format!("Product {sku}"),
            unit_of_measure: "EA".to_string(),
            category: None,
        })
        .await
        .expect("failed to create product")
        .id
}

/// Runs the whole purchase flow (order, submit, receive) to put one batch
/// of stock on the shelf. Returns the GRN id.
#[allow(dead_code)]
pub async fn receive_stock(
    app: &TestApp,
    supplier_id: Uuid,
    product_id: Uuid,
    warehouse_id: Uuid,
    quantity: Decimal,
    batch_number: &str,
    manufacture_date: NaiveDate,
) -> Uuid {
    let po = app
        .state
        .services
        .purchase_orders
        .create_order(CreatePurchaseOrderInput {
            supplier_id,
            lines: vec![PurchaseLineInput {
                product_id,
                quantity,
                unit_price: Decimal::ONE,
            }],
        })
        .await
        .expect("failed to create purchase order");
    app.state
        .services
        .purchase_orders
        .submit_order(po.id)
        .await
        .expect("failed to submit purchase order");

    app.state
        .services
        .goods_receipts
        .receive_goods(ReceiveGoodsInput {
            purchase_order_id: po.id,
            warehouse_id,
            items: vec![ReceiptItemInput {
                product_id,
                quantity,
                batch_number: batch_number.to_string(),
                manufacture_date,
                expiry_date: None,
                purchase_order_line_id: None,
            }],
        })
        .await
        .expect("failed to receive goods")
        .id
}
