//! Embedded schema migrations.
//!
//! Tables are created in dependency order; unique indexes back the
//! invariants the services rely on (one stock row per product/warehouse,
//! one invoice per delivery, unique payment idempotency keys).

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_parties_table::Migration),
            Box::new(m20240101_000002_create_products_table::Migration),
            Box::new(m20240101_000003_create_stock_tables::Migration),
            Box::new(m20240101_000004_create_purchase_order_tables::Migration),
            Box::new(m20240101_000005_create_grn_tables::Migration),
            Box::new(m20240101_000006_create_sales_order_tables::Migration),
            Box::new(m20240101_000007_create_delivery_tables::Migration),
            Box::new(m20240101_000008_create_invoice_tables::Migration),
            Box::new(m20240101_000009_create_journal_tables::Migration),
            Box::new(m20240101_000010_create_payment_tables::Migration),
            Box::new(m20240101_000011_create_user_accounts_table::Migration),
        ]
    }
}

mod m20240101_000001_create_parties_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_parties_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Parties::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Parties::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Parties::Name).string().not_null())
                        .col(ColumnDef::new(Parties::PartyType).string_len(16).not_null())
                        .col(ColumnDef::new(Parties::Email).string().null())
                        .col(ColumnDef::new(Parties::Phone).string().null())
                        .col(ColumnDef::new(Parties::BillingAddress).string().null())
                        .col(ColumnDef::new(Parties::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Parties::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Parties::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Parties {
        Table,
        Id,
        Name,
        PartyType,
        Email,
        Phone,
        BillingAddress,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_products_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Products::Sku).string().not_null().unique_key())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::UnitOfMeasure).string().not_null())
                        .col(ColumnDef::new(Products::Category).string().null())
                        .col(ColumnDef::new(Products::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Products::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Products {
        Table,
        Id,
        Sku,
        Name,
        UnitOfMeasure,
        Category,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_stock_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_stock_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockItems::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(StockItems::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(StockItems::ProductId).uuid().not_null())
                        .col(ColumnDef::new(StockItems::WarehouseId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockItems::QuantityOnHand)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockItems::ReservedQuantity)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(StockItems::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(StockItems::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_items_product_warehouse")
                        .table(StockItems::Table)
                        .col(StockItems::ProductId)
                        .col(StockItems::WarehouseId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Batches::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Batches::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Batches::ProductId).uuid().not_null())
                        .col(ColumnDef::new(Batches::BatchNumber).string().not_null())
                        .col(ColumnDef::new(Batches::ManufactureDate).date().not_null())
                        .col(ColumnDef::new(Batches::ExpiryDate).date().null())
                        .col(
                            ColumnDef::new(Batches::ReceivedQuantity)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Batches::AvailableQuantity)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Batches::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_batches_product_manufacture_date")
                        .table(Batches::Table)
                        .col(Batches::ProductId)
                        .col(Batches::ManufactureDate)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockMovements::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::MovementType)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::ProductId).uuid().not_null())
                        .col(ColumnDef::new(StockMovements::WarehouseId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockMovements::Quantity)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::BatchId).uuid().null())
                        .col(ColumnDef::new(StockMovements::ReferenceId).uuid().null())
                        .col(ColumnDef::new(StockMovements::ReferenceType).string().null())
                        .col(
                            ColumnDef::new(StockMovements::OccurredAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockMovements::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Batches::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum StockItems {
        Table,
        Id,
        ProductId,
        WarehouseId,
        QuantityOnHand,
        ReservedQuantity,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Batches {
        Table,
        Id,
        ProductId,
        BatchNumber,
        ManufactureDate,
        ExpiryDate,
        ReceivedQuantity,
        AvailableQuantity,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum StockMovements {
        Table,
        Id,
        MovementType,
        ProductId,
        WarehouseId,
        Quantity,
        BatchId,
        ReferenceId,
        ReferenceType,
        OccurredAt,
    }
}

mod m20240101_000004_create_purchase_order_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_purchase_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrders::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::OrderNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::SupplierId).uuid().not_null())
                        .col(ColumnDef::new(PurchaseOrders::Status).string().not_null())
                        .col(
                            ColumnDef::new(PurchaseOrders::OrderDate)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::TotalAmount)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrderLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrderLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::PurchaseOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrderLines::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(PurchaseOrderLines::Quantity)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::UnitPrice)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::LineTotal)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PurchaseOrderLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PurchaseOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum PurchaseOrders {
        Table,
        Id,
        OrderNumber,
        SupplierId,
        Status,
        OrderDate,
        TotalAmount,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum PurchaseOrderLines {
        Table,
        Id,
        PurchaseOrderId,
        ProductId,
        Quantity,
        UnitPrice,
        LineTotal,
        CreatedAt,
    }
}

mod m20240101_000005_create_grn_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_grn_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(GrnHeaders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(GrnHeaders::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(GrnHeaders::GrnNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(GrnHeaders::PurchaseOrderId).uuid().not_null())
                        .col(ColumnDef::new(GrnHeaders::WarehouseId).uuid().not_null())
                        .col(ColumnDef::new(GrnHeaders::Status).string().not_null())
                        .col(ColumnDef::new(GrnHeaders::ReceivedAt).timestamp().not_null())
                        .col(ColumnDef::new(GrnHeaders::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(GrnLines::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(GrnLines::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(GrnLines::GrnId).uuid().not_null())
                        .col(ColumnDef::new(GrnLines::ProductId).uuid().not_null())
                        .col(ColumnDef::new(GrnLines::BatchId).uuid().not_null())
                        .col(ColumnDef::new(GrnLines::PurchaseOrderLineId).uuid().null())
                        .col(
                            ColumnDef::new(GrnLines::Quantity)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(ColumnDef::new(GrnLines::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(GrnLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(GrnHeaders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum GrnHeaders {
        Table,
        Id,
        GrnNumber,
        PurchaseOrderId,
        WarehouseId,
        Status,
        ReceivedAt,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum GrnLines {
        Table,
        Id,
        GrnId,
        ProductId,
        BatchId,
        PurchaseOrderLineId,
        Quantity,
        CreatedAt,
    }
}

mod m20240101_000006_create_sales_order_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_sales_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(SalesOrders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(SalesOrders::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(SalesOrders::OrderNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(SalesOrders::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(SalesOrders::WarehouseId).uuid().not_null())
                        .col(ColumnDef::new(SalesOrders::Status).string().not_null())
                        .col(ColumnDef::new(SalesOrders::OrderDate).timestamp().not_null())
                        .col(
                            ColumnDef::new(SalesOrders::TotalAmount)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(SalesOrders::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(SalesOrders::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SalesOrderLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SalesOrderLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SalesOrderLines::SalesOrderId).uuid().not_null())
                        .col(ColumnDef::new(SalesOrderLines::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(SalesOrderLines::Quantity)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SalesOrderLines::UnitPrice)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SalesOrderLines::LineTotal)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SalesOrderLines::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SalesOrderLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(SalesOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum SalesOrders {
        Table,
        Id,
        OrderNumber,
        CustomerId,
        WarehouseId,
        Status,
        OrderDate,
        TotalAmount,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum SalesOrderLines {
        Table,
        Id,
        SalesOrderId,
        ProductId,
        Quantity,
        UnitPrice,
        LineTotal,
        CreatedAt,
    }
}

mod m20240101_000007_create_delivery_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000007_create_delivery_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DeliveryNotes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DeliveryNotes::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryNotes::DeliveryNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(DeliveryNotes::SalesOrderId).uuid().not_null())
                        .col(ColumnDef::new(DeliveryNotes::WarehouseId).uuid().not_null())
                        .col(ColumnDef::new(DeliveryNotes::ShippedAt).timestamp().not_null())
                        .col(ColumnDef::new(DeliveryNotes::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DeliveryNoteLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DeliveryNoteLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryNoteLines::DeliveryNoteId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryNoteLines::SalesOrderLineId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DeliveryNoteLines::ProductId).uuid().not_null())
                        .col(ColumnDef::new(DeliveryNoteLines::BatchId).uuid().not_null())
                        .col(
                            ColumnDef::new(DeliveryNoteLines::Quantity)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryNoteLines::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DeliveryNoteLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(DeliveryNotes::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum DeliveryNotes {
        Table,
        Id,
        DeliveryNumber,
        SalesOrderId,
        WarehouseId,
        ShippedAt,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum DeliveryNoteLines {
        Table,
        Id,
        DeliveryNoteId,
        SalesOrderLineId,
        ProductId,
        BatchId,
        Quantity,
        CreatedAt,
    }
}

mod m20240101_000008_create_invoice_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000008_create_invoice_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(CustomerInvoices::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CustomerInvoices::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CustomerInvoices::InvoiceNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(CustomerInvoices::CustomerId).uuid().not_null())
                        .col(
                            ColumnDef::new(CustomerInvoices::SalesOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CustomerInvoices::DeliveryNoteId)
                                .uuid()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(CustomerInvoices::Status).string().not_null())
                        .col(
                            ColumnDef::new(CustomerInvoices::TotalAmount)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CustomerInvoices::PaidAmount)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(CustomerInvoices::IssuedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CustomerInvoices::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CustomerInvoices::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CustomerInvoiceLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CustomerInvoiceLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CustomerInvoiceLines::InvoiceId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CustomerInvoiceLines::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CustomerInvoiceLines::Quantity)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CustomerInvoiceLines::UnitPrice)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CustomerInvoiceLines::LineTotal)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CustomerInvoiceLines::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // The retry dedup key for invoice line generation.
            manager
                .create_index(
                    Index::create()
                        .name("idx_invoice_lines_invoice_product")
                        .table(CustomerInvoiceLines::Table)
                        .col(CustomerInvoiceLines::InvoiceId)
                        .col(CustomerInvoiceLines::ProductId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CustomerInvoiceLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(CustomerInvoices::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum CustomerInvoices {
        Table,
        Id,
        InvoiceNumber,
        CustomerId,
        SalesOrderId,
        DeliveryNoteId,
        Status,
        TotalAmount,
        PaidAmount,
        IssuedAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum CustomerInvoiceLines {
        Table,
        Id,
        InvoiceId,
        ProductId,
        Quantity,
        UnitPrice,
        LineTotal,
        CreatedAt,
    }
}

mod m20240101_000009_create_journal_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000009_create_journal_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(JournalEntries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(JournalEntries::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(JournalEntries::SourceType).string().not_null())
                        .col(ColumnDef::new(JournalEntries::SourceId).uuid().null())
                        .col(ColumnDef::new(JournalEntries::Memo).string().null())
                        .col(ColumnDef::new(JournalEntries::PostedAt).timestamp().not_null())
                        .col(
                            ColumnDef::new(JournalEntries::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(JournalLines::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(JournalLines::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(JournalLines::JournalEntryId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(JournalLines::AccountCode).string().not_null())
                        .col(ColumnDef::new(JournalLines::AccountName).string().not_null())
                        .col(ColumnDef::new(JournalLines::Side).string_len(8).not_null())
                        .col(
                            ColumnDef::new(JournalLines::Amount)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(ColumnDef::new(JournalLines::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(JournalLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(JournalEntries::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum JournalEntries {
        Table,
        Id,
        SourceType,
        SourceId,
        Memo,
        PostedAt,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum JournalLines {
        Table,
        Id,
        JournalEntryId,
        AccountCode,
        AccountName,
        Side,
        Amount,
        CreatedAt,
    }
}

mod m20240101_000010_create_payment_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000010_create_payment_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Payments::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Payments::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Payments::PaymentNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Payments::PartyId).uuid().not_null())
                        .col(ColumnDef::new(Payments::Kind).string_len(16).not_null())
                        .col(ColumnDef::new(Payments::Method).string().not_null())
                        .col(
                            ColumnDef::new(Payments::Amount)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Payments::IdempotencyKey)
                                .string()
                                .null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Payments::ReceivedAt).timestamp().not_null())
                        .col(ColumnDef::new(Payments::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PaymentAllocations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PaymentAllocations::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PaymentAllocations::PaymentId).uuid().not_null())
                        .col(ColumnDef::new(PaymentAllocations::InvoiceId).uuid().not_null())
                        .col(
                            ColumnDef::new(PaymentAllocations::AllocatedAmount)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentAllocations::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PaymentAllocations::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Payments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Payments {
        Table,
        Id,
        PaymentNumber,
        PartyId,
        Kind,
        Method,
        Amount,
        IdempotencyKey,
        ReceivedAt,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum PaymentAllocations {
        Table,
        Id,
        PaymentId,
        InvoiceId,
        AllocatedAmount,
        CreatedAt,
    }
}

mod m20240101_000011_create_user_accounts_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000011_create_user_accounts_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(UserAccounts::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(UserAccounts::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(UserAccounts::Email)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(UserAccounts::DisplayName).string().not_null())
                        .col(
                            ColumnDef::new(UserAccounts::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(UserAccounts::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(UserAccounts::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(UserAccounts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum UserAccounts {
        Table,
        Id,
        Email,
        DisplayName,
        Active,
        CreatedAt,
        UpdatedAt,
    }
}
