//! Audit guard over ledger-sensitive entities.
//!
//! Stock, journal, invoice, payment and user records are never hard-deleted;
//! they can only be superseded by compensating records (reversal movements,
//! credit notes). Every delete in the crate goes through this module, so the
//! restricted set is a compile-time enum, not a table-name list.

use crate::errors::ServiceError;
use sea_orm::sea_query::Condition;
use sea_orm::{ConnectionTrait, EntityTrait, PrimaryKeyTrait, QueryFilter};

/// One tag per persisted entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityTag {
    Party,
    Product,
    StockItem,
    Batch,
    StockMovement,
    PurchaseOrder,
    PurchaseOrderLine,
    GrnHeader,
    GrnLine,
    SalesOrder,
    SalesOrderLine,
    DeliveryNote,
    DeliveryNoteLine,
    CustomerInvoice,
    CustomerInvoiceLine,
    JournalEntry,
    JournalLine,
    Payment,
    PaymentAllocation,
    UserAccount,
}

impl EntityTag {
    pub const fn table_name(self) -> &'static str {
        match self {
            EntityTag::Party => "parties",
            EntityTag::Product => "products",
            EntityTag::StockItem => "stock_items",
            EntityTag::Batch => "batches",
            EntityTag::StockMovement => "stock_movements",
            EntityTag::PurchaseOrder => "purchase_orders",
            EntityTag::PurchaseOrderLine => "purchase_order_lines",
            EntityTag::GrnHeader => "grn_headers",
            EntityTag::GrnLine => "grn_lines",
            EntityTag::SalesOrder => "sales_orders",
            EntityTag::SalesOrderLine => "sales_order_lines",
            EntityTag::DeliveryNote => "delivery_notes",
            EntityTag::DeliveryNoteLine => "delivery_note_lines",
            EntityTag::CustomerInvoice => "customer_invoices",
            EntityTag::CustomerInvoiceLine => "customer_invoice_lines",
            EntityTag::JournalEntry => "journal_entries",
            EntityTag::JournalLine => "journal_lines",
            EntityTag::Payment => "payments",
            EntityTag::PaymentAllocation => "payment_allocations",
            EntityTag::UserAccount => "user_accounts",
        }
    }

    /// Entities whose rows carry ledger meaning and must never be removed.
    pub const fn is_ledger_sensitive(self) -> bool {
        matches!(
            self,
            EntityTag::StockItem
                | EntityTag::StockMovement
                | EntityTag::JournalEntry
                | EntityTag::JournalLine
                | EntityTag::CustomerInvoice
                | EntityTag::CustomerInvoiceLine
                | EntityTag::Payment
                | EntityTag::PaymentAllocation
                | EntityTag::UserAccount
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Insert,
    Update,
    Delete,
    DeleteMany,
}

/// Policy check applied before any mutating access.
///
/// Inserts and updates always pass; deletes against a ledger-sensitive
/// entity fail regardless of caller privilege.
pub fn ensure_mutation_allowed(kind: MutationKind, tag: EntityTag) -> Result<(), ServiceError> {
    match kind {
        MutationKind::Insert | MutationKind::Update => Ok(()),
        MutationKind::Delete | MutationKind::DeleteMany => {
            if tag.is_ledger_sensitive() {
                Err(ServiceError::ForbiddenHardDelete(format!(
                    "{} records may only be superseded by compensating entries",
                    tag.table_name()
                )))
            } else {
                Ok(())
            }
        }
    }
}

/// Deletes a single row by primary key, subject to the guard.
pub async fn guarded_delete_by_id<E, C>(
    conn: &C,
    tag: EntityTag,
    id: <E::PrimaryKey as PrimaryKeyTrait>::ValueType,
) -> Result<u64, ServiceError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    ensure_mutation_allowed(MutationKind::Delete, tag)?;
    let res = E::delete_by_id(id).exec(conn).await?;
    Ok(res.rows_affected)
}

/// Deletes every row matching `condition`, subject to the guard.
pub async fn guarded_delete_many<E, C>(
    conn: &C,
    tag: EntityTag,
    condition: Condition,
) -> Result<u64, ServiceError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    ensure_mutation_allowed(MutationKind::DeleteMany, tag)?;
    let res = E::delete_many().filter(condition).exec(conn).await?;
    Ok(res.rows_affected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn sensitive_set_covers_ledger_entities() {
        for tag in [
            EntityTag::StockItem,
            EntityTag::StockMovement,
            EntityTag::JournalEntry,
            EntityTag::JournalLine,
            EntityTag::CustomerInvoice,
            EntityTag::CustomerInvoiceLine,
            EntityTag::Payment,
            EntityTag::PaymentAllocation,
            EntityTag::UserAccount,
        ] {
            assert!(tag.is_ledger_sensitive(), "{:?}", tag);
            assert_matches!(
                ensure_mutation_allowed(MutationKind::Delete, tag),
                Err(ServiceError::ForbiddenHardDelete(_))
            );
            assert_matches!(
                ensure_mutation_allowed(MutationKind::DeleteMany, tag),
                Err(ServiceError::ForbiddenHardDelete(_))
            );
        }
    }

    #[test]
    fn updates_pass_everywhere() {
        assert!(ensure_mutation_allowed(MutationKind::Update, EntityTag::JournalEntry).is_ok());
        assert!(ensure_mutation_allowed(MutationKind::Insert, EntityTag::Payment).is_ok());
    }

    #[test]
    fn document_tables_remain_deletable() {
        for tag in [EntityTag::Product, EntityTag::SalesOrderLine, EntityTag::Batch] {
            assert!(ensure_mutation_allowed(MutationKind::Delete, tag).is_ok(), "{:?}", tag);
        }
    }

    #[test]
    fn error_names_the_entity() {
        let err = ensure_mutation_allowed(MutationKind::Delete, EntityTag::StockItem).unwrap_err();
        assert!(err.to_string().contains("stock_items"));
    }
}
