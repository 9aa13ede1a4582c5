//! sea-orm entities, one module per table.

pub mod batch;
pub mod customer_invoice;
pub mod customer_invoice_line;
pub mod delivery_note;
pub mod delivery_note_line;
pub mod grn_header;
pub mod grn_line;
pub mod journal_entry;
pub mod journal_line;
pub mod party;
pub mod payment;
pub mod payment_allocation;
pub mod product;
pub mod purchase_order;
pub mod purchase_order_line;
pub mod sales_order;
pub mod sales_order_line;
pub mod stock_item;
pub mod stock_movement;
pub mod user_account;
