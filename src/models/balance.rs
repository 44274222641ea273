use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

/// Derived running balance, one row per (warehouse, SKU, batch). Overwritten
/// on every ledger write; `current_cartons` is never negative.
#[derive(Debug, FromRow)]
pub struct InventoryBalance {
    pub id: i64,
    pub warehouse_id: i64,
    pub sku_id: i64,
    pub batch_lot: String,
    pub current_cartons: i32,
    pub current_pallets: i32,
    pub current_units: i32,
    pub storage_cartons_per_pallet: Option<i32>,
    pub shipping_cartons_per_pallet: Option<i32>,
    pub last_transaction_date: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}
