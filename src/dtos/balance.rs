use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::models::balance::InventoryBalance;

#[derive(Serialize)]
pub struct BalanceResponse {
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

impl From<InventoryBalance> for BalanceResponse {
    fn from(balance: InventoryBalance) -> Self {
        Self {
            id: balance.id,
            warehouse_id: balance.warehouse_id,
            sku_id: balance.sku_id,
            batch_lot: balance.batch_lot,
            current_cartons: balance.current_cartons,
            current_pallets: balance.current_pallets,
            current_units: balance.current_units,
            storage_cartons_per_pallet: balance.storage_cartons_per_pallet,
            shipping_cartons_per_pallet: balance.shipping_cartons_per_pallet,
            last_transaction_date: balance.last_transaction_date,
            updated_at: balance.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct BalanceSummaryResponse {
    pub total_cartons: i64,
    pub total_pallets: i64,
    pub total_units: i64,
    pub unique_skus: i64,
    pub total_items: i64,
}
