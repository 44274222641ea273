use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

/// Derived weekly storage snapshot, one row per (warehouse, SKU, batch, week).
/// Upserted by the aggregation pass; not user-editable.
#[derive(Debug, FromRow)]
pub struct StorageLedgerEntry {
    pub id: i64,
    pub warehouse_id: i64,
    pub sku_id: i64,
    pub batch_lot: String,
    pub week_ending_date: NaiveDate,
    pub cartons_end_of_week: i32,
    pub quantity_charged: i64,
    pub storage_unit: String,
    pub applicable_weekly_rate: Decimal,
    pub calculated_weekly_cost: Decimal,
    pub billing_period_start: NaiveDate,
    pub billing_period_end: NaiveDate,
    pub updated_at: DateTime<Utc>,
}
