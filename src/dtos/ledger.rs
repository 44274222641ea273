use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::ledger::StorageLedgerEntry;

#[derive(Deserialize)]
pub struct AggregateWeekRequest {
    pub warehouse_id: i64,
    /// Any date in the target week; the aggregation snaps it to the week's
    /// Sunday.
    pub week_ending_date: NaiveDate,
}

#[derive(Deserialize)]
pub struct AggregatePeriodRequest {
    pub warehouse_id: i64,
    /// Year and starting month of the 16th-to-15th billing period.
    pub year: i32,
    pub month: u32,
}

#[derive(Serialize)]
pub struct AggregateResponse {
    pub entries_upserted: usize,
    pub warnings: Vec<String>,
}

#[derive(Serialize)]
pub struct StorageLedgerEntryResponse {
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

impl From<StorageLedgerEntry> for StorageLedgerEntryResponse {
    fn from(entry: StorageLedgerEntry) -> Self {
        Self {
            id: entry.id,
            warehouse_id: entry.warehouse_id,
            sku_id: entry.sku_id,
            batch_lot: entry.batch_lot,
            week_ending_date: entry.week_ending_date,
            cartons_end_of_week: entry.cartons_end_of_week,
            quantity_charged: entry.quantity_charged,
            storage_unit: entry.storage_unit,
            applicable_weekly_rate: entry.applicable_weekly_rate,
            calculated_weekly_cost: entry.calculated_weekly_cost,
            billing_period_start: entry.billing_period_start,
            billing_period_end: entry.billing_period_end,
            updated_at: entry.updated_at,
        }
    }
}

/// One point of the weekly cost trend consumed by the dashboard surface.
#[derive(Serialize)]
pub struct WeeklyCostPoint {
    pub week_ending_date: NaiveDate,
    pub total_quantity_charged: i64,
    pub total_weekly_cost: Decimal,
}
