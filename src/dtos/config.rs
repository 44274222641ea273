use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::config::{CostCategory, CostRate, WarehouseSkuConfig};

#[derive(Deserialize)]
pub struct CreateWarehouseSkuConfigRequest {
    pub warehouse_id: i64,
    pub sku_id: i64,
    pub storage_cartons_per_pallet: i32,
    pub shipping_cartons_per_pallet: i32,
    pub max_stacking_height: Option<i32>,
    pub effective_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct WarehouseSkuConfigResponse {
    pub id: i64,
    pub warehouse_id: i64,
    pub sku_id: i64,
    pub storage_cartons_per_pallet: i32,
    pub shipping_cartons_per_pallet: i32,
    pub max_stacking_height: Option<i32>,
    pub effective_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl From<WarehouseSkuConfig> for WarehouseSkuConfigResponse {
    fn from(config: WarehouseSkuConfig) -> Self {
        Self {
            id: config.id,
            warehouse_id: config.warehouse_id,
            sku_id: config.sku_id,
            storage_cartons_per_pallet: config.storage_cartons_per_pallet,
            shipping_cartons_per_pallet: config.shipping_cartons_per_pallet,
            max_stacking_height: config.max_stacking_height,
            effective_date: config.effective_date,
            end_date: config.end_date,
            created_at: config.created_at,
        }
    }
}

#[derive(Deserialize)]
pub struct CreateCostRateRequest {
    pub warehouse_id: i64,
    pub cost_category: CostCategory,
    pub cost_name: String,
    pub cost_value: Decimal,
    pub unit_of_measure: String,
    pub effective_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct CostRateResponse {
    pub id: i64,
    pub warehouse_id: i64,
    pub cost_category: String,
    pub cost_name: String,
    pub cost_value: Decimal,
    pub unit_of_measure: String,
    pub effective_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl From<CostRate> for CostRateResponse {
    fn from(rate: CostRate) -> Self {
        Self {
            id: rate.id,
            warehouse_id: rate.warehouse_id,
            cost_category: rate.cost_category,
            cost_name: rate.cost_name,
            cost_value: rate.cost_value,
            unit_of_measure: rate.unit_of_measure,
            effective_date: rate.effective_date,
            end_date: rate.end_date,
            created_at: rate.created_at,
        }
    }
}

#[derive(Deserialize)]
pub struct ConfigOverlapQuery {
    pub warehouse_id: i64,
    pub sku_id: i64,
    pub effective_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct RateOverlapQuery {
    pub warehouse_id: i64,
    pub cost_category: CostCategory,
    pub cost_name: String,
    pub effective_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct OverlapCheckResponse {
    pub overlap: bool,
    pub message: Option<String>,
}

#[derive(Deserialize)]
pub struct ConfigResolveQuery {
    pub warehouse_id: i64,
    pub sku_id: i64,
    pub as_of: NaiveDate,
}

#[derive(Deserialize)]
pub struct RateResolveQuery {
    pub warehouse_id: i64,
    pub cost_category: CostCategory,
    pub cost_name: String,
    pub as_of: NaiveDate,
}
