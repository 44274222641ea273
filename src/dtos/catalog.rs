use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::catalog::{BillingMode, Sku, Warehouse};

fn default_one() -> i32 {
    1
}

#[derive(Deserialize)]
pub struct CreateSkuRequest {
    pub sku_code: String,
    pub description: Option<String>,
    #[serde(default = "default_one")]
    pub units_per_carton: i32,
    #[serde(default = "default_one")]
    pub pack_size: i32,
    pub carton_dimensions_cm: Option<String>,
}

#[derive(Serialize)]
pub struct SkuResponse {
    pub id: i64,
    pub sku_code: String,
    pub description: Option<String>,
    pub units_per_carton: i32,
    pub pack_size: i32,
    pub carton_dimensions_cm: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Sku> for SkuResponse {
    fn from(sku: Sku) -> Self {
        Self {
            id: sku.id,
            sku_code: sku.sku_code,
            description: sku.description,
            units_per_carton: sku.units_per_carton,
            pack_size: sku.pack_size,
            carton_dimensions_cm: sku.carton_dimensions_cm,
            created_at: sku.created_at,
        }
    }
}

#[derive(Deserialize)]
pub struct CreateWarehouseRequest {
    pub code: String,
    pub name: String,
    pub billing_mode: BillingMode,
}

#[derive(Serialize)]
pub struct WarehouseResponse {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub billing_mode: String,
    pub created_at: DateTime<Utc>,
}

impl From<Warehouse> for WarehouseResponse {
    fn from(warehouse: Warehouse) -> Self {
        Self {
            id: warehouse.id,
            code: warehouse.code,
            name: warehouse.name,
            billing_mode: warehouse.billing_mode,
            created_at: warehouse.created_at,
        }
    }
}
