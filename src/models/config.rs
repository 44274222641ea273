use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::calc::resolver::EffectiveDated;

/// Versioned pallet configuration; scope = (warehouse, SKU). Superseded by
/// creating a new version, never deleted.
#[derive(Debug, FromRow)]
pub struct WarehouseSkuConfig {
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

impl EffectiveDated for WarehouseSkuConfig {
    fn effective_date(&self) -> NaiveDate {
        self.effective_date
    }
    fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }
}

/// Versioned cost rate; scope = (warehouse, category, name).
#[derive(Debug, FromRow)]
pub struct CostRate {
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

impl EffectiveDated for CostRate {
    fn effective_date(&self) -> NaiveDate {
        self.effective_date
    }
    fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }
}

/// Closed set of cost categories, validated at ingestion. Free-text categories
/// are rejected rather than trusted at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CostCategory {
    Container,
    Carton,
    Pallet,
    Storage,
    Unit,
    Shipment,
    Accessorial,
}

impl CostCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CostCategory::Container => "Container",
            CostCategory::Carton => "Carton",
            CostCategory::Pallet => "Pallet",
            CostCategory::Storage => "Storage",
            CostCategory::Unit => "Unit",
            CostCategory::Shipment => "Shipment",
            CostCategory::Accessorial => "Accessorial",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Container" => Some(CostCategory::Container),
            "Carton" => Some(CostCategory::Carton),
            "Pallet" => Some(CostCategory::Pallet),
            "Storage" => Some(CostCategory::Storage),
            "Unit" => Some(CostCategory::Unit),
            "Shipment" => Some(CostCategory::Shipment),
            "Accessorial" => Some(CostCategory::Accessorial),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_category_is_a_closed_set() {
        assert_eq!(CostCategory::parse("Storage"), Some(CostCategory::Storage));
        assert_eq!(CostCategory::parse("storage"), None);
        assert_eq!(CostCategory::parse("Handling"), None);
    }
}
