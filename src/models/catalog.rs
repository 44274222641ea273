use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::calc::storage::{CUBIC_FOOT_RATE_NAME, PALLET_RATE_NAME};

#[derive(Debug, FromRow)]
pub struct Sku {
    pub id: i64,
    pub sku_code: String,
    pub description: Option<String>,
    pub units_per_carton: i32,
    pub pack_size: i32,
    pub carton_dimensions_cm: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub struct Warehouse {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub billing_mode: String,
    pub created_at: DateTime<Utc>,
}

/// How a warehouse bills storage. Fixed per warehouse, never per transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingMode {
    PalletWeek,
    CubicFootMonth,
}

impl BillingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingMode::PalletWeek => "pallet_week",
            BillingMode::CubicFootMonth => "cubic_foot_month",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pallet_week" => Some(BillingMode::PalletWeek),
            "cubic_foot_month" => Some(BillingMode::CubicFootMonth),
            _ => None,
        }
    }

    /// Name fragment identifying the Storage rate applicable to this mode.
    pub fn storage_rate_name(&self) -> &'static str {
        match self {
            BillingMode::PalletWeek => PALLET_RATE_NAME,
            BillingMode::CubicFootMonth => CUBIC_FOOT_RATE_NAME,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn billing_mode_round_trips_through_strings() {
        assert_eq!(BillingMode::parse("pallet_week"), Some(BillingMode::PalletWeek));
        assert_eq!(
            BillingMode::parse(BillingMode::CubicFootMonth.as_str()),
            Some(BillingMode::CubicFootMonth)
        );
        assert_eq!(BillingMode::parse("monthly"), None);
    }

    #[test]
    fn each_mode_names_its_own_rate() {
        assert_eq!(BillingMode::PalletWeek.storage_rate_name(), "pallet");
        assert_eq!(BillingMode::CubicFootMonth.storage_rate_name(), "cubic foot");
    }
}
