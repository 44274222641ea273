use rust_decimal::Decimal;

use super::pallets::pallets_for;

pub const PALLET_RATE_NAME: &str = "pallet";
pub const CUBIC_FOOT_RATE_NAME: &str = "cubic foot";

/// Quantity basis for a warehouse's storage billing. The two bases must never
/// be conflated: pallet warehouses bill pallet counts at weekly rates,
/// cubic-foot warehouses bill carton volume at monthly rates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StorageBasis {
    PalletWeek { cartons_per_pallet: i32 },
    CubicFootMonth { cubic_feet_per_carton: f64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyCharge {
    pub quantity_charged: i64,
    pub storage_unit: &'static str,
    pub applicable_weekly_rate: Decimal,
    pub calculated_weekly_cost: Decimal,
}

/// Weeks per month used to convert monthly cubic-foot rates to weekly.
fn weeks_per_month() -> Decimal {
    Decimal::new(433, 2)
}

/// Cost of storing `cartons` for one week. `rate` is the resolved rate value:
/// per pallet per week in pallet mode, per cubic foot per month in cubic-foot
/// mode.
pub fn weekly_charge(cartons: i32, basis: StorageBasis, rate: Decimal) -> WeeklyCharge {
    match basis {
        StorageBasis::PalletWeek { cartons_per_pallet } => {
            let pallets = i64::from(pallets_for(cartons, cartons_per_pallet));
            WeeklyCharge {
                quantity_charged: pallets,
                storage_unit: PALLET_RATE_NAME,
                applicable_weekly_rate: rate,
                calculated_weekly_cost: (rate * Decimal::from(pallets)).round_dp(2),
            }
        }
        StorageBasis::CubicFootMonth {
            cubic_feet_per_carton,
        } => {
            let cubic_feet = (f64::from(cartons.max(0)) * cubic_feet_per_carton).ceil() as i64;
            let weekly_rate = (rate / weeks_per_month()).round_dp(4);
            WeeklyCharge {
                quantity_charged: cubic_feet,
                storage_unit: CUBIC_FOOT_RATE_NAME,
                applicable_weekly_rate: weekly_rate,
                calculated_weekly_cost: (weekly_rate * Decimal::from(cubic_feet)).round_dp(2),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn pallet_mode_bills_rounded_up_pallets_at_the_weekly_rate() {
        let charge = weekly_charge(
            50,
            StorageBasis::PalletWeek {
                cartons_per_pallet: 14,
            },
            dec!(6.50),
        );
        assert_eq!(charge.quantity_charged, 4);
        assert_eq!(charge.storage_unit, PALLET_RATE_NAME);
        assert_eq!(charge.applicable_weekly_rate, dec!(6.50));
        assert_eq!(charge.calculated_weekly_cost, dec!(26.00));
    }

    #[test]
    fn cubic_foot_mode_converts_the_monthly_rate_to_weekly() {
        let charge = weekly_charge(
            100,
            StorageBasis::CubicFootMonth {
                cubic_feet_per_carton: 1.5,
            },
            dec!(0.87),
        );
        assert_eq!(charge.quantity_charged, 150);
        assert_eq!(charge.storage_unit, CUBIC_FOOT_RATE_NAME);
        // 0.87 / 4.33 = 0.2009...
        assert_eq!(charge.applicable_weekly_rate, dec!(0.2009));
        assert_eq!(charge.calculated_weekly_cost, dec!(30.14));
    }

    #[test]
    fn cubic_feet_round_up_to_whole_units() {
        let charge = weekly_charge(
            3,
            StorageBasis::CubicFootMonth {
                cubic_feet_per_carton: 1.1,
            },
            dec!(4.33),
        );
        // 3.3 cubic feet charges as 4
        assert_eq!(charge.quantity_charged, 4);
    }

    #[test]
    fn zero_cartons_charge_nothing_in_either_mode() {
        let pallet = weekly_charge(
            0,
            StorageBasis::PalletWeek {
                cartons_per_pallet: 14,
            },
            dec!(6.50),
        );
        assert_eq!(pallet.quantity_charged, 0);
        assert_eq!(pallet.calculated_weekly_cost, dec!(0.00));

        let cubic = weekly_charge(
            0,
            StorageBasis::CubicFootMonth {
                cubic_feet_per_carton: 1.5,
            },
            dec!(0.87),
        );
        assert_eq!(cubic.quantity_charged, 0);
        assert_eq!(cubic.calculated_weekly_cost, dec!(0.00));
    }

    #[test]
    fn identical_inputs_produce_identical_charges() {
        let basis = StorageBasis::PalletWeek {
            cartons_per_pallet: 12,
        };
        assert_eq!(
            weekly_charge(90, basis, dec!(5.25)),
            weekly_charge(90, basis, dec!(5.25))
        );
    }
}
