/// Cartons-to-pallets conversion, always rounded up. Zero cartons or an
/// unusable conversion factor charges zero pallets.
pub fn pallets_for(cartons: i32, cartons_per_pallet: i32) -> i32 {
    if cartons <= 0 || cartons_per_pallet <= 0 {
        return 0;
    }
    (cartons + cartons_per_pallet - 1) / cartons_per_pallet
}

/// Where the cartons-per-pallet figure for a transaction came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PalletBasis {
    /// Supplied on the transaction itself.
    Override(i32),
    /// Resolved from the warehouse/SKU configuration as of the transaction date.
    Configured(i32),
    /// No override and no configuration. Historical data may legitimately lack
    /// a basis, so this is a warning, not a hard failure.
    Missing,
}

impl PalletBasis {
    pub fn select(override_cpp: Option<i32>, configured_cpp: Option<i32>) -> Self {
        match (override_cpp, configured_cpp) {
            (Some(cpp), _) if cpp > 0 => PalletBasis::Override(cpp),
            (_, Some(cpp)) if cpp > 0 => PalletBasis::Configured(cpp),
            _ => PalletBasis::Missing,
        }
    }

    pub fn cartons_per_pallet(&self) -> Option<i32> {
        match self {
            PalletBasis::Override(cpp) | PalletBasis::Configured(cpp) => Some(*cpp),
            PalletBasis::Missing => None,
        }
    }
}

const DEFAULT_CUBIC_FEET: f64 = 1.5;
const MIN_CUBIC_FEET: f64 = 0.1;
const CUBIC_CM_PER_CUBIC_FOOT: f64 = 28_316.8;

/// Carton volume used by cubic-foot billing. Dimensions are "LxWxH" in
/// centimeters; absent or unparseable dimensions fall back to 1.5 cubic feet
/// per carton, and parsed volumes are floored at 0.1.
pub fn cubic_feet_per_carton(dimensions_cm: Option<&str>) -> f64 {
    let Some(dims) = dimensions_cm else {
        return DEFAULT_CUBIC_FEET;
    };
    let parts: Vec<f64> = dims
        .to_ascii_lowercase()
        .split('x')
        .map(|p| p.trim().trim_end_matches("cm").trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .unwrap_or_default();
    if parts.len() != 3 {
        return DEFAULT_CUBIC_FEET;
    }
    let volume = parts[0] * parts[1] * parts[2] / CUBIC_CM_PER_CUBIC_FOOT;
    volume.max(MIN_CUBIC_FEET)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pallet_count_rounds_up() {
        // 50 cartons at 14 per pallet takes 4 pallets
        assert_eq!(pallets_for(50, 14), 4);
        assert_eq!(pallets_for(14, 14), 1);
        assert_eq!(pallets_for(15, 14), 2);
        assert_eq!(pallets_for(1, 14), 1);
    }

    #[test]
    fn zero_or_invalid_inputs_charge_nothing() {
        assert_eq!(pallets_for(0, 14), 0);
        assert_eq!(pallets_for(50, 0), 0);
        assert_eq!(pallets_for(-5, 14), 0);
    }

    #[test]
    fn override_wins_over_configuration() {
        assert_eq!(PalletBasis::select(Some(10), Some(14)), PalletBasis::Override(10));
        assert_eq!(PalletBasis::select(None, Some(14)), PalletBasis::Configured(14));
        assert_eq!(PalletBasis::select(None, None), PalletBasis::Missing);
        // a nonsense override falls through to the configuration
        assert_eq!(PalletBasis::select(Some(0), Some(14)), PalletBasis::Configured(14));
    }

    #[test]
    fn missing_basis_has_no_conversion_factor() {
        assert_eq!(PalletBasis::Missing.cartons_per_pallet(), None);
        assert_eq!(PalletBasis::Override(12).cartons_per_pallet(), Some(12));
    }

    #[test]
    fn carton_volume_parses_dimension_strings() {
        // 60x40x30 cm = 72,000 cubic cm = ~2.54 cubic feet
        let volume = cubic_feet_per_carton(Some("60x40x30 cm"));
        assert!((volume - 2.5427).abs() < 0.001);

        // case and spacing are tolerated
        let volume = cubic_feet_per_carton(Some("60 X 40 X 30"));
        assert!((volume - 2.5427).abs() < 0.001);
    }

    #[test]
    fn carton_volume_falls_back_on_bad_input() {
        assert_eq!(cubic_feet_per_carton(None), DEFAULT_CUBIC_FEET);
        assert_eq!(cubic_feet_per_carton(Some("not dimensions")), DEFAULT_CUBIC_FEET);
        assert_eq!(cubic_feet_per_carton(Some("60x40")), DEFAULT_CUBIC_FEET);
    }

    #[test]
    fn carton_volume_is_floored() {
        assert_eq!(cubic_feet_per_carton(Some("1x1x1")), MIN_CUBIC_FEET);
    }
}
