use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Per-category comparison of a submitted invoice against the engine's
/// independently calculated costs for the same period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryVariance {
    pub cost_category: String,
    pub submitted_amount: Decimal,
    pub calculated_amount: Decimal,
    /// submitted minus calculated
    pub variance: Decimal,
}

pub fn totals_by_category<I>(amounts: I) -> BTreeMap<String, Decimal>
where
    I: IntoIterator<Item = (String, Decimal)>,
{
    let mut totals = BTreeMap::new();
    for (category, amount) in amounts {
        *totals.entry(category).or_insert(Decimal::ZERO) += amount;
    }
    totals
}

/// Variance lines over the union of submitted and calculated categories, so a
/// category billed but never calculated (or calculated but never billed) still
/// shows up.
pub fn category_variances(
    submitted: &BTreeMap<String, Decimal>,
    calculated: &BTreeMap<String, Decimal>,
) -> Vec<CategoryVariance> {
    let categories: BTreeSet<&String> = submitted.keys().chain(calculated.keys()).collect();
    categories
        .into_iter()
        .map(|category| {
            let submitted_amount = submitted.get(category).copied().unwrap_or(Decimal::ZERO);
            let calculated_amount = calculated.get(category).copied().unwrap_or(Decimal::ZERO);
            CategoryVariance {
                cost_category: category.clone(),
                submitted_amount,
                calculated_amount,
                variance: submitted_amount - calculated_amount,
            }
        })
        .collect()
}

pub fn within_tolerance(variances: &[CategoryVariance], tolerance: Decimal) -> bool {
    variances.iter().all(|v| v.variance.abs() <= tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn submitted() -> BTreeMap<String, Decimal> {
        totals_by_category([
            ("Storage".to_string(), dec!(120.00)),
            ("Storage".to_string(), dec!(30.00)),
            ("Carton".to_string(), dec!(55.50)),
        ])
    }

    #[test]
    fn totals_accumulate_per_category() {
        let totals = submitted();
        assert_eq!(totals["Storage"], dec!(150.00));
        assert_eq!(totals["Carton"], dec!(55.50));
    }

    #[test]
    fn variance_is_submitted_minus_calculated() {
        let calculated = totals_by_category([("Storage".to_string(), dec!(140.00))]);
        let variances = category_variances(&submitted(), &calculated);

        let storage = variances
            .iter()
            .find(|v| v.cost_category == "Storage")
            .unwrap();
        assert_eq!(storage.variance, dec!(10.00));

        // submitted but never calculated shows the full submitted amount
        let carton = variances
            .iter()
            .find(|v| v.cost_category == "Carton")
            .unwrap();
        assert_eq!(carton.calculated_amount, dec!(0));
        assert_eq!(carton.variance, dec!(55.50));
    }

    #[test]
    fn calculated_only_categories_appear_as_negative_variance() {
        let submitted = BTreeMap::new();
        let calculated = totals_by_category([("Storage".to_string(), dec!(80.00))]);
        let variances = category_variances(&submitted, &calculated);
        assert_eq!(variances.len(), 1);
        assert_eq!(variances[0].variance, dec!(-80.00));
    }

    #[test]
    fn tolerance_bounds_every_category() {
        let calculated = totals_by_category([
            ("Storage".to_string(), dec!(150.00)),
            ("Carton".to_string(), dec!(55.49)),
        ]);
        let variances = category_variances(&submitted(), &calculated);
        assert!(within_tolerance(&variances, dec!(0.01)));
        assert!(!within_tolerance(&variances, dec!(0.001)));
    }
}
