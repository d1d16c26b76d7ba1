//! Budget line variance calculations.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Variance of a single line: allocated minus actual spend.
///
/// This is the stored figure on every budget line; the storage layer
/// calls it at every write of either operand so the cache never drifts
/// from the formula.
#[must_use]
pub fn variance_of(allocated_amount: Decimal, actual_spend: Decimal) -> Decimal {
    allocated_amount - actual_spend
}

/// Classification of a variance figure for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceStatus {
    /// Spend is under the allocation.
    Favorable,
    /// Spend exceeds the allocation.
    Unfavorable,
    /// Spend matches the allocation exactly.
    OnBudget,
}

impl VarianceStatus {
    /// Classifies a signed variance figure.
    #[must_use]
    pub fn classify(variance: Decimal) -> Self {
        match variance.cmp(&Decimal::ZERO) {
            Ordering::Greater => Self::Favorable,
            Ordering::Less => Self::Unfavorable,
            Ordering::Equal => Self::OnBudget,
        }
    }
}

/// Aggregated figures over a set of budget lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineTotals {
    /// Sum of allocated amounts.
    pub allocated: Decimal,
    /// Sum of actual spend.
    pub actual_spend: Decimal,
    /// Sum of stored variances.
    pub variance: Decimal,
}

impl LineTotals {
    /// Accumulates totals from (allocated, actual) pairs.
    pub fn accumulate<I>(lines: I) -> Self
    where
        I: IntoIterator<Item = (Decimal, Decimal)>,
    {
        let mut totals = Self {
            allocated: Decimal::ZERO,
            actual_spend: Decimal::ZERO,
            variance: Decimal::ZERO,
        };
        for (allocated, actual) in lines {
            totals.allocated += allocated;
            totals.actual_spend += actual;
            totals.variance += variance_of(allocated, actual);
        }
        totals
    }

    /// Classification of the aggregate variance.
    #[must_use]
    pub fn status(&self) -> VarianceStatus {
        VarianceStatus::classify(self.variance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_variance_is_allocated_minus_actual() {
        assert_eq!(variance_of(dec!(1000), dec!(250)), dec!(750));
        assert_eq!(variance_of(dec!(100), dec!(100)), dec!(0));
        assert_eq!(variance_of(dec!(100), dec!(140.50)), dec!(-40.50));
    }

    #[test]
    fn test_variance_with_negative_operands() {
        // Amounts carry no sign constraint; the formula stays linear.
        assert_eq!(variance_of(dec!(-50), dec!(25)), dec!(-75));
        assert_eq!(variance_of(dec!(50), dec!(-25)), dec!(75));
    }

    #[test]
    fn test_classify() {
        assert_eq!(VarianceStatus::classify(dec!(10)), VarianceStatus::Favorable);
        assert_eq!(
            VarianceStatus::classify(dec!(-0.01)),
            VarianceStatus::Unfavorable
        );
        assert_eq!(VarianceStatus::classify(dec!(0)), VarianceStatus::OnBudget);
    }

    #[test]
    fn test_totals_accumulate() {
        let totals = LineTotals::accumulate(vec![
            (dec!(1000), dec!(400)),
            (dec!(500), dec!(600)),
            (dec!(250), dec!(0)),
        ]);
        assert_eq!(totals.allocated, dec!(1750));
        assert_eq!(totals.actual_spend, dec!(1000));
        assert_eq!(totals.variance, dec!(750));
        assert_eq!(totals.status(), VarianceStatus::Favorable);
    }

    #[test]
    fn test_totals_of_nothing() {
        let totals = LineTotals::accumulate(Vec::new());
        assert_eq!(totals.allocated, dec!(0));
        assert_eq!(totals.variance, dec!(0));
        assert_eq!(totals.status(), VarianceStatus::OnBudget);
    }

    #[test]
    fn test_totals_variance_equals_formula_over_sums() {
        let lines = vec![(dec!(10.25), dec!(3.75)), (dec!(8), dec!(12))];
        let totals = LineTotals::accumulate(lines.clone());
        let expected: Decimal = lines.iter().map(|(a, s)| variance_of(*a, *s)).sum();
        assert_eq!(totals.variance, expected);
        assert_eq!(
            totals.variance,
            variance_of(totals.allocated, totals.actual_spend)
        );
    }
}
