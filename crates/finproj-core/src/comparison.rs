use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::FinprojError;
use crate::projection::ProjectionResult;
use crate::types::*;
use crate::FinprojResult;

/// Summary of two projections over the same horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionComparison {
    pub label_a: String,
    pub label_b: String,
    /// Final cumulative cost of each series
    pub total_a: Money,
    pub total_b: Money,
    /// total_a − total_b
    pub difference: Money,
    pub net_cost_a: Money,
    pub net_cost_b: Money,
    /// net_cost_a − net_cost_b
    pub net_difference: Money,
    /// First period where A's net cost is no greater than B's
    pub break_even_period: Option<u32>,
    /// Per-period net cost of A minus net cost of B
    pub net_deltas: Vec<Money>,
}

/// Compare two projections of equal length.
pub fn compare_projections(
    a: &ProjectionResult,
    b: &ProjectionResult,
) -> FinprojResult<ProjectionComparison> {
    if a.len() != b.len() {
        return Err(FinprojError::invalid(
            "projections",
            format!(
                "Series must have the same length ({} vs {})",
                a.len(),
                b.len()
            ),
        ));
    }
    if a.period_unit != b.period_unit {
        return Err(FinprojError::invalid(
            "projections",
            "Series must use the same period unit",
        ));
    }

    let net_deltas: Vec<Money> = a
        .snapshots
        .iter()
        .zip(&b.snapshots)
        .map(|(sa, sb)| sa.net_cost - sb.net_cost)
        .collect();

    let break_even_period = a
        .snapshots
        .iter()
        .zip(&net_deltas)
        .find(|(_, delta)| **delta <= Decimal::ZERO)
        .map(|(s, _)| s.period);

    Ok(ProjectionComparison {
        label_a: a.label.clone(),
        label_b: b.label.clone(),
        total_a: a.total_cost,
        total_b: b.total_cost,
        difference: a.total_cost - b.total_cost,
        net_cost_a: a.final_net_cost,
        net_cost_b: b.final_net_cost,
        net_difference: a.final_net_cost - b.final_net_cost,
        break_even_period,
        net_deltas,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fees::FeeSet;
    use crate::projection::{run_projection, ProjectionInput};
    use rust_decimal_macros::dec;

    fn linear(label: &str, initial: Money, per_period: Money, periods: u32) -> ProjectionResult {
        run_projection(&ProjectionInput {
            label: label.into(),
            periods,
            period_unit: PeriodUnit::Year,
            initial_cost: initial,
            recurring_cost: per_period,
            cost_growth: Decimal::ZERO,
            asset_value: Decimal::ZERO,
            asset_growth: Decimal::ZERO,
            loan: None,
            fees: FeeSet::default(),
            asset_charges: None,
        })
        .unwrap()
    }

    #[test]
    fn test_break_even_exact_period() {
        // A: 1000 + 100t, B: 300t => A <= B from t = 5
        let a = linear("a", dec!(1000), dec!(100), 10);
        let b = linear("b", Decimal::ZERO, dec!(300), 10);
        let cmp = compare_projections(&a, &b).unwrap();
        assert_eq!(cmp.break_even_period, Some(5));
        assert_eq!(cmp.total_a, dec!(2000));
        assert_eq!(cmp.total_b, dec!(3000));
        assert_eq!(cmp.difference, dec!(-1000));
    }

    #[test]
    fn test_break_even_beyond_horizon() {
        let a = linear("a", dec!(1000), dec!(100), 4);
        let b = linear("b", Decimal::ZERO, dec!(300), 4);
        let cmp = compare_projections(&a, &b).unwrap();
        assert_eq!(cmp.break_even_period, None);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let a = linear("a", dec!(0), dec!(100), 4);
        let b = linear("b", dec!(0), dec!(100), 5);
        assert!(compare_projections(&a, &b).is_err());
    }

    #[test]
    fn test_deltas_per_period() {
        let a = linear("a", dec!(100), dec!(10), 3);
        let b = linear("b", dec!(0), dec!(20), 3);
        let cmp = compare_projections(&a, &b).unwrap();
        assert_eq!(cmp.net_deltas, vec![dec!(90), dec!(80), dec!(70)]);
    }
}
