use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::brackets::{BracketPortion, BracketSchedule};
use crate::error::FinprojError;
use crate::fees::FeeSet;
use crate::projection::{run_projection, ProjectionInput};
use crate::types::*;
use crate::FinprojResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommissionStructure {
    /// One rate on every dollar of sales
    Flat { rate: Rate },
    /// Progressive tiers: each rate applies only to sales inside its band
    Tiered { schedule: BracketSchedule },
}

impl CommissionStructure {
    fn schedule(&self) -> FinprojResult<BracketSchedule> {
        match self {
            CommissionStructure::Flat { rate } => BracketSchedule::flat(*rate),
            CommissionStructure::Tiered { schedule } => Ok(schedule.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionInput {
    pub sales: Money,
    pub structure: CommissionStructure,
    #[serde(default)]
    pub base_salary: Money,
    /// Years to project forward; 0 skips the projection
    #[serde(default)]
    pub projection_years: u32,
    #[serde(default)]
    pub sales_growth: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionYear {
    pub year: u32,
    pub sales: Money,
    pub commission: Money,
    pub total_compensation: Money,
    pub cumulative_compensation: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionOutput {
    pub commission: Money,
    /// Commission as a fraction of sales
    pub effective_rate: Rate,
    pub marginal_rate: Rate,
    pub total_compensation: Money,
    pub tiers: Vec<BracketPortion>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub years: Vec<CommissionYear>,
}

pub fn calculate_commission(
    input: &CommissionInput,
) -> FinprojResult<ComputationOutput<CommissionOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    ensure_non_negative("sales", input.sales)?;
    ensure_non_negative("base_salary", input.base_salary)?;
    ensure_growth_rate("sales_growth", input.sales_growth)?;

    let schedule = input.structure.schedule()?;
    let tiers = schedule.breakdown(input.sales)?;
    let commission = schedule.apply(input.sales)?;
    let effective_rate = if input.sales.is_zero() {
        warnings.push("Sales are zero; effective rate reported as 0".into());
        Decimal::ZERO
    } else {
        commission / input.sales
    };
    let total_compensation = input
        .base_salary
        .checked_add(commission)
        .ok_or_else(|| FinprojError::Overflow {
            context: "total compensation".into(),
        })?;

    let years = if input.projection_years == 0 {
        Vec::new()
    } else {
        project_years(input, &schedule)?
    };

    let output = CommissionOutput {
        commission,
        effective_rate,
        marginal_rate: schedule.marginal_rate(input.sales),
        total_compensation,
        tiers,
        years,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Bracketed commission",
        &serde_json::json!({
            "sales": input.sales.to_string(),
            "base_salary": input.base_salary.to_string(),
            "tiers": schedule.brackets().len(),
            "projection_years": input.projection_years,
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Year-by-year compensation as a yearly projection: sales are the
/// tracked asset growing at `sales_growth`, the commission schedule is
/// the charge levied on it, and base salary is the recurring cost.
fn project_years(
    input: &CommissionInput,
    schedule: &BracketSchedule,
) -> FinprojResult<Vec<CommissionYear>> {
    let projection = run_projection(&ProjectionInput {
        label: "commission".into(),
        periods: input.projection_years,
        period_unit: PeriodUnit::Year,
        initial_cost: Decimal::ZERO,
        recurring_cost: input.base_salary,
        cost_growth: Decimal::ZERO,
        asset_value: input.sales,
        asset_growth: input.sales_growth,
        loan: None,
        fees: FeeSet::default(),
        asset_charges: Some(schedule.clone()),
    })?;

    let mut sales = input.sales;
    let mut years = Vec::with_capacity(projection.len());
    for snapshot in &projection.snapshots {
        years.push(CommissionYear {
            year: snapshot.period,
            sales,
            commission: snapshot.period_cost - input.base_salary,
            total_compensation: snapshot.period_cost,
            cumulative_compensation: snapshot.cumulative_cost,
        });
        // Snapshots hold end-of-year values; next year starts there
        sales = snapshot.asset_value;
    }
    Ok(years)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brackets::Bracket;
    use rust_decimal_macros::dec;

    fn tiered() -> CommissionStructure {
        CommissionStructure::Tiered {
            schedule: BracketSchedule::new(vec![
                Bracket {
                    lower: dec!(0),
                    upper: Some(dec!(25000)),
                    rate: dec!(0.03),
                },
                Bracket {
                    lower: dec!(25000),
                    upper: Some(dec!(50000)),
                    rate: dec!(0.05),
                },
                Bracket {
                    lower: dec!(50000),
                    upper: None,
                    rate: dec!(0.07),
                },
            ])
            .unwrap(),
        }
    }

    #[test]
    fn test_flat_commission() {
        let out = calculate_commission(&CommissionInput {
            sales: dec!(50000),
            structure: CommissionStructure::Flat { rate: dec!(0.05) },
            base_salary: Decimal::ZERO,
            projection_years: 0,
            sales_growth: Decimal::ZERO,
        })
        .unwrap();
        assert_eq!(out.result.commission, dec!(2500));
        assert_eq!(out.result.effective_rate, dec!(0.05));
    }

    #[test]
    fn test_tiered_commission() {
        let out = calculate_commission(&CommissionInput {
            sales: dec!(60000),
            structure: tiered(),
            base_salary: dec!(40000),
            projection_years: 0,
            sales_growth: Decimal::ZERO,
        })
        .unwrap();
        let r = &out.result;
        assert_eq!(r.commission, dec!(2700));
        assert_eq!(r.total_compensation, dec!(42700));
        assert_eq!(r.tiers.len(), 3);
        assert_eq!(r.marginal_rate, dec!(0.07));
        assert_eq!(r.effective_rate, dec!(0.045));
    }

    #[test]
    fn test_projection_years() {
        let out = calculate_commission(&CommissionInput {
            sales: dec!(40000),
            structure: tiered(),
            base_salary: dec!(1000),
            projection_years: 3,
            sales_growth: dec!(0.25),
        })
        .unwrap();
        let years = &out.result.years;
        assert_eq!(years.len(), 3);
        assert_eq!(years[1].sales, dec!(50000));
        // 750 + 1250
        assert_eq!(years[1].commission, dec!(2000));
        assert_eq!(
            years[2].cumulative_compensation,
            years.iter().map(|y| y.total_compensation).sum::<Decimal>()
        );
    }

    #[test]
    fn test_zero_sales_warns() {
        let out = calculate_commission(&CommissionInput {
            sales: Decimal::ZERO,
            structure: tiered(),
            base_salary: Decimal::ZERO,
            projection_years: 0,
            sales_growth: Decimal::ZERO,
        })
        .unwrap();
        assert_eq!(out.result.commission, Decimal::ZERO);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_structure_json() {
        let json = r#"{"type":"flat","rate":"0.1"}"#;
        let s: CommissionStructure = serde_json::from_str(json).unwrap();
        assert_eq!(s, CommissionStructure::Flat { rate: dec!(0.1) });
    }

    #[test]
    fn test_runaway_sales_growth_is_overflow() {
        let err = calculate_commission(&CommissionInput {
            sales: dec!(50000),
            structure: CommissionStructure::Flat { rate: dec!(0.05) },
            base_salary: Decimal::ZERO,
            projection_years: 100,
            sales_growth: dec!(1),
        })
        .unwrap_err();
        assert!(matches!(err, FinprojError::Overflow { .. }));
    }

    #[test]
    fn test_projection_years_capped() {
        let err = calculate_commission(&CommissionInput {
            sales: dec!(50000),
            structure: CommissionStructure::Flat { rate: dec!(0.05) },
            base_salary: Decimal::ZERO,
            projection_years: u32::MAX,
            sales_growth: Decimal::ZERO,
        })
        .unwrap_err();
        assert!(matches!(err, FinprojError::InvalidInput { .. }));
    }
}
