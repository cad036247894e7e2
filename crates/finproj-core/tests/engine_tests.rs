use finproj_core::amortization::build_schedule;
use finproj_core::brackets::{Bracket, BracketSchedule};
use finproj_core::comparison::compare_projections;
use finproj_core::fees::FeeSet;
use finproj_core::projection::{run_projection, ProjectionInput};
use finproj_core::rate_solver::{estimate_effective_rate, PaymentStream};
use finproj_core::time_value::amortized_payment;
use finproj_core::{FinprojError, LoanTerms, PeriodUnit, MAX_PERIODS};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn commission_tiers() -> BracketSchedule {
    BracketSchedule::new(vec![
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
    .unwrap()
}

fn home_purchase(periods: u32) -> ProjectionInput {
    ProjectionInput {
        label: "buy".into(),
        periods,
        period_unit: PeriodUnit::Year,
        initial_cost: dec!(75000),
        recurring_cost: Decimal::ZERO,
        cost_growth: Decimal::ZERO,
        asset_value: dec!(300000),
        asset_growth: dec!(0.03),
        loan: Some(LoanTerms {
            principal: dec!(240000),
            annual_rate: dec!(0.06),
            term_periods: 30,
            period_unit: PeriodUnit::Year,
        }),
        fees: FeeSet::default(),
        asset_charges: Some(BracketSchedule::flat(dec!(0.01)).unwrap()),
    }
}

fn renting(periods: u32) -> ProjectionInput {
    ProjectionInput {
        label: "rent".into(),
        periods,
        period_unit: PeriodUnit::Year,
        initial_cost: Decimal::ZERO,
        recurring_cost: dec!(12000),
        cost_growth: dec!(0.04),
        asset_value: Decimal::ZERO,
        asset_growth: Decimal::ZERO,
        loan: None,
        fees: FeeSet::default(),
        asset_charges: None,
    }
}

// ===========================================================================
// Known-answer scenarios
// ===========================================================================

#[test]
fn test_mortgage_payment_scenario() {
    let terms = LoanTerms {
        principal: dec!(200000),
        annual_rate: dec!(0.06),
        term_periods: 360,
        period_unit: PeriodUnit::Month,
    };
    let payment = terms.payment().unwrap();
    assert_eq!(payment.round_dp(2), dec!(1199.10));
}

#[test]
fn test_flat_commission_scenario() {
    let flat = BracketSchedule::flat(dec!(0.05)).unwrap();
    assert_eq!(flat.apply(dec!(50000)).unwrap(), dec!(2500));
}

#[test]
fn test_tiered_commission_scenario() {
    assert_eq!(commission_tiers().apply(dec!(60000)).unwrap(), dec!(2700));
}

#[test]
fn test_effective_rate_one_period_boundary() {
    let stream = PaymentStream::level(dec!(5000), 1);
    let est = estimate_effective_rate(dec!(5000), &stream, dec!(0.08)).unwrap();
    assert!(est.converged);
    assert!(est.rate.abs() < dec!(0.000001));
}

// ===========================================================================
// Projection + comparison
// ===========================================================================

#[test]
fn test_projection_snapshot_per_period() {
    let result = run_projection(&home_purchase(10)).unwrap();
    assert_eq!(result.snapshots.len(), 10);
    let periods: Vec<u32> = result.snapshots.iter().map(|s| s.period).collect();
    assert_eq!(periods, (1..=10).collect::<Vec<_>>());
}

#[test]
fn test_cumulative_is_running_sum() {
    let result = run_projection(&home_purchase(10)).unwrap();
    let mut running = result.initial_cost;
    for s in &result.snapshots {
        running += s.period_cost;
        assert_eq!(s.cumulative_cost, running);
    }
}

#[test]
fn test_rent_vs_buy_break_even() {
    let buy = run_projection(&home_purchase(30)).unwrap();
    let rent = run_projection(&renting(30)).unwrap();
    let cmp = compare_projections(&buy, &rent).unwrap();

    let period = cmp.break_even_period.expect("buying should break even within 30 years");
    assert_eq!(period, 4);
    let idx = (period - 1) as usize;
    assert!(buy.snapshots[idx].net_cost <= rent.snapshots[idx].net_cost);
    if idx > 0 {
        assert!(buy.snapshots[idx - 1].net_cost > rent.snapshots[idx - 1].net_cost);
    }
}

#[test]
fn test_break_even_none_inside_short_horizon() {
    let buy = run_projection(&home_purchase(3)).unwrap();
    let rent = run_projection(&renting(3)).unwrap();
    let cmp = compare_projections(&buy, &rent).unwrap();
    assert_eq!(cmp.break_even_period, None);
}

#[test]
fn test_projection_overflow_is_an_error() {
    let mut input = home_purchase(10);
    input.asset_value = Decimal::MAX / dec!(2);
    input.asset_growth = dec!(3);
    assert!(matches!(
        run_projection(&input),
        Err(FinprojError::Overflow { .. })
    ));
}

#[test]
fn test_term_limits_shared_by_engine() {
    let long_loan = LoanTerms {
        principal: dec!(1000),
        annual_rate: Decimal::ZERO,
        term_periods: MAX_PERIODS + 1,
        period_unit: PeriodUnit::Month,
    };
    assert!(matches!(
        build_schedule(&long_loan, Decimal::ZERO, None),
        Err(FinprojError::InvalidInput { .. })
    ));
    assert!(matches!(
        estimate_effective_rate(dec!(1000), &PaymentStream::level(dec!(1), MAX_PERIODS + 1), dec!(0.01)),
        Err(FinprojError::InvalidInput { .. })
    ));
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_zero_rate_payment_is_linear(principal in 0u32..5_000_000, periods in 1u32..600) {
        let p = Decimal::from(principal);
        let payment = amortized_payment(p, Decimal::ZERO, periods).unwrap();
        prop_assert_eq!(payment, p / Decimal::from(periods));
    }

    #[test]
    fn prop_schedule_amortizes_fully(
        principal in 1_000u32..2_000_000,
        rate_bp in 1u32..2_000,
        periods in 1u32..480,
    ) {
        let terms = LoanTerms {
            principal: Decimal::from(principal),
            annual_rate: Decimal::from(rate_bp) / dec!(10000),
            term_periods: periods,
            period_unit: PeriodUnit::Month,
        };
        let sched = build_schedule(&terms, Decimal::ZERO, None).unwrap();
        let last = sched.rows.last().unwrap();
        prop_assert_eq!(last.closing_balance, Decimal::ZERO);

        let n_times_payment = sched.payment * Decimal::from(periods);
        let split = sched.total_interest + sched.total_principal;
        prop_assert!((n_times_payment - split).abs() < dec!(0.0001));
    }

    #[test]
    fn prop_bracket_schedule_is_monotonic(a in 0u32..200_000, b in 0u32..200_000) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let tiers = commission_tiers();
        prop_assert!(tiers.apply(Decimal::from(lo)).unwrap() <= tiers.apply(Decimal::from(hi)).unwrap());
    }

    #[test]
    fn prop_projection_is_idempotent(periods in 1u32..40, growth_bp in 0u32..800) {
        let mut input = home_purchase(periods);
        input.asset_growth = Decimal::from(growth_bp) / dec!(10000);
        let first = run_projection(&input).unwrap();
        let second = run_projection(&input).unwrap();
        prop_assert_eq!(first, second);
    }
}
