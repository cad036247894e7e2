use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

use finproj_core::comparison::compare_projections;
use finproj_core::projection::{run_projection, ProjectionInput, ProjectionResult};
use finproj_core::with_metadata;

use crate::input;

/// Arguments for a raw projection
#[derive(Args)]
pub struct ProjectArgs {
    /// Path to a JSON/YAML ProjectionInput (or pipe it on stdin)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_project(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let projection_input: ProjectionInput = input::from_file_or_stdin(args.input.as_deref())?
        .ok_or("--input <file> or stdin required for a projection")?;

    let start = Instant::now();
    let result = run_projection(&projection_input)?;
    let elapsed = start.elapsed().as_micros() as u64;

    let warnings = balance_warning(&result).into_iter().collect();
    Ok(serde_json::to_value(with_metadata(
        "Per-period projection of cost, asset value and loan balance",
        &projection_input,
        warnings,
        elapsed,
        result,
    ))?)
}

fn balance_warning(result: &ProjectionResult) -> Option<String> {
    let last = result.snapshots.last()?;
    if last.outstanding_balance.is_zero() {
        return None;
    }
    Some(format!(
        "Loan is not repaid within the horizon; {} outstanding after period {}",
        last.outstanding_balance.round_dp(2),
        last.period
    ))
}

/// Two scenarios to compare, A against B.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareInput {
    pub a: ProjectionInput,
    pub b: ProjectionInput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CompareOutput {
    comparison: finproj_core::comparison::ProjectionComparison,
    a: ProjectionResult,
    b: ProjectionResult,
}

/// Arguments for comparing two projections
#[derive(Args)]
pub struct CompareArgs {
    /// File holding {"a": ProjectionInput, "b": ProjectionInput}
    #[arg(long, conflicts_with_all = ["a", "b"])]
    pub input: Option<String>,

    /// File holding the first ProjectionInput
    #[arg(long, requires = "b")]
    pub a: Option<String>,

    /// File holding the second ProjectionInput
    #[arg(long, requires = "a")]
    pub b: Option<String>,
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let compare_input: CompareInput = match (args.a.as_deref(), args.b.as_deref()) {
        (Some(a), Some(b)) => CompareInput {
            a: input::file::read_input(a)?,
            b: input::file::read_input(b)?,
        },
        _ => input::from_file_or_stdin(args.input.as_deref())?
            .ok_or("--a <file> --b <file>, --input <file> or stdin required for compare")?,
    };

    let start = Instant::now();
    let a = run_projection(&compare_input.a)?;
    let b = run_projection(&compare_input.b)?;
    let comparison = compare_projections(&a, &b)?;
    let elapsed = start.elapsed().as_micros() as u64;

    let mut warnings = Vec::new();
    if comparison.break_even_period.is_none() {
        warnings.push(format!(
            "'{}' never becomes cheaper than '{}' within the horizon",
            comparison.label_a, comparison.label_b
        ));
    }

    Ok(serde_json::to_value(with_metadata(
        "Period-by-period comparison of net cost",
        &compare_input,
        warnings,
        elapsed,
        CompareOutput { comparison, a, b },
    ))?)
}
