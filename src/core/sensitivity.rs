use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::debug;

use super::engine::run_comparison_as_of;
use super::types::{CalculatorInputs, Winner};

/// Percentage-point shifts applied to the expected return.
pub const RETURN_VARIATIONS: [f64; 4] = [-2.0, -1.0, 1.0, 2.0];

const MIN_RETURN: f64 = 0.0;
const MAX_RETURN: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityBaseline {
    pub break_even_return: f64,
    pub net_worth_difference: f64,
    pub winner: Winner,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityScenario {
    pub label: String,
    pub description: String,
    pub expected_return: f64,
    pub break_even_return: f64,
    pub net_worth_difference: f64,
    pub winner: Winner,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityAnalysis {
    pub baseline: SensitivityBaseline,
    pub scenarios: Vec<SensitivityScenario>,
}

pub fn run_sensitivity_analysis(inputs: &CalculatorInputs) -> SensitivityAnalysis {
    run_sensitivity_analysis_as_of(inputs, Local::now().date_naive())
}

/// Re-runs the comparison for each return variation that stays within
/// 0..=30%; variations outside the range are skipped.
pub fn run_sensitivity_analysis_as_of(
    inputs: &CalculatorInputs,
    as_of: NaiveDate,
) -> SensitivityAnalysis {
    let base = run_comparison_as_of(inputs, as_of).comparison;
    let baseline = SensitivityBaseline {
        break_even_return: base.break_even_return,
        net_worth_difference: base.net_worth_difference,
        winner: base.winner,
    };

    let mut scenarios = Vec::with_capacity(RETURN_VARIATIONS.len());
    for variation in RETURN_VARIATIONS {
        let expected_return = inputs.expected_return + variation;
        if !(MIN_RETURN..=MAX_RETURN).contains(&expected_return) {
            continue;
        }

        let varied = CalculatorInputs {
            expected_return,
            ..inputs.clone()
        };
        let comparison = run_comparison_as_of(&varied, as_of).comparison;
        scenarios.push(SensitivityScenario {
            label: format!("Return {variation:+}%"),
            description: format!(
                "If investment return is {variation:+}% ({expected_return:.1}% total)"
            ),
            expected_return,
            break_even_return: comparison.break_even_return,
            net_worth_difference: comparison.net_worth_difference,
            winner: comparison.winner,
        });
    }

    debug!(scenarios = scenarios.len(), "sensitivity analysis complete");
    SensitivityAnalysis {
        baseline,
        scenarios,
    }
}
