use serde::Serialize;

use super::engine::net_worth_difference_at;
use super::types::CalculatorInputs;

#[derive(Debug, Clone, Copy)]
pub struct BreakEvenConfig {
    /// Lowest gross annual return searched, in percent.
    pub search_min: f64,
    /// Highest gross annual return searched, in percent.
    pub search_max: f64,
    /// Net worth difference (CAD) treated as equal.
    pub tolerance: f64,
    pub max_iterations: u32,
}

impl Default for BreakEvenConfig {
    fn default() -> Self {
        Self {
            search_min: 0.0,
            search_max: 30.0,
            tolerance: 100.0,
            max_iterations: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakEvenIteration {
    pub iteration: u32,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub candidate_return: f64,
    pub net_worth_difference: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakEvenResult {
    pub break_even_return: f64,
    pub iterations: Vec<BreakEvenIteration>,
    pub converged: bool,
}

/// Bisects the gross expected return until both strategies end within
/// `tolerance` of each other.
///
/// Always yields a return inside the search range. When the true break-even
/// lies outside it, the result converges onto the nearer bound.
pub fn solve_break_even(inputs: &CalculatorInputs, config: BreakEvenConfig) -> BreakEvenResult {
    let mut lo = config.search_min;
    let mut hi = config.search_max;
    let mut best = (lo + hi) * 0.5;
    let mut converged = false;
    let mut iterations = Vec::with_capacity(config.max_iterations as usize);

    for it in 1..=config.max_iterations {
        let mid = (lo + hi) * 0.5;
        let difference = net_worth_difference_at(inputs, mid);
        iterations.push(BreakEvenIteration {
            iteration: it,
            lower_bound: lo,
            upper_bound: hi,
            candidate_return: mid,
            net_worth_difference: difference,
        });
        best = mid;

        if difference.abs() < config.tolerance {
            converged = true;
            break;
        }

        // Investing still wins, so the break-even return is lower.
        if difference > 0.0 {
            hi = mid;
        } else {
            lo = mid;
        }
    }

    BreakEvenResult {
        break_even_return: best,
        iterations,
        converged,
    }
}
