//! Real-terms conversion. Applied only after a nominal series is complete.

use super::types::MonthlyDataPoint;

/// Multiplier that turns a nominal value `months` from now into today's dollars.
pub fn adjustment_factor(inflation_pct: f64, months: u32) -> f64 {
    if inflation_pct == 0.0 {
        return 1.0;
    }
    let monthly = inflation_pct / 100.0 / 12.0;
    1.0 / (1.0 + monthly).powi(months as i32)
}

pub fn adjust_for_inflation(nominal: f64, inflation_pct: f64, months: u32) -> f64 {
    nominal * adjustment_factor(inflation_pct, months)
}

/// Element `i` of `values` is taken to be month `i + 1`.
pub fn adjust_series(values: &[f64], inflation_pct: f64) -> Vec<f64> {
    values
        .iter()
        .zip(1u32..)
        .map(|(value, month)| adjust_for_inflation(*value, inflation_pct, month))
        .collect()
}

/// Rescales every dollar field of each point by its own month's factor.
pub fn normalize_breakdown(points: &mut [MonthlyDataPoint], inflation_pct: f64) {
    if inflation_pct == 0.0 {
        return;
    }
    for point in points {
        let factor = adjustment_factor(inflation_pct, point.month);
        point.mortgage_balance *= factor;
        point.investment_balance *= factor;
        point.net_worth *= factor;
        point.total_paid *= factor;
        point.interest_paid *= factor;
    }
}
