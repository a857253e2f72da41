/// Effective monthly rate for a Canadian mortgage quoted at `annual_rate_pct`.
///
/// Canadian lenders compound semi-annually, so the quoted rate is halved,
/// then converted to the equivalent rate over six monthly periods.
pub fn monthly_mortgage_rate(annual_rate_pct: f64) -> f64 {
    let semi_annual = annual_rate_pct / 100.0 / 2.0;
    (1.0 + semi_annual).powf(1.0 / 6.0) - 1.0
}

/// Plain monthly compounding, as used for investment returns.
pub fn monthly_investment_rate(annual_rate_pct: f64) -> f64 {
    annual_rate_pct / 100.0 / 12.0
}

/// Level monthly payment that amortizes `principal` over `months`.
pub fn monthly_payment(principal: f64, monthly_rate: f64, months: u32) -> f64 {
    if months == 0 {
        return 0.0;
    }
    if monthly_rate == 0.0 {
        return principal / months as f64;
    }
    let factor = (1.0 + monthly_rate).powi(months as i32);
    principal * (monthly_rate * factor) / (factor - 1.0)
}
