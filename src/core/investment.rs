use super::rates::monthly_investment_rate;
use super::types::ExtraPaymentFrequency;

/// End-of-month investment balances, exactly `months` long.
///
/// Each month grows the balance first, then adds the contribution due that
/// month under `frequency`.
pub fn project_balances(
    contribution: f64,
    annual_return_pct: f64,
    months: u32,
    frequency: ExtraPaymentFrequency,
    initial_balance: f64,
) -> Vec<f64> {
    let monthly_rate = monthly_investment_rate(annual_return_pct);
    let mut balances = Vec::with_capacity(months as usize);
    let mut balance = initial_balance;

    for month in 0..months {
        if monthly_rate != 0.0 {
            balance *= 1.0 + monthly_rate;
        }
        balance += frequency.amount_for_month(contribution, month);
        balances.push(balance);
    }

    balances
}

/// Closed-form terminal value matching the last element of [`project_balances`].
pub fn future_value(
    contribution: f64,
    annual_return_pct: f64,
    months: u32,
    frequency: ExtraPaymentFrequency,
    initial_balance: f64,
) -> f64 {
    if months == 0 {
        return initial_balance;
    }
    let years = months / 12;

    if annual_return_pct == 0.0 {
        let contributed = match frequency {
            ExtraPaymentFrequency::Monthly => contribution * months as f64,
            ExtraPaymentFrequency::Annual => contribution * years as f64,
            ExtraPaymentFrequency::OneTime => contribution,
        };
        return initial_balance + contributed;
    }

    let monthly_rate = monthly_investment_rate(annual_return_pct);
    let growth = |n: u32| (1.0 + monthly_rate).powi(n as i32);
    let grown_initial = initial_balance * growth(months);

    let contributed = match frequency {
        ExtraPaymentFrequency::Monthly => contribution * (growth(months) - 1.0) / monthly_rate,
        ExtraPaymentFrequency::Annual => (1..=years)
            .map(|year| contribution * growth(months - year * 12))
            .sum(),
        ExtraPaymentFrequency::OneTime => contribution * growth(months - 1),
    };

    grown_initial + contributed
}
