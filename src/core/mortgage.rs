use chrono::{Months, NaiveDate};

use super::rates::monthly_mortgage_rate;
use super::types::ExtraPaymentFrequency;

/// Balances at or below this are treated as paid off.
pub const PAID_OFF_THRESHOLD: f64 = 0.01;

/// Open-ended payoff simulations stop after 50 years.
pub const MAX_PAYOFF_MONTHS: u32 = 50 * 12;

#[derive(Debug, Clone, Copy)]
pub struct MortgageTerms {
    pub balance: f64,
    /// Annual rate in percent, compounded semi-annually.
    pub annual_rate: f64,
    pub regular_payment: f64,
    pub extra_payment: f64,
    pub extra_frequency: ExtraPaymentFrequency,
}

impl MortgageTerms {
    pub fn without_extra(self) -> Self {
        Self {
            extra_payment: 0.0,
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmortizationRow {
    /// 1-based month index.
    pub month: u32,
    pub regular_payment: f64,
    pub extra_payment: f64,
    pub interest: f64,
    pub principal: f64,
    pub balance: f64,
    pub total_paid: f64,
    pub interest_paid: f64,
}

/// Month-by-month schedule, at most `horizon_months` rows.
///
/// Rows stop at the month the balance is paid off; callers sharing a longer
/// horizon pad with the terminal row. The balance never increases unless a
/// month's payment is below its interest, in which case the shortfall is
/// capitalized.
pub fn amortize(terms: MortgageTerms, horizon_months: u32) -> Vec<AmortizationRow> {
    let monthly_rate = monthly_mortgage_rate(terms.annual_rate);
    let mut rows = Vec::with_capacity(horizon_months as usize);

    let mut balance = terms.balance;
    let mut total_paid = 0.0;
    let mut interest_paid = 0.0;

    for month in 0..horizon_months {
        if balance <= PAID_OFF_THRESHOLD {
            break;
        }

        let extra = terms
            .extra_frequency
            .amount_for_month(terms.extra_payment, month);
        let payment = terms.regular_payment + extra;
        let interest = balance * monthly_rate;
        let principal = (payment - interest).min(balance);
        balance -= principal;
        total_paid += payment;
        interest_paid += interest;

        let paid_off = balance <= PAID_OFF_THRESHOLD;
        rows.push(AmortizationRow {
            month: month + 1,
            regular_payment: terms.regular_payment,
            extra_payment: extra,
            interest,
            principal,
            balance: if paid_off { 0.0 } else { balance },
            total_paid,
            interest_paid,
        });

        if paid_off {
            break;
        }
    }

    rows
}

/// Months until payoff with no horizon limit.
///
/// `None` when the regular payment cannot cover the first month's interest,
/// or when payoff takes longer than [`MAX_PAYOFF_MONTHS`].
pub fn months_to_payoff(terms: MortgageTerms) -> Option<u32> {
    let monthly_rate = monthly_mortgage_rate(terms.annual_rate);
    if terms.balance <= PAID_OFF_THRESHOLD {
        return Some(0);
    }
    if terms.regular_payment <= terms.balance * monthly_rate {
        return None;
    }

    let mut balance = terms.balance;
    let mut months = 0;
    while balance > PAID_OFF_THRESHOLD && months < MAX_PAYOFF_MONTHS {
        let extra = terms
            .extra_frequency
            .amount_for_month(terms.extra_payment, months);
        let payment = terms.regular_payment + extra;
        balance -= payment - balance * monthly_rate;
        months += 1;
    }

    if balance > PAID_OFF_THRESHOLD {
        return None;
    }
    Some(months)
}

pub fn mortgage_free_date(terms: MortgageTerms, as_of: NaiveDate) -> Option<NaiveDate> {
    months_to_payoff(terms).and_then(|months| date_after_months(as_of, months))
}

pub fn date_after_months(as_of: NaiveDate, months: u32) -> Option<NaiveDate> {
    as_of.checked_add_months(Months::new(months))
}
