use chrono::NaiveDate;
use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ExtraPaymentFrequency {
    Monthly,
    Annual,
    OneTime,
}

impl ExtraPaymentFrequency {
    /// Amount paid in zero-based month `month` for a recurring `amount`.
    ///
    /// Annual payments land at each year end (months 12, 24, ... in 1-based
    /// terms); one-time payments land in the first month only.
    pub fn amount_for_month(self, amount: f64, month: u32) -> f64 {
        let applies = match self {
            ExtraPaymentFrequency::Monthly => true,
            ExtraPaymentFrequency::Annual => (month + 1) % 12 == 0,
            ExtraPaymentFrequency::OneTime => month == 0,
        };
        if applies { amount } else { 0.0 }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AccountType {
    Tfsa,
    Fhsa,
    Rrsp,
    Resp,
    NonRegistered,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Province {
    Ab,
    Bc,
    Mb,
    Nb,
    Nl,
    Ns,
    Nt,
    Nu,
    On,
    Pe,
    Qc,
    Sk,
    Yt,
}

impl Province {
    pub const ALL: [Province; 13] = [
        Province::Ab,
        Province::Bc,
        Province::Mb,
        Province::Nb,
        Province::Nl,
        Province::Ns,
        Province::Nt,
        Province::Nu,
        Province::On,
        Province::Pe,
        Province::Qc,
        Province::Sk,
        Province::Yt,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Province::Ab => "AB",
            Province::Bc => "BC",
            Province::Mb => "MB",
            Province::Nb => "NB",
            Province::Nl => "NL",
            Province::Ns => "NS",
            Province::Nt => "NT",
            Province::Nu => "NU",
            Province::On => "ON",
            Province::Pe => "PE",
            Province::Qc => "QC",
            Province::Sk => "SK",
            Province::Yt => "YT",
        }
    }
}

/// One calculation request. Rates are annual percentages (5.5 means 5.5%),
/// amounts are CAD.
#[derive(Debug, Clone)]
pub struct CalculatorInputs {
    pub loan_balance: f64,
    /// Falls back to `loan_balance` when absent.
    pub current_home_value: Option<f64>,
    pub interest_rate: f64,
    pub years_remaining: u32,
    pub months_remaining: u32,
    pub regular_payment: f64,
    pub extra_payment: f64,
    pub extra_payment_frequency: ExtraPaymentFrequency,
    pub expected_return: f64,
    pub account_type: AccountType,
    pub province: Province,
    pub gross_income: f64,
    pub home_appreciation_rate: f64,
    pub show_real_terms: bool,
    pub inflation_rate: f64,
}

impl CalculatorInputs {
    /// Comparison horizon, always the remaining mortgage term.
    pub fn horizon_months(&self) -> u32 {
        self.years_remaining * 12 + self.months_remaining
    }

    pub fn home_value(&self) -> f64 {
        self.current_home_value.unwrap_or(self.loan_balance)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyDataPoint {
    /// 1-based month index.
    pub month: u32,
    pub mortgage_balance: f64,
    pub investment_balance: f64,
    pub net_worth: f64,
    /// Cumulative mortgage payments made so far.
    pub total_paid: f64,
    /// Cumulative interest charged so far.
    pub interest_paid: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyResult {
    pub net_worth: f64,
    pub mortgage_balance: f64,
    pub investment_balance: f64,
    pub mortgage_free_date: Option<NaiveDate>,
    pub months_to_mortgage_free: Option<u32>,
    pub total_interest_paid: f64,
    pub total_paid: f64,
    pub monthly_breakdown: Vec<MonthlyDataPoint>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Prepay,
    Invest,
    Tie,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    /// Invest minus prepay terminal net worth.
    pub net_worth_difference: f64,
    pub winner: Winner,
    pub break_even_return: f64,
    pub narrative: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResults {
    pub prepay_strategy: StrategyResult,
    pub invest_strategy: StrategyResult,
    pub comparison: ComparisonResult,
}
