mod engine;
mod home;
mod inflation;
mod investment;
mod mortgage;
mod rates;
mod sensitivity;
mod solver;
pub mod tax;
mod types;

pub use engine::{
    Strategy, TIE_THRESHOLD, build_narrative, classify_winner, format_cad, run_comparison,
    run_comparison_as_of, strategy_breakdown,
};
pub use home::home_value;
pub use inflation::{adjust_for_inflation, adjust_series, adjustment_factor, normalize_breakdown};
pub use investment::{future_value, project_balances};
pub use mortgage::{
    AmortizationRow, MAX_PAYOFF_MONTHS, MortgageTerms, PAID_OFF_THRESHOLD, amortize,
    mortgage_free_date, months_to_payoff,
};
pub use rates::{monthly_investment_rate, monthly_mortgage_rate, monthly_payment};
pub use sensitivity::{
    RETURN_VARIATIONS, SensitivityAnalysis, SensitivityBaseline, SensitivityScenario,
    run_sensitivity_analysis, run_sensitivity_analysis_as_of,
};
pub use solver::{BreakEvenConfig, BreakEvenIteration, BreakEvenResult, solve_break_even};
pub use tax::{TaxRateInfo, net_return, tax_rate_info};
pub use types::{
    AccountType, CalculationResults, CalculatorInputs, ComparisonResult, ExtraPaymentFrequency,
    MonthlyDataPoint, Province, StrategyResult, Winner,
};
