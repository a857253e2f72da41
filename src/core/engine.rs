use chrono::{Local, NaiveDate};
use tracing::debug;

use super::home::home_value;
use super::inflation::normalize_breakdown;
use super::investment::project_balances;
use super::mortgage::{MortgageTerms, amortize, date_after_months, months_to_payoff};
use super::solver::{BreakEvenConfig, solve_break_even};
use super::tax::net_return;
use super::types::{
    CalculationResults, CalculatorInputs, ComparisonResult, MonthlyDataPoint, StrategyResult,
    Winner,
};

/// Net worth differences below this are reported as a tie.
pub const TIE_THRESHOLD: f64 = 1_000.0;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Strategy {
    /// Extra payment goes to mortgage principal.
    Prepay,
    /// Extra payment goes to an investment account.
    Invest,
}

pub fn run_comparison(inputs: &CalculatorInputs) -> CalculationResults {
    run_comparison_as_of(inputs, Local::now().date_naive())
}

/// Deterministic comparison; `as_of` anchors the mortgage-free dates.
pub fn run_comparison_as_of(inputs: &CalculatorInputs, as_of: NaiveDate) -> CalculationResults {
    let horizon_months = inputs.horizon_months();
    debug!(
        horizon_months,
        extra_payment = inputs.extra_payment,
        frequency = ?inputs.extra_payment_frequency,
        "starting comparison"
    );

    let prepay_strategy = strategy_result(inputs, Strategy::Prepay, as_of);
    let invest_strategy = strategy_result(inputs, Strategy::Invest, as_of);
    debug!(
        prepay_net_worth = prepay_strategy.net_worth,
        invest_net_worth = invest_strategy.net_worth,
        prepay_months_to_free = ?prepay_strategy.months_to_mortgage_free,
        invest_months_to_free = ?invest_strategy.months_to_mortgage_free,
        "strategies projected"
    );

    let net_worth_difference = invest_strategy.net_worth - prepay_strategy.net_worth;
    let winner = classify_winner(net_worth_difference);

    let break_even = solve_break_even(inputs, BreakEvenConfig::default());
    debug!(
        break_even_return = break_even.break_even_return,
        converged = break_even.converged,
        iterations = break_even.iterations.len(),
        "break-even solved"
    );

    let narrative = build_narrative(
        horizon_months,
        net_worth_difference,
        prepay_strategy.months_to_mortgage_free,
        invest_strategy.months_to_mortgage_free,
    );

    CalculationResults {
        prepay_strategy,
        invest_strategy,
        comparison: ComparisonResult {
            net_worth_difference,
            winner,
            break_even_return: break_even.break_even_return,
            narrative,
        },
    }
}

pub fn classify_winner(net_worth_difference: f64) -> Winner {
    if net_worth_difference.abs() < TIE_THRESHOLD {
        Winner::Tie
    } else if net_worth_difference > 0.0 {
        Winner::Invest
    } else {
        Winner::Prepay
    }
}

/// Invest minus prepay terminal net worth when investments earn `gross_return`.
pub(crate) fn net_worth_difference_at(inputs: &CalculatorInputs, gross_return: f64) -> f64 {
    let prepay = strategy_breakdown(inputs, Strategy::Prepay, gross_return);
    let invest = strategy_breakdown(inputs, Strategy::Invest, gross_return);
    terminal_net_worth(inputs, &invest) - terminal_net_worth(inputs, &prepay)
}

fn mortgage_terms(inputs: &CalculatorInputs, strategy: Strategy) -> MortgageTerms {
    let terms = MortgageTerms {
        balance: inputs.loan_balance,
        annual_rate: inputs.interest_rate,
        regular_payment: inputs.regular_payment,
        extra_payment: inputs.extra_payment,
        extra_frequency: inputs.extra_payment_frequency,
    };
    match strategy {
        Strategy::Prepay => terms,
        Strategy::Invest => terms.without_extra(),
    }
}

/// Monthly series for one strategy over the full horizon.
///
/// The mortgage schedule ends at payoff; later months carry a zero balance
/// and the final cumulative totals.
pub fn strategy_breakdown(
    inputs: &CalculatorInputs,
    strategy: Strategy,
    gross_return: f64,
) -> Vec<MonthlyDataPoint> {
    let horizon_months = inputs.horizon_months();
    let schedule = amortize(mortgage_terms(inputs, strategy), horizon_months);
    let investments = match strategy {
        Strategy::Prepay => Vec::new(),
        Strategy::Invest => {
            let net = net_return(
                gross_return,
                inputs.account_type,
                inputs.gross_income,
                inputs.province,
            );
            project_balances(
                inputs.extra_payment,
                net,
                horizon_months,
                inputs.extra_payment_frequency,
                0.0,
            )
        }
    };

    let (paid_at_payoff, interest_at_payoff) = schedule
        .last()
        .map_or((0.0, 0.0), |row| (row.total_paid, row.interest_paid));
    let initial_home_value = inputs.home_value();

    let mut points = Vec::with_capacity(horizon_months as usize);
    for month in 1..=horizon_months {
        let idx = (month - 1) as usize;
        let (mortgage_balance, total_paid, interest_paid) = match schedule.get(idx) {
            Some(row) => (row.balance, row.total_paid, row.interest_paid),
            None => (0.0, paid_at_payoff, interest_at_payoff),
        };
        let investment_balance = investments
            .get(idx)
            .or(investments.last())
            .copied()
            .unwrap_or(0.0);
        let home = home_value(initial_home_value, inputs.home_appreciation_rate, month);

        points.push(MonthlyDataPoint {
            month,
            mortgage_balance,
            investment_balance,
            net_worth: home - mortgage_balance + investment_balance,
            total_paid,
            interest_paid,
        });
    }

    if inputs.show_real_terms {
        normalize_breakdown(&mut points, inputs.inflation_rate);
    }
    points
}

fn terminal_net_worth(inputs: &CalculatorInputs, points: &[MonthlyDataPoint]) -> f64 {
    points
        .last()
        .map_or(inputs.home_value() - inputs.loan_balance, |p| p.net_worth)
}

fn strategy_result(
    inputs: &CalculatorInputs,
    strategy: Strategy,
    as_of: NaiveDate,
) -> StrategyResult {
    let monthly_breakdown = strategy_breakdown(inputs, strategy, inputs.expected_return);
    let months_to_mortgage_free = months_to_payoff(mortgage_terms(inputs, strategy));
    let mortgage_free_date =
        months_to_mortgage_free.and_then(|months| date_after_months(as_of, months));

    let terminal = monthly_breakdown.last().copied().unwrap_or(MonthlyDataPoint {
        month: 0,
        mortgage_balance: inputs.loan_balance,
        investment_balance: 0.0,
        net_worth: inputs.home_value() - inputs.loan_balance,
        total_paid: 0.0,
        interest_paid: 0.0,
    });

    StrategyResult {
        net_worth: terminal.net_worth,
        mortgage_balance: terminal.mortgage_balance,
        investment_balance: terminal.investment_balance,
        mortgage_free_date,
        months_to_mortgage_free,
        total_interest_paid: terminal.interest_paid,
        total_paid: terminal.total_paid,
        monthly_breakdown,
    }
}

/// Plain-English summary of the comparison.
pub fn build_narrative(
    term_months: u32,
    net_worth_difference: f64,
    prepay_months_to_free: Option<u32>,
    invest_months_to_free: Option<u32>,
) -> String {
    let term = format_term(term_months);
    let abs_difference = net_worth_difference.abs();

    if abs_difference < TIE_THRESHOLD {
        let amount = if abs_difference < 100.0 {
            "negligible".to_string()
        } else {
            format!("about {}", format_cad(abs_difference))
        };
        return format!(
            "Both strategies yield similar results. After {term}, the difference in net worth is {amount}."
        );
    }

    let invest_wins = net_worth_difference > 0.0;
    let winner = if invest_wins { "investing" } else { "prepaying" };
    let mut narrative = format!(
        "After {term}, {winner} your extra payment results in a net worth that is {} higher.",
        format_cad(abs_difference)
    );

    if let (Some(prepay), Some(invest)) = (prepay_months_to_free, invest_months_to_free) {
        let prepay_years = prepay.div_ceil(12);
        let invest_years = invest.div_ceil(12);
        if prepay_years < invest_years {
            let earlier = pluralize(invest_years - prepay_years, "year", "years");
            if invest_wins {
                narrative.push_str(&format!(
                    " However, prepaying your mortgage would make you mortgage-free {earlier} earlier."
                ));
            } else {
                narrative.push_str(&format!(
                    " Prepaying also makes you mortgage-free {earlier} earlier."
                ));
            }
        }
    }

    narrative
}

fn pluralize(count: u32, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

fn format_term(months: u32) -> String {
    let years = months / 12;
    let rem = months % 12;
    match (years, rem) {
        (0, rem) => pluralize(rem, "month", "months"),
        (years, 0) => pluralize(years, "year", "years"),
        (years, rem) => format!(
            "{} and {}",
            pluralize(years, "year", "years"),
            pluralize(rem, "month", "months")
        ),
    }
}

/// Whole-dollar CAD amount with thousands separators, e.g. `$12,346`.
pub fn format_cad(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{}", rounded.abs() as u64);
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::inflation::adjustment_factor;
    use crate::core::types::{AccountType, ExtraPaymentFrequency, Province};
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).expect("valid date")
    }

    fn sample_inputs() -> CalculatorInputs {
        CalculatorInputs {
            loan_balance: 400_000.0,
            current_home_value: None,
            interest_rate: 5.5,
            years_remaining: 25,
            months_remaining: 0,
            regular_payment: 2_500.0,
            extra_payment: 500.0,
            extra_payment_frequency: ExtraPaymentFrequency::Monthly,
            expected_return: 7.0,
            account_type: AccountType::Tfsa,
            province: Province::On,
            gross_income: 80_000.0,
            home_appreciation_rate: 0.0,
            show_real_terms: false,
            inflation_rate: 2.0,
        }
    }

    fn ten_year_inputs() -> CalculatorInputs {
        CalculatorInputs {
            years_remaining: 10,
            ..sample_inputs()
        }
    }

    #[test]
    fn full_term_scenario_prepay_pays_off_first() {
        let inputs = sample_inputs();
        let results = run_comparison_as_of(&inputs, as_of());
        let prepay = &results.prepay_strategy;
        let invest = &results.invest_strategy;

        assert_eq!(prepay.monthly_breakdown.len(), 300);
        assert_eq!(invest.monthly_breakdown.len(), 300);

        let prepay_free = prepay.months_to_mortgage_free.expect("prepay pays off");
        let invest_free = invest.months_to_mortgage_free.expect("invest pays off");
        assert!(prepay_free < invest_free);
        assert!(prepay.mortgage_free_date < invest.mortgage_free_date);

        let regular_only = MortgageTerms {
            balance: 400_000.0,
            annual_rate: 5.5,
            regular_payment: 2_500.0,
            extra_payment: 0.0,
            extra_frequency: ExtraPaymentFrequency::Monthly,
        };
        assert_eq!(Some(invest_free), months_to_payoff(regular_only));

        let payoff_idx = prepay_free as usize - 1;
        assert_eq!(prepay.monthly_breakdown[payoff_idx].mortgage_balance, 0.0);
        assert!(prepay.monthly_breakdown[payoff_idx - 1].mortgage_balance > 0.0);
        assert_eq!(prepay.mortgage_balance, 0.0);
        assert_eq!(prepay.investment_balance, 0.0);
    }

    #[test]
    fn padded_months_keep_final_totals() {
        let results = run_comparison_as_of(&sample_inputs(), as_of());
        let prepay = &results.prepay_strategy;
        let payoff = prepay.months_to_mortgage_free.expect("pays off") as usize;

        let at_payoff = prepay.monthly_breakdown[payoff - 1];
        for point in &prepay.monthly_breakdown[payoff..] {
            assert_eq!(point.mortgage_balance, 0.0);
            assert_eq!(point.total_paid, at_payoff.total_paid);
            assert_eq!(point.interest_paid, at_payoff.interest_paid);
        }
        assert_eq!(prepay.total_paid, at_payoff.total_paid);
        assert_eq!(prepay.total_interest_paid, at_payoff.interest_paid);
    }

    #[test]
    fn full_term_scenario_favors_investing_with_clause() {
        let results = run_comparison_as_of(&sample_inputs(), as_of());
        assert_eq!(results.comparison.winner, Winner::Invest);
        assert!(results.comparison.net_worth_difference > TIE_THRESHOLD);
        assert!(results.comparison.narrative.starts_with("After 25 years, investing"));
        assert!(results.comparison.narrative.contains("years earlier"));
        // Investing wins even at a 0% return, so the search pins to the lower bound.
        assert!(results.comparison.break_even_return < 1e-6);
    }

    #[test]
    fn mortgage_balance_never_increases() {
        let results = run_comparison_as_of(&sample_inputs(), as_of());
        for strategy in [&results.prepay_strategy, &results.invest_strategy] {
            let mut previous = f64::INFINITY;
            for point in &strategy.monthly_breakdown {
                assert!(point.mortgage_balance <= previous);
                assert!(point.mortgage_balance >= 0.0);
                previous = point.mortgage_balance;
            }
        }
    }

    #[test]
    fn net_worth_is_home_equity_plus_investments() {
        let mut inputs = ten_year_inputs();
        inputs.current_home_value = Some(650_000.0);
        inputs.home_appreciation_rate = 3.0;
        let results = run_comparison_as_of(&inputs, as_of());
        for point in &results.invest_strategy.monthly_breakdown {
            let home = home_value(650_000.0, 3.0, point.month);
            assert_approx(
                point.net_worth,
                home - point.mortgage_balance + point.investment_balance,
            );
        }
    }

    #[test]
    fn zero_return_investment_is_linear() {
        let mut inputs = ten_year_inputs();
        inputs.expected_return = 0.0;
        let results = run_comparison_as_of(&inputs, as_of());
        assert_eq!(results.invest_strategy.investment_balance, 60_000.0);
    }

    #[test]
    fn interior_break_even_is_close_to_mortgage_rate() {
        let inputs = ten_year_inputs();
        let results = run_comparison_as_of(&inputs, as_of());
        let break_even = results.comparison.break_even_return;
        assert!((5.3..=5.6).contains(&break_even), "break-even {break_even}");

        let mut at_break_even = inputs.clone();
        at_break_even.expected_return = break_even;
        let rerun = run_comparison_as_of(&at_break_even, as_of());
        assert!(rerun.comparison.net_worth_difference.abs() < 100.0);
        assert_eq!(rerun.comparison.winner, Winner::Tie);
    }

    #[test]
    fn taxed_account_needs_higher_gross_break_even() {
        let tfsa = run_comparison_as_of(&ten_year_inputs(), as_of());
        let mut taxed = ten_year_inputs();
        taxed.account_type = AccountType::NonRegistered;
        let non_registered = run_comparison_as_of(&taxed, as_of());
        assert!(
            non_registered.comparison.break_even_return > tfsa.comparison.break_even_return + 0.5
        );
        assert!(
            non_registered.invest_strategy.investment_balance
                < tfsa.invest_strategy.investment_balance
        );
    }

    #[test]
    fn no_extra_payment_is_a_tie() {
        let mut inputs = ten_year_inputs();
        inputs.extra_payment = 0.0;
        let results = run_comparison_as_of(&inputs, as_of());
        assert_eq!(results.comparison.winner, Winner::Tie);
        assert_eq!(results.comparison.net_worth_difference, 0.0);
        assert_eq!(results.comparison.break_even_return, 15.0);
        assert!(results.comparison.narrative.contains("negligible"));
    }

    #[test]
    fn real_terms_scale_terminal_values() {
        let nominal = run_comparison_as_of(&ten_year_inputs(), as_of());
        let mut inputs = ten_year_inputs();
        inputs.show_real_terms = true;
        inputs.inflation_rate = 2.5;
        let real = run_comparison_as_of(&inputs, as_of());

        let factor = adjustment_factor(2.5, 120);
        assert_approx(
            real.invest_strategy.net_worth,
            nominal.invest_strategy.net_worth * factor,
        );
        assert_approx(
            real.prepay_strategy.total_interest_paid,
            nominal.prepay_strategy.total_interest_paid * factor,
        );
        assert_eq!(
            real.prepay_strategy.months_to_mortgage_free,
            nominal.prepay_strategy.months_to_mortgage_free
        );
    }

    #[test]
    fn real_terms_with_zero_inflation_is_nominal() {
        let nominal = run_comparison_as_of(&ten_year_inputs(), as_of());
        let mut inputs = ten_year_inputs();
        inputs.show_real_terms = true;
        inputs.inflation_rate = 0.0;
        let real = run_comparison_as_of(&inputs, as_of());
        assert_eq!(real, nominal);
    }

    #[test]
    fn empty_horizon_reports_starting_position() {
        let mut inputs = sample_inputs();
        inputs.years_remaining = 0;
        inputs.current_home_value = Some(500_000.0);
        let results = run_comparison_as_of(&inputs, as_of());
        assert!(results.prepay_strategy.monthly_breakdown.is_empty());
        assert_approx(results.prepay_strategy.net_worth, 100_000.0);
        assert_approx(results.invest_strategy.mortgage_balance, 400_000.0);
        assert_eq!(results.comparison.winner, Winner::Tie);
    }

    #[test]
    fn insufficient_payment_has_no_mortgage_free_date() {
        let mut inputs = ten_year_inputs();
        inputs.regular_payment = 1_000.0;
        let results = run_comparison_as_of(&inputs, as_of());
        assert_eq!(results.invest_strategy.mortgage_free_date, None);
        assert_eq!(results.prepay_strategy.mortgage_free_date, None);
        assert_eq!(results.invest_strategy.monthly_breakdown.len(), 120);
    }

    #[test]
    fn annual_extra_payments_show_in_investment_steps() {
        let mut inputs = ten_year_inputs();
        inputs.extra_payment = 6_000.0;
        inputs.extra_payment_frequency = ExtraPaymentFrequency::Annual;
        inputs.expected_return = 0.0;
        let results = run_comparison_as_of(&inputs, as_of());
        let invest = &results.invest_strategy.monthly_breakdown;
        assert_eq!(invest[10].investment_balance, 0.0);
        assert_eq!(invest[11].investment_balance, 6_000.0);
        assert_eq!(invest[119].investment_balance, 60_000.0);
    }

    #[test]
    fn narrative_wording() {
        let text = build_narrative(300, 25_000.4, Some(100), Some(110));
        assert_eq!(
            text,
            "After 25 years, investing your extra payment results in a net worth that is $25,000 higher. However, prepaying your mortgage would make you mortgage-free 1 year earlier."
        );

        let text = build_narrative(126, -1_234_567.0, Some(100), Some(150));
        assert_eq!(
            text,
            "After 10 years and 6 months, prepaying your extra payment results in a net worth that is $1,234,567 higher. Prepaying also makes you mortgage-free 4 years earlier."
        );

        let text = build_narrative(1, 5_000.0, Some(5), None);
        assert_eq!(
            text,
            "After 1 month, investing your extra payment results in a net worth that is $5,000 higher."
        );

        let text = build_narrative(24, 450.0, Some(5), Some(50));
        assert_eq!(
            text,
            "Both strategies yield similar results. After 2 years, the difference in net worth is about $450."
        );
    }

    #[test]
    fn cad_formatting() {
        assert_eq!(format_cad(0.0), "$0");
        assert_eq!(format_cad(999.5), "$1,000");
        assert_eq!(format_cad(1_234_567.89), "$1,234,568");
        assert_eq!(format_cad(-42_000.0), "-$42,000");
    }

    #[test]
    fn winner_threshold() {
        assert_eq!(classify_winner(999.99), Winner::Tie);
        assert_eq!(classify_winner(-999.99), Winner::Tie);
        assert_eq!(classify_winner(1_000.0), Winner::Invest);
        assert_eq!(classify_winner(-1_000.0), Winner::Prepay);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(12))]

        #[test]
        fn prop_comparison_is_deterministic_and_length_aligned(
            loan in 50_000u32..900_000,
            rate_bp in 0u32..1_200,
            years in 1u32..30,
            months in 0u32..12,
            extra in 0u32..3_000,
            return_bp in 0u32..1_500,
            cadence in 0usize..3
        ) {
            let loan = loan as f64;
            let rate = rate_bp as f64 / 100.0;
            let term = years * 12 + months;
            let payment = crate::core::rates::monthly_payment(
                loan,
                crate::core::rates::monthly_mortgage_rate(rate),
                term,
            );
            let inputs = CalculatorInputs {
                loan_balance: loan,
                interest_rate: rate,
                years_remaining: years,
                months_remaining: months,
                regular_payment: payment,
                extra_payment: extra as f64,
                extra_payment_frequency: [
                    ExtraPaymentFrequency::Monthly,
                    ExtraPaymentFrequency::Annual,
                    ExtraPaymentFrequency::OneTime,
                ][cadence],
                expected_return: return_bp as f64 / 100.0,
                ..sample_inputs()
            };

            let first = run_comparison_as_of(&inputs, as_of());
            let second = run_comparison_as_of(&inputs, as_of());
            prop_assert_eq!(&first, &second);

            prop_assert_eq!(first.prepay_strategy.monthly_breakdown.len(), term as usize);
            prop_assert_eq!(first.invest_strategy.monthly_breakdown.len(), term as usize);

            let break_even = first.comparison.break_even_return;
            prop_assert!((0.0..=30.0).contains(&break_even));
            let mut rerun_inputs = inputs.clone();
            rerun_inputs.expected_return = break_even;
            let rerun = run_comparison_as_of(&rerun_inputs, as_of());
            let pinned = break_even < 1e-6 || break_even > 30.0 - 1e-6;
            prop_assert!(rerun.comparison.net_worth_difference.abs() < 100.0 || pinned);
        }
    }
}
