//! Simplified Canadian marginal tax rates (2024 brackets).
//!
//! All jurisdiction policy lives in the bracket tables; the lookup logic is
//! shared. Rates are fractions (0.15 means 15%).

use serde::Serialize;

use super::types::{AccountType, Province};

/// Capital gains inclusion rate applied to non-registered accounts.
const CAPITAL_GAINS_INCLUSION: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaxBracket {
    pub min: f64,
    /// `None` for the open-ended top bracket.
    pub max: Option<f64>,
    pub rate: f64,
}

const fn bracket(min: f64, max: f64, rate: f64) -> TaxBracket {
    TaxBracket {
        min,
        max: Some(max),
        rate,
    }
}

const fn top(min: f64, rate: f64) -> TaxBracket {
    TaxBracket {
        min,
        max: None,
        rate,
    }
}

pub const FEDERAL_BRACKETS: &[TaxBracket] = &[
    bracket(0.0, 55_867.0, 0.15),
    bracket(55_867.0, 111_733.0, 0.205),
    bracket(111_733.0, 173_205.0, 0.26),
    bracket(173_205.0, 246_752.0, 0.29),
    top(246_752.0, 0.33),
];

const AB_BRACKETS: &[TaxBracket] = &[
    bracket(0.0, 148_269.0, 0.10),
    bracket(148_269.0, 177_922.0, 0.12),
    bracket(177_922.0, 237_230.0, 0.13),
    bracket(237_230.0, 355_845.0, 0.14),
    top(355_845.0, 0.15),
];

const BC_BRACKETS: &[TaxBracket] = &[
    bracket(0.0, 47_937.0, 0.0506),
    bracket(47_937.0, 95_875.0, 0.077),
    bracket(95_875.0, 110_076.0, 0.105),
    bracket(110_076.0, 133_664.0, 0.1229),
    bracket(133_664.0, 181_232.0, 0.147),
    bracket(181_232.0, 252_752.0, 0.168),
    top(252_752.0, 0.205),
];

const MB_BRACKETS: &[TaxBracket] = &[
    bracket(0.0, 47_000.0, 0.108),
    bracket(47_000.0, 100_000.0, 0.1275),
    top(100_000.0, 0.174),
];

const NB_BRACKETS: &[TaxBracket] = &[
    bracket(0.0, 52_810.0, 0.094),
    bracket(52_810.0, 105_620.0, 0.14),
    bracket(105_620.0, 161_063.0, 0.16),
    top(161_063.0, 0.195),
];

const NL_BRACKETS: &[TaxBracket] = &[
    bracket(0.0, 43_198.0, 0.087),
    bracket(43_198.0, 86_395.0, 0.145),
    bracket(86_395.0, 154_244.0, 0.158),
    bracket(154_244.0, 215_943.0, 0.173),
    top(215_943.0, 0.183),
];

const NS_BRACKETS: &[TaxBracket] = &[
    bracket(0.0, 29_590.0, 0.0879),
    bracket(29_590.0, 59_180.0, 0.1495),
    bracket(59_180.0, 93_000.0, 0.1667),
    bracket(93_000.0, 150_000.0, 0.175),
    top(150_000.0, 0.21),
];

const NT_BRACKETS: &[TaxBracket] = &[
    bracket(0.0, 50_877.0, 0.059),
    bracket(50_877.0, 101_754.0, 0.086),
    bracket(101_754.0, 165_429.0, 0.122),
    top(165_429.0, 0.1405),
];

const NU_BRACKETS: &[TaxBracket] = &[
    bracket(0.0, 50_877.0, 0.04),
    bracket(50_877.0, 101_754.0, 0.07),
    bracket(101_754.0, 165_429.0, 0.09),
    top(165_429.0, 0.115),
];

const ON_BRACKETS: &[TaxBracket] = &[
    bracket(0.0, 51_446.0, 0.0505),
    bracket(51_446.0, 102_894.0, 0.0915),
    bracket(102_894.0, 150_000.0, 0.1116),
    bracket(150_000.0, 220_000.0, 0.1216),
    top(220_000.0, 0.1316),
];

const PE_BRACKETS: &[TaxBracket] = &[
    bracket(0.0, 32_656.0, 0.098),
    bracket(32_656.0, 65_312.0, 0.138),
    bracket(65_312.0, 105_000.0, 0.167),
    top(105_000.0, 0.18),
];

const QC_BRACKETS: &[TaxBracket] = &[
    bracket(0.0, 51_480.0, 0.14),
    bracket(51_480.0, 102_975.0, 0.19),
    bracket(102_975.0, 123_780.0, 0.24),
    top(123_780.0, 0.2575),
];

const SK_BRACKETS: &[TaxBracket] = &[
    bracket(0.0, 52_057.0, 0.105),
    bracket(52_057.0, 148_734.0, 0.125),
    top(148_734.0, 0.145),
];

const YT_BRACKETS: &[TaxBracket] = &[
    bracket(0.0, 55_867.0, 0.064),
    bracket(55_867.0, 111_733.0, 0.09),
    bracket(111_733.0, 173_205.0, 0.109),
    bracket(173_205.0, 500_000.0, 0.128),
    top(500_000.0, 0.15),
];

pub fn provincial_brackets(province: Province) -> &'static [TaxBracket] {
    match province {
        Province::Ab => AB_BRACKETS,
        Province::Bc => BC_BRACKETS,
        Province::Mb => MB_BRACKETS,
        Province::Nb => NB_BRACKETS,
        Province::Nl => NL_BRACKETS,
        Province::Ns => NS_BRACKETS,
        Province::Nt => NT_BRACKETS,
        Province::Nu => NU_BRACKETS,
        Province::On => ON_BRACKETS,
        Province::Pe => PE_BRACKETS,
        Province::Qc => QC_BRACKETS,
        Province::Sk => SK_BRACKETS,
        Province::Yt => YT_BRACKETS,
    }
}

/// Rate of the highest bracket containing `income`; bounds are inclusive.
pub fn marginal_rate(income: f64, brackets: &[TaxBracket]) -> f64 {
    for b in brackets.iter().rev() {
        let below_max = b.max.is_none_or(|max| income <= max);
        if income >= b.min && below_max {
            return b.rate;
        }
    }
    brackets.first().map_or(0.0, |b| b.rate)
}

pub fn combined_marginal_rate(income: f64, province: Province) -> f64 {
    marginal_rate(income, FEDERAL_BRACKETS) + marginal_rate(income, provincial_brackets(province))
}

/// Tax drag applied to investment growth for an account type.
///
/// RRSP and RESP withdrawals are assumed to be taxed at the contribution-year
/// marginal rate. This is a known approximation.
pub fn effective_tax_rate(account_type: AccountType, marginal_rate: f64) -> f64 {
    match account_type {
        AccountType::Tfsa | AccountType::Fhsa => 0.0,
        AccountType::Rrsp | AccountType::Resp => marginal_rate,
        AccountType::NonRegistered => marginal_rate * CAPITAL_GAINS_INCLUSION,
    }
}

/// After-tax annual return, in percent, for a gross annual return in percent.
pub fn net_return(
    gross_return_pct: f64,
    account_type: AccountType,
    income: f64,
    province: Province,
) -> f64 {
    let marginal = combined_marginal_rate(income, province);
    gross_return_pct * (1.0 - effective_tax_rate(account_type, marginal))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxRateInfo {
    pub federal_rate: f64,
    pub provincial_rate: f64,
    pub combined_rate: f64,
    pub effective_rate: f64,
}

pub fn tax_rate_info(income: f64, province: Province, account_type: AccountType) -> TaxRateInfo {
    let federal_rate = marginal_rate(income, FEDERAL_BRACKETS);
    let provincial_rate = marginal_rate(income, provincial_brackets(province));
    let combined_rate = federal_rate + provincial_rate;
    TaxRateInfo {
        federal_rate,
        provincial_rate,
        combined_rate,
        effective_rate: effective_tax_rate(account_type, combined_rate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert_eq, proptest};

    const EPS: f64 = 1e-12;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn assert_partition(name: &str, brackets: &[TaxBracket]) {
        assert!(!brackets.is_empty(), "{name}: no brackets");
        assert_eq!(brackets[0].min, 0.0, "{name}: must start at zero");
        for pair in brackets.windows(2) {
            assert_eq!(pair[0].max, Some(pair[1].min), "{name}: gap or overlap");
            assert!(pair[0].min < pair[1].min, "{name}: not ascending");
        }
        let last = brackets[brackets.len() - 1];
        assert!(last.max.is_none(), "{name}: top bracket must be unbounded");
    }

    #[test]
    fn federal_table_partitions_income() {
        assert_eq!(FEDERAL_BRACKETS.len(), 5);
        assert_partition("federal", FEDERAL_BRACKETS);
    }

    #[test]
    fn every_provincial_table_partitions_income() {
        for province in Province::ALL {
            let brackets = provincial_brackets(province);
            assert!(
                (3..=7).contains(&brackets.len()),
                "{} has {} brackets",
                province.code(),
                brackets.len()
            );
            assert_partition(province.code(), brackets);
        }
    }

    #[test]
    fn boundary_income_takes_the_higher_bracket() {
        assert_approx(marginal_rate(55_867.0, FEDERAL_BRACKETS), 0.205);
        assert_approx(marginal_rate(55_866.0, FEDERAL_BRACKETS), 0.15);
        assert_approx(marginal_rate(1_000_000.0, FEDERAL_BRACKETS), 0.33);
    }

    #[test]
    fn negative_income_falls_back_to_lowest_bracket() {
        assert_approx(marginal_rate(-5_000.0, FEDERAL_BRACKETS), 0.15);
        assert_approx(marginal_rate(-5_000.0, QC_BRACKETS), 0.14);
    }

    #[test]
    fn combined_rate_for_ontario_middle_income() {
        assert_approx(combined_marginal_rate(80_000.0, Province::On), 0.205 + 0.0915);
    }

    #[test]
    fn effective_rate_by_account_type() {
        assert_approx(effective_tax_rate(AccountType::Fhsa, 0.43), 0.0);
        assert_approx(effective_tax_rate(AccountType::Rrsp, 0.43), 0.43);
        assert_approx(effective_tax_rate(AccountType::Resp, 0.43), 0.43);
        assert_approx(effective_tax_rate(AccountType::NonRegistered, 0.43), 0.215);
    }

    #[test]
    fn net_return_for_non_registered_account() {
        let net = net_return(7.0, AccountType::NonRegistered, 80_000.0, Province::On);
        assert_approx(net, 7.0 * (1.0 - 0.2965 * 0.5));
    }

    #[test]
    fn tax_info_reports_components() {
        let info = tax_rate_info(120_000.0, Province::Bc, AccountType::Rrsp);
        assert_approx(info.federal_rate, 0.26);
        assert_approx(info.provincial_rate, 0.1229);
        assert_approx(info.combined_rate, 0.26 + 0.1229);
        assert_approx(info.effective_rate, info.combined_rate);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_tfsa_is_never_taxed(income in 0u32..2_000_000, province_idx in 0usize..13, gross_bp in 0u32..3_000) {
            let province = Province::ALL[province_idx];
            let marginal = combined_marginal_rate(income as f64, province);
            prop_assert_eq!(effective_tax_rate(AccountType::Tfsa, marginal), 0.0);
            let gross = gross_bp as f64 / 100.0;
            prop_assert_eq!(net_return(gross, AccountType::Tfsa, income as f64, province), gross);
        }
    }
}
