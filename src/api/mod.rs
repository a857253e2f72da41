use axum::{
    Router,
    extract::{
        Json, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{Local, NaiveDate};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{
    AccountType, CalculationResults, CalculatorInputs, ExtraPaymentFrequency, Province,
    SensitivityAnalysis, TaxRateInfo, monthly_mortgage_rate, monthly_payment, net_return,
    run_comparison_as_of, run_sensitivity_analysis_as_of, tax_rate_info,
};

const MAX_LOAN_BALANCE: f64 = 10_000_000.0;
const MAX_INTEREST_RATE: f64 = 20.0;
const MAX_YEARS_REMAINING: u32 = 50;
const MAX_MONTHS_REMAINING: u32 = 11;
const MAX_REGULAR_PAYMENT: f64 = 100_000.0;
const MAX_EXTRA_PAYMENT: f64 = 10_000.0;
const MAX_EXPECTED_RETURN: f64 = 30.0;
const MAX_INFLATION_RATE: f64 = 10.0;
const MAX_HOME_APPRECIATION: f64 = 20.0;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{flag} must be between {min} and {max}, got {value}")]
    OutOfRange {
        flag: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("{flag} must be > 0, got {value}")]
    NotPositive { flag: &'static str, value: f64 },
    #[error("{flag} must be >= 0, got {value}")]
    Negative { flag: &'static str, value: f64 },
    #[error("--years-remaining and --months-remaining must add up to at least one month")]
    EmptyTerm,
    #[error("Invalid request payload: {0}")]
    Payload(String),
    #[error(transparent)]
    Args(#[from] clap::Error),
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliExtraPaymentFrequency {
    Monthly,
    Annual,
    OneTime,
}

impl From<CliExtraPaymentFrequency> for ExtraPaymentFrequency {
    fn from(value: CliExtraPaymentFrequency) -> Self {
        match value {
            CliExtraPaymentFrequency::Monthly => ExtraPaymentFrequency::Monthly,
            CliExtraPaymentFrequency::Annual => ExtraPaymentFrequency::Annual,
            CliExtraPaymentFrequency::OneTime => ExtraPaymentFrequency::OneTime,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliAccountType {
    Tfsa,
    Fhsa,
    Rrsp,
    Resp,
    NonRegistered,
}

impl From<CliAccountType> for AccountType {
    fn from(value: CliAccountType) -> Self {
        match value {
            CliAccountType::Tfsa => AccountType::Tfsa,
            CliAccountType::Fhsa => AccountType::Fhsa,
            CliAccountType::Rrsp => AccountType::Rrsp,
            CliAccountType::Resp => AccountType::Resp,
            CliAccountType::NonRegistered => AccountType::NonRegistered,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliProvince {
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

impl From<CliProvince> for Province {
    fn from(value: CliProvince) -> Self {
        match value {
            CliProvince::Ab => Province::Ab,
            CliProvince::Bc => Province::Bc,
            CliProvince::Mb => Province::Mb,
            CliProvince::Nb => Province::Nb,
            CliProvince::Nl => Province::Nl,
            CliProvince::Ns => Province::Ns,
            CliProvince::Nt => Province::Nt,
            CliProvince::Nu => Province::Nu,
            CliProvince::On => Province::On,
            CliProvince::Pe => Province::Pe,
            CliProvince::Qc => Province::Qc,
            CliProvince::Sk => Province::Sk,
            CliProvince::Yt => Province::Yt,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum AnalysisMode {
    Comparison,
    Sensitivity,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiExtraPaymentFrequency {
    Monthly,
    Annual,
    #[serde(alias = "oneTime", alias = "one_time")]
    OneTime,
}

impl From<ApiExtraPaymentFrequency> for CliExtraPaymentFrequency {
    fn from(value: ApiExtraPaymentFrequency) -> Self {
        match value {
            ApiExtraPaymentFrequency::Monthly => CliExtraPaymentFrequency::Monthly,
            ApiExtraPaymentFrequency::Annual => CliExtraPaymentFrequency::Annual,
            ApiExtraPaymentFrequency::OneTime => CliExtraPaymentFrequency::OneTime,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiAccountType {
    #[serde(alias = "TFSA")]
    Tfsa,
    #[serde(alias = "FHSA")]
    Fhsa,
    #[serde(alias = "RRSP")]
    Rrsp,
    #[serde(alias = "RESP")]
    Resp,
    #[serde(alias = "nonRegistered", alias = "non_registered")]
    NonRegistered,
}

impl From<ApiAccountType> for CliAccountType {
    fn from(value: ApiAccountType) -> Self {
        match value {
            ApiAccountType::Tfsa => CliAccountType::Tfsa,
            ApiAccountType::Fhsa => CliAccountType::Fhsa,
            ApiAccountType::Rrsp => CliAccountType::Rrsp,
            ApiAccountType::Resp => CliAccountType::Resp,
            ApiAccountType::NonRegistered => CliAccountType::NonRegistered,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
enum ApiProvince {
    #[serde(alias = "ab")]
    Ab,
    #[serde(alias = "bc")]
    Bc,
    #[serde(alias = "mb")]
    Mb,
    #[serde(alias = "nb")]
    Nb,
    #[serde(alias = "nl")]
    Nl,
    #[serde(alias = "ns")]
    Ns,
    #[serde(alias = "nt")]
    Nt,
    #[serde(alias = "nu")]
    Nu,
    #[serde(alias = "on")]
    On,
    #[serde(alias = "pe")]
    Pe,
    #[serde(alias = "qc")]
    Qc,
    #[serde(alias = "sk")]
    Sk,
    #[serde(alias = "yt")]
    Yt,
}

impl From<ApiProvince> for CliProvince {
    fn from(value: ApiProvince) -> Self {
        match value {
            ApiProvince::Ab => CliProvince::Ab,
            ApiProvince::Bc => CliProvince::Bc,
            ApiProvince::Mb => CliProvince::Mb,
            ApiProvince::Nb => CliProvince::Nb,
            ApiProvince::Nl => CliProvince::Nl,
            ApiProvince::Ns => CliProvince::Ns,
            ApiProvince::Nt => CliProvince::Nt,
            ApiProvince::Nu => CliProvince::Nu,
            ApiProvince::On => CliProvince::On,
            ApiProvince::Pe => CliProvince::Pe,
            ApiProvince::Qc => CliProvince::Qc,
            ApiProvince::Sk => CliProvince::Sk,
            ApiProvince::Yt => CliProvince::Yt,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiAnalysisMode {
    #[serde(alias = "compare")]
    Comparison,
    Sensitivity,
}

impl From<ApiAnalysisMode> for AnalysisMode {
    fn from(value: ApiAnalysisMode) -> Self {
        match value {
            ApiAnalysisMode::Comparison => AnalysisMode::Comparison,
            ApiAnalysisMode::Sensitivity => AnalysisMode::Sensitivity,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
enum ResponseMode {
    Comparison,
    Sensitivity,
}

impl From<AnalysisMode> for ResponseMode {
    fn from(value: AnalysisMode) -> Self {
        match value {
            AnalysisMode::Comparison => ResponseMode::Comparison,
            AnalysisMode::Sensitivity => ResponseMode::Sensitivity,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CalculatePayload {
    loan_balance: Option<f64>,
    current_home_value: Option<f64>,
    interest_rate: Option<f64>,
    years_remaining: Option<u32>,
    months_remaining: Option<u32>,
    regular_payment: Option<f64>,
    extra_payment: Option<f64>,
    extra_payment_frequency: Option<ApiExtraPaymentFrequency>,
    expected_return: Option<f64>,
    #[serde(alias = "investmentAccountType")]
    account_type: Option<ApiAccountType>,
    province: Option<ApiProvince>,
    gross_income: Option<f64>,
    home_appreciation_rate: Option<f64>,
    show_real_terms: Option<bool>,
    inflation_rate: Option<f64>,
    analysis_mode: Option<ApiAnalysisMode>,
}

#[derive(Parser, Debug)]
#[command(
    name = "investornest",
    about = "Compare prepaying a Canadian mortgage against investing the surplus"
)]
struct Cli {
    #[arg(long, default_value_t = 400_000.0, help = "Current mortgage balance (CAD)")]
    loan_balance: f64,
    #[arg(long, help = "Current home value (CAD), defaults to the loan balance")]
    home_value: Option<f64>,
    #[arg(
        long,
        default_value_t = 5.5,
        help = "Annual mortgage rate in percent, compounded semi-annually"
    )]
    interest_rate: f64,
    #[arg(long, default_value_t = 25)]
    years_remaining: u32,
    #[arg(long, default_value_t = 0)]
    months_remaining: u32,
    #[arg(
        long,
        help = "Regular monthly payment (CAD); defaults to the payment that amortizes the balance over the remaining term"
    )]
    regular_payment: Option<f64>,
    #[arg(long, default_value_t = 500.0, help = "Surplus to prepay or invest (CAD)")]
    extra_payment: f64,
    #[arg(long, value_enum, default_value_t = CliExtraPaymentFrequency::Monthly)]
    extra_payment_frequency: CliExtraPaymentFrequency,
    #[arg(
        long,
        default_value_t = 7.0,
        help = "Expected gross annual investment return in percent"
    )]
    expected_return: f64,
    #[arg(long, value_enum, default_value_t = CliAccountType::Tfsa)]
    account_type: CliAccountType,
    #[arg(long, value_enum, ignore_case = true, default_value_t = CliProvince::On)]
    province: CliProvince,
    #[arg(long, default_value_t = 80_000.0, help = "Gross annual income (CAD)")]
    gross_income: f64,
    #[arg(
        long,
        default_value_t = 3.0,
        help = "Expected annual home appreciation in percent"
    )]
    home_appreciation_rate: f64,
    #[arg(long, help = "Report values in today's dollars")]
    show_real_terms: bool,
    #[arg(long, default_value_t = 2.0, help = "Annual inflation rate in percent")]
    inflation_rate: f64,
    #[arg(long, value_enum, default_value_t = AnalysisMode::Comparison)]
    analysis_mode: AnalysisMode,
}

#[derive(Debug)]
struct ApiRequest {
    inputs: CalculatorInputs,
    mode: AnalysisMode,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalculateResponse {
    mode: ResponseMode,
    horizon_months: u32,
    regular_payment: f64,
    net_return: f64,
    tax: TaxRateInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    results: Option<CalculationResults>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sensitivity: Option<SensitivityAnalysis>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn check_range(flag: &'static str, value: f64, min: f64, max: f64) -> Result<(), ApiError> {
    if !value.is_finite() || value < min || value > max {
        return Err(ApiError::OutOfRange {
            flag,
            min,
            max,
            value,
        });
    }
    Ok(())
}

fn build_inputs(cli: Cli) -> Result<CalculatorInputs, ApiError> {
    if !cli.loan_balance.is_finite() || cli.loan_balance <= 0.0 {
        return Err(ApiError::NotPositive {
            flag: "--loan-balance",
            value: cli.loan_balance,
        });
    }
    check_range("--loan-balance", cli.loan_balance, 0.0, MAX_LOAN_BALANCE)?;

    if let Some(home_value) = cli.home_value {
        if !home_value.is_finite() || home_value <= 0.0 {
            return Err(ApiError::NotPositive {
                flag: "--home-value",
                value: home_value,
            });
        }
    }

    check_range("--interest-rate", cli.interest_rate, 0.0, MAX_INTEREST_RATE)?;
    check_range("--years-remaining", cli.years_remaining as f64, 0.0, MAX_YEARS_REMAINING as f64)?;
    check_range(
        "--months-remaining",
        cli.months_remaining as f64,
        0.0,
        MAX_MONTHS_REMAINING as f64,
    )?;

    let term_months = cli.years_remaining * 12 + cli.months_remaining;
    if term_months == 0 {
        return Err(ApiError::EmptyTerm);
    }

    let regular_payment = match cli.regular_payment {
        Some(payment) => {
            check_range("--regular-payment", payment, 0.0, MAX_REGULAR_PAYMENT)?;
            payment
        }
        None => monthly_payment(
            cli.loan_balance,
            monthly_mortgage_rate(cli.interest_rate),
            term_months,
        ),
    };

    check_range("--extra-payment", cli.extra_payment, 0.0, MAX_EXTRA_PAYMENT)?;
    check_range("--expected-return", cli.expected_return, 0.0, MAX_EXPECTED_RETURN)?;
    check_range("--inflation-rate", cli.inflation_rate, 0.0, MAX_INFLATION_RATE)?;
    check_range(
        "--home-appreciation-rate",
        cli.home_appreciation_rate,
        0.0,
        MAX_HOME_APPRECIATION,
    )?;

    if !cli.gross_income.is_finite() || cli.gross_income < 0.0 {
        return Err(ApiError::Negative {
            flag: "--gross-income",
            value: cli.gross_income,
        });
    }

    Ok(CalculatorInputs {
        loan_balance: cli.loan_balance,
        current_home_value: cli.home_value,
        interest_rate: cli.interest_rate,
        years_remaining: cli.years_remaining,
        months_remaining: cli.months_remaining,
        regular_payment,
        extra_payment: cli.extra_payment,
        extra_payment_frequency: cli.extra_payment_frequency.into(),
        expected_return: cli.expected_return,
        account_type: cli.account_type.into(),
        province: cli.province.into(),
        gross_income: cli.gross_income,
        home_appreciation_rate: cli.home_appreciation_rate,
        show_real_terms: cli.show_real_terms,
        inflation_rate: cli.inflation_rate,
    })
}

/// Parses command-line flags and renders one calculation as pretty JSON.
///
/// Flag parse failures, `--help` included, come back as [`ApiError::Args`].
pub fn run_cli<I, T>(args: I) -> Result<String, ApiError>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::try_parse_from(args)?;
    let mode = cli.analysis_mode;
    let inputs = build_inputs(cli)?;
    let response = build_calculate_response(&inputs, mode, Local::now().date_naive());
    Ok(serde_json::to_string_pretty(&response)?)
}

pub fn create_router() -> Router {
    Router::new()
        .route(
            "/api/calculate",
            get(calculate_get_handler).post(calculate_post_handler),
        )
        .fallback(not_found_handler)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = create_router();

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "investornest HTTP API listening");
    info!("Local access: http://127.0.0.1:{port}/api/calculate");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn calculate_get_handler(
    payload: Result<Query<CalculatePayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => calculate_handler_impl(payload).await,
        Err(rejection) => reject(ApiError::Payload(rejection.body_text())),
    }
}

async fn calculate_post_handler(
    payload: Result<Json<CalculatePayload>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(payload)) => calculate_handler_impl(payload).await,
        Err(rejection) => reject(ApiError::Payload(rejection.body_text())),
    }
}

async fn calculate_handler_impl(payload: CalculatePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(err) => return reject(err),
    };

    let response = build_calculate_response(
        &request.inputs,
        request.mode,
        Local::now().date_naive(),
    );
    json_response(StatusCode::OK, response)
}

fn reject(err: ApiError) -> Response {
    warn!(error = %err, "rejected calculation request");
    error_response(StatusCode::BAD_REQUEST, &err.to_string())
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, ApiError> {
    let payload = serde_json::from_str::<CalculatePayload>(json)
        .map_err(|e| ApiError::Payload(e.to_string()))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: CalculatePayload) -> Result<ApiRequest, ApiError> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.loan_balance {
        cli.loan_balance = v;
    }
    if let Some(v) = payload.current_home_value {
        cli.home_value = Some(v);
    }
    if let Some(v) = payload.interest_rate {
        cli.interest_rate = v;
    }
    if let Some(v) = payload.years_remaining {
        cli.years_remaining = v;
    }
    if let Some(v) = payload.months_remaining {
        cli.months_remaining = v;
    }
    if let Some(v) = payload.regular_payment {
        cli.regular_payment = Some(v);
    }
    if let Some(v) = payload.extra_payment {
        cli.extra_payment = v;
    }
    if let Some(v) = payload.extra_payment_frequency {
        cli.extra_payment_frequency = v.into();
    }
    if let Some(v) = payload.expected_return {
        cli.expected_return = v;
    }
    if let Some(v) = payload.account_type {
        cli.account_type = v.into();
    }
    if let Some(v) = payload.province {
        cli.province = v.into();
    }
    if let Some(v) = payload.gross_income {
        cli.gross_income = v;
    }
    if let Some(v) = payload.home_appreciation_rate {
        cli.home_appreciation_rate = v;
    }
    if let Some(v) = payload.show_real_terms {
        cli.show_real_terms = v;
    }
    if let Some(v) = payload.inflation_rate {
        cli.inflation_rate = v;
    }
    if let Some(v) = payload.analysis_mode {
        cli.analysis_mode = v.into();
    }

    let mode = cli.analysis_mode;
    let inputs = build_inputs(cli)?;
    Ok(ApiRequest { inputs, mode })
}

fn default_cli_for_api() -> Cli {
    Cli {
        loan_balance: 400_000.0,
        home_value: None,
        interest_rate: 5.5,
        years_remaining: 25,
        months_remaining: 0,
        regular_payment: None,
        extra_payment: 500.0,
        extra_payment_frequency: CliExtraPaymentFrequency::Monthly,
        expected_return: 7.0,
        account_type: CliAccountType::Tfsa,
        province: CliProvince::On,
        gross_income: 80_000.0,
        home_appreciation_rate: 3.0,
        show_real_terms: false,
        inflation_rate: 2.0,
        analysis_mode: AnalysisMode::Comparison,
    }
}

fn build_calculate_response(
    inputs: &CalculatorInputs,
    mode: AnalysisMode,
    as_of: NaiveDate,
) -> CalculateResponse {
    let (results, sensitivity) = match mode {
        AnalysisMode::Comparison => (Some(run_comparison_as_of(inputs, as_of)), None),
        AnalysisMode::Sensitivity => (None, Some(run_sensitivity_analysis_as_of(inputs, as_of))),
    };

    CalculateResponse {
        mode: mode.into(),
        horizon_months: inputs.horizon_months(),
        regular_payment: inputs.regular_payment,
        net_return: net_return(
            inputs.expected_return,
            inputs.account_type,
            inputs.gross_income,
            inputs.province,
        ),
        tax: tax_rate_info(inputs.gross_income, inputs.province, inputs.account_type),
        results,
        sensitivity,
    }
}
