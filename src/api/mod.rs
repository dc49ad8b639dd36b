use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::Parser;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    AdvancedModeConfig, ChartSeries, ProjectionInput, ProjectionResult, SocialSecurityConfig,
    SpouseConfig, run_projection,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CalculatePayload {
    current_age: Option<u32>,
    retirement_age: Option<u32>,
    current_assets: Option<f64>,
    monthly_income: Option<f64>,
    monthly_expenses: Option<f64>,
    monthly_savings: Option<f64>,
    retirement_expenses: Option<f64>,
    investment_return_rate: Option<f64>,
    inflation_rate: Option<f64>,
    safe_withdrawal_rate: Option<f64>,

    advanced_mode: Option<bool>,
    retirement_accounts: Option<f64>,
    taxable_accounts: Option<f64>,
    retirement_account_return_rate: Option<f64>,

    social_security_enabled: Option<bool>,
    social_security_start_age: Option<u32>,
    social_security_monthly_benefit: Option<f64>,

    spouse_enabled: Option<bool>,
    spouse_age: Option<u32>,
    spouse_social_security_enabled: Option<bool>,
    spouse_social_security_start_age: Option<u32>,
    spouse_social_security_monthly_benefit: Option<f64>,
}

#[derive(Parser, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[command(
    name = "fire-projection",
    about = "FIRE and Coast FIRE projection (two-bucket accounts + social security offsets)"
)]
struct Cli {
    #[arg(long)]
    current_age: u32,
    #[arg(long)]
    retirement_age: u32,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Invested assets today; ignored in advanced mode"
    )]
    current_assets: f64,
    #[arg(long, default_value_t = 0.0)]
    monthly_income: f64,
    #[arg(long, default_value_t = 0.0)]
    monthly_expenses: f64,
    #[arg(long)]
    monthly_savings: f64,
    #[arg(long, help = "Annual spending in retirement, today's money")]
    retirement_expenses: f64,
    #[arg(
        long,
        default_value_t = 7.0,
        help = "Expected annual investment return in percent"
    )]
    investment_return_rate: f64,
    #[arg(long, default_value_t = 3.0, help = "Annual inflation in percent")]
    inflation_rate: f64,
    #[arg(long, default_value_t = 4.0, help = "Safe withdrawal rate in percent")]
    safe_withdrawal_rate: f64,

    #[arg(
        long,
        help = "Track retirement and taxable accounts separately (retirement locked until 65)"
    )]
    advanced_mode: bool,
    #[arg(long, default_value_t = 0.0)]
    retirement_accounts: f64,
    #[arg(long, default_value_t = 0.0)]
    taxable_accounts: f64,
    #[arg(
        long,
        default_value_t = 7.0,
        help = "Retirement account annual return in percent"
    )]
    retirement_account_return_rate: f64,

    #[arg(long)]
    social_security_enabled: bool,
    #[arg(long, default_value_t = 65)]
    social_security_start_age: u32,
    #[arg(long, default_value_t = 0.0)]
    social_security_monthly_benefit: f64,

    #[arg(long)]
    spouse_enabled: bool,
    #[arg(long, default_value_t = 30)]
    spouse_age: u32,
    #[arg(long)]
    spouse_social_security_enabled: bool,
    #[arg(long, default_value_t = 65)]
    spouse_social_security_start_age: u32,
    #[arg(long, default_value_t = 0.0)]
    spouse_social_security_monthly_benefit: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalculateResponse {
    inputs: Cli,
    result: ProjectionResult,
    projection_data: ChartSeries,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

fn build_inputs(cli: &Cli) -> Result<ProjectionInput, String> {
    if !(18..=100).contains(&cli.current_age) {
        return Err("--current-age must be between 18 and 100".to_string());
    }

    if !(50..=100).contains(&cli.retirement_age) {
        return Err("--retirement-age must be between 50 and 100".to_string());
    }

    if cli.retirement_age <= cli.current_age {
        return Err("--retirement-age must be > --current-age".to_string());
    }

    for (flag, value) in [
        ("--current-assets", cli.current_assets),
        ("--monthly-income", cli.monthly_income),
        ("--monthly-expenses", cli.monthly_expenses),
        ("--monthly-savings", cli.monthly_savings),
        ("--retirement-expenses", cli.retirement_expenses),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(format!("{flag} must be >= 0"));
        }
    }

    if !(0.0..=20.0).contains(&cli.investment_return_rate) {
        return Err("--investment-return-rate must be between 0 and 20".to_string());
    }

    if !(0.0..=10.0).contains(&cli.inflation_rate) {
        return Err("--inflation-rate must be between 0 and 10".to_string());
    }

    if !(2.0..=8.0).contains(&cli.safe_withdrawal_rate) {
        return Err("--safe-withdrawal-rate must be between 2 and 8".to_string());
    }

    if cli.advanced_mode {
        if !cli.retirement_accounts.is_finite() || cli.retirement_accounts < 0.0 {
            return Err("--retirement-accounts must be >= 0".to_string());
        }
        if !cli.taxable_accounts.is_finite() || cli.taxable_accounts < 0.0 {
            return Err("--taxable-accounts must be >= 0".to_string());
        }
        if !(0.0..=20.0).contains(&cli.retirement_account_return_rate) {
            return Err("--retirement-account-return-rate must be between 0 and 20".to_string());
        }
    }

    if cli.social_security_enabled {
        if !(62..=70).contains(&cli.social_security_start_age) {
            return Err("--social-security-start-age must be between 62 and 70".to_string());
        }
        if !cli.social_security_monthly_benefit.is_finite()
            || cli.social_security_monthly_benefit < 0.0
        {
            return Err("--social-security-monthly-benefit must be >= 0".to_string());
        }
    }

    if cli.spouse_enabled {
        if !(18..=100).contains(&cli.spouse_age) {
            return Err("--spouse-age must be between 18 and 100".to_string());
        }
        if cli.spouse_social_security_enabled {
            if !(62..=70).contains(&cli.spouse_social_security_start_age) {
                return Err(
                    "--spouse-social-security-start-age must be between 62 and 70".to_string(),
                );
            }
            if !cli.spouse_social_security_monthly_benefit.is_finite()
                || cli.spouse_social_security_monthly_benefit < 0.0
            {
                return Err("--spouse-social-security-monthly-benefit must be >= 0".to_string());
            }
        }
    }

    Ok(ProjectionInput {
        current_age: cli.current_age,
        retirement_age: cli.retirement_age,
        current_assets: cli.current_assets,
        monthly_income: cli.monthly_income,
        monthly_expenses: cli.monthly_expenses,
        monthly_savings: cli.monthly_savings,
        retirement_expenses: cli.retirement_expenses,
        investment_return_rate: cli.investment_return_rate / 100.0,
        inflation_rate: cli.inflation_rate / 100.0,
        safe_withdrawal_rate: cli.safe_withdrawal_rate / 100.0,
        advanced: Some(AdvancedModeConfig {
            enabled: cli.advanced_mode,
            retirement_accounts: cli.retirement_accounts,
            taxable_accounts: cli.taxable_accounts,
            retirement_account_return_rate: cli.retirement_account_return_rate / 100.0,
        }),
        social_security: Some(SocialSecurityConfig {
            enabled: cli.social_security_enabled,
            start_age: cli.social_security_start_age,
            monthly_benefit: cli.social_security_monthly_benefit,
        }),
        spouse: Some(SpouseConfig {
            enabled: cli.spouse_enabled,
            age: cli.spouse_age,
            social_security: SocialSecurityConfig {
                enabled: cli.spouse_enabled && cli.spouse_social_security_enabled,
                start_age: cli.spouse_social_security_start_age,
                monthly_benefit: cli.spouse_social_security_monthly_benefit,
            },
        }),
    })
}

fn calculate(cli: Cli) -> Result<CalculateResponse, String> {
    let inputs = build_inputs(&cli)?;
    let result = run_projection(&inputs).map_err(|e| e.to_string())?;
    Ok(CalculateResponse {
        projection_data: result.chart_series(),
        inputs: cli,
        result,
    })
}

/// Parses command-line flags, runs one projection and renders it as JSON.
pub fn run_cli<I, T>(args: I) -> Result<String, String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;
    let response = calculate(cli)?;
    serde_json::to_string_pretty(&response).map_err(|e| format!("Failed to encode result: {e}"))
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/calculate",
            get(calculate_get_handler).post(calculate_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!("FIRE projection API listening on http://{addr}");

    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn calculate_get_handler(Query(payload): Query<CalculatePayload>) -> Response {
    calculate_handler_impl(payload).await
}

async fn calculate_post_handler(Json(payload): Json<CalculatePayload>) -> Response {
    calculate_handler_impl(payload).await
}

async fn calculate_handler_impl(payload: CalculatePayload) -> Response {
    match calculate(cli_from_payload(payload)) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => {
            warn!("rejected calculation request: {msg}");
            error_response(StatusCode::BAD_REQUEST, &msg)
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
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
fn cli_from_json(json: &str) -> Result<Cli, String> {
    let payload = serde_json::from_str::<CalculatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    Ok(cli_from_payload(payload))
}

fn cli_from_payload(payload: CalculatePayload) -> Cli {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.current_age {
        cli.current_age = v;
    }
    if let Some(v) = payload.retirement_age {
        cli.retirement_age = v;
    }
    if let Some(v) = payload.current_assets {
        cli.current_assets = v;
    }
    if let Some(v) = payload.monthly_income {
        cli.monthly_income = v;
    }
    if let Some(v) = payload.monthly_expenses {
        cli.monthly_expenses = v;
    }
    if let Some(v) = payload.monthly_savings {
        cli.monthly_savings = v;
    }
    if let Some(v) = payload.retirement_expenses {
        cli.retirement_expenses = v;
    }
    if let Some(v) = payload.investment_return_rate {
        cli.investment_return_rate = v;
    }
    if let Some(v) = payload.inflation_rate {
        cli.inflation_rate = v;
    }
    if let Some(v) = payload.safe_withdrawal_rate {
        cli.safe_withdrawal_rate = v;
    }

    if let Some(v) = payload.advanced_mode {
        cli.advanced_mode = v;
    }
    if let Some(v) = payload.retirement_accounts {
        cli.retirement_accounts = v;
    }
    if let Some(v) = payload.taxable_accounts {
        cli.taxable_accounts = v;
    }
    if let Some(v) = payload.retirement_account_return_rate {
        cli.retirement_account_return_rate = v;
    }

    if let Some(v) = payload.social_security_enabled {
        cli.social_security_enabled = v;
    }
    if let Some(v) = payload.social_security_start_age {
        cli.social_security_start_age = v;
    }
    if let Some(v) = payload.social_security_monthly_benefit {
        cli.social_security_monthly_benefit = v;
    }

    if let Some(v) = payload.spouse_enabled {
        cli.spouse_enabled = v;
    }
    if let Some(v) = payload.spouse_age {
        cli.spouse_age = v;
    }
    if let Some(v) = payload.spouse_social_security_enabled {
        cli.spouse_social_security_enabled = v;
    }
    if let Some(v) = payload.spouse_social_security_start_age {
        cli.spouse_social_security_start_age = v;
    }
    if let Some(v) = payload.spouse_social_security_monthly_benefit {
        cli.spouse_social_security_monthly_benefit = v;
    }

    if cli.advanced_mode {
        cli.current_assets = cli.retirement_accounts + cli.taxable_accounts;
    }

    cli
}

fn default_cli_for_api() -> Cli {
    Cli {
        current_age: 30,
        retirement_age: 65,
        current_assets: 0.0,
        monthly_income: 0.0,
        monthly_expenses: 0.0,
        monthly_savings: 0.0,
        retirement_expenses: 40_000.0,
        investment_return_rate: 7.0,
        inflation_rate: 3.0,
        safe_withdrawal_rate: 4.0,
        advanced_mode: false,
        retirement_accounts: 0.0,
        taxable_accounts: 0.0,
        retirement_account_return_rate: 7.0,
        social_security_enabled: false,
        social_security_start_age: 65,
        social_security_monthly_benefit: 0.0,
        spouse_enabled: false,
        spouse_age: 30,
        spouse_social_security_enabled: false,
        spouse_social_security_start_age: 65,
        spouse_social_security_monthly_benefit: 0.0,
    }
}
