use serde::Serialize;

/// Age at which the projection series stops.
pub const HORIZON_AGE: u32 = 90;
/// Retirement-bucket balances are locked until this age in advanced mode.
pub const EARLY_ACCESS_AGE: u32 = 65;
/// Share of annual savings routed to the retirement bucket in advanced mode.
pub const RETIREMENT_SAVINGS_SHARE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdvancedModeConfig {
    pub enabled: bool,
    pub retirement_accounts: f64,
    pub taxable_accounts: f64,
    pub retirement_account_return_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SocialSecurityConfig {
    pub enabled: bool,
    pub start_age: u32,
    pub monthly_benefit: f64,
}

impl SocialSecurityConfig {
    pub fn annual_benefit(&self) -> f64 {
        self.monthly_benefit * 12.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpouseConfig {
    pub enabled: bool,
    pub age: u32,
    pub social_security: SocialSecurityConfig,
}

/// Caller-supplied parameters. Rates are decimal fractions (0.07 = 7%).
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionInput {
    pub current_age: u32,
    pub retirement_age: u32,
    pub current_assets: f64,
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub monthly_savings: f64,
    /// Annual spending in retirement, in today's money.
    pub retirement_expenses: f64,
    pub investment_return_rate: f64,
    pub inflation_rate: f64,
    pub safe_withdrawal_rate: f64,
    pub advanced: Option<AdvancedModeConfig>,
    pub social_security: Option<SocialSecurityConfig>,
    pub spouse: Option<SpouseConfig>,
}

impl ProjectionInput {
    /// The two-bucket configuration, only when it is switched on.
    pub fn advanced_mode(&self) -> Option<&AdvancedModeConfig> {
        self.advanced.as_ref().filter(|cfg| cfg.enabled)
    }

    pub fn social_security(&self) -> Option<&SocialSecurityConfig> {
        self.social_security.as_ref().filter(|ss| ss.enabled)
    }

    /// Returns the spouse's current age and benefit config when both the
    /// spouse and the spouse's benefit are enabled.
    pub fn spouse_social_security(&self) -> Option<(u32, &SocialSecurityConfig)> {
        self.spouse
            .as_ref()
            .filter(|spouse| spouse.enabled && spouse.social_security.enabled)
            .map(|spouse| (spouse.age, &spouse.social_security))
    }

    /// Invested assets at t=0. In advanced mode the buckets are authoritative.
    pub fn starting_assets(&self) -> f64 {
        match self.advanced_mode() {
            Some(cfg) => cfg.retirement_accounts + cfg.taxable_accounts,
            None => self.current_assets,
        }
    }

    pub fn annual_savings(&self) -> f64 {
        self.monthly_savings * 12.0
    }

    pub fn real_return_rate(&self) -> f64 {
        self.investment_return_rate - self.inflation_rate
    }

    pub fn years_to_retirement(&self) -> u32 {
        self.retirement_age.saturating_sub(self.current_age)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionYear {
    pub age: u32,
    pub year_index: u32,
    pub total_assets: f64,
    pub retirement_bucket: f64,
    pub taxable_bucket: f64,
    pub accessible_assets: f64,
    pub period_expenses: f64,
    pub social_security_benefit_applied: f64,
    pub coast_fire_milestone: f64,
    pub achieved_coast_fire: bool,
    pub achieved_fire: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub fire_number: f64,
    pub coast_fire_number: f64,
    pub years_to_fire: Option<f64>,
    pub years_to_coast_fire: Option<f64>,
    pub coast_fire_age: Option<f64>,
    pub monthly_shortfall: f64,
    pub current_fire_status: bool,
    pub current_coast_fire_status: bool,
    pub years: Vec<ProjectionYear>,
}

/// Column-oriented copy of the year series, shaped for charting clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub years: Vec<u32>,
    pub ages: Vec<u32>,
    pub assets: Vec<f64>,
    pub accessible_assets: Vec<f64>,
    pub coast_fire_milestones: Vec<f64>,
    pub achieved_coast_fire: Vec<bool>,
    pub achieved_fire: Vec<bool>,
}

impl ProjectionResult {
    pub fn chart_series(&self) -> ChartSeries {
        ChartSeries {
            years: self.years.iter().map(|y| y.year_index).collect(),
            ages: self.years.iter().map(|y| y.age).collect(),
            assets: self.years.iter().map(|y| y.total_assets).collect(),
            accessible_assets: self.years.iter().map(|y| y.accessible_assets).collect(),
            coast_fire_milestones: self.years.iter().map(|y| y.coast_fire_milestone).collect(),
            achieved_coast_fire: self.years.iter().map(|y| y.achieved_coast_fire).collect(),
            achieved_fire: self.years.iter().map(|y| y.achieved_fire).collect(),
        }
    }
}
