use log::debug;

use super::error::ProjectionError;
use super::solver::{GrowthPath, coast_fire_milestone, coast_fire_number, fire_number};
use super::types::{
    EARLY_ACCESS_AGE, HORIZON_AGE, ProjectionInput, ProjectionResult, ProjectionYear,
    RETIREMENT_SAVINGS_SHARE, SocialSecurityConfig,
};

const MAX_AGE: u32 = 120;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Buckets {
    retirement: f64,
    taxable: f64,
}

impl Buckets {
    fn total(self) -> f64 {
        self.retirement + self.taxable
    }

    fn grown(self, rates: BucketRates) -> Self {
        Self {
            retirement: self.retirement * (1.0 + rates.retirement),
            taxable: self.taxable * (1.0 + rates.taxable),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct BucketRates {
    retirement: f64,
    taxable: f64,
}

/// Carried between years; everything else is derived from the inputs.
#[derive(Debug, Clone, Copy)]
struct YearState {
    age: u32,
    buckets: Buckets,
    /// Nominal expenses of the previous withdrawal year.
    prior_expenses: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
struct YearFlows {
    expenses: f64,
    social_security: f64,
    next: Option<YearState>,
}

struct Simulation<'a> {
    inputs: &'a ProjectionInput,
    fire_number: f64,
    real_rate: f64,
    two_buckets: bool,
    rates: BucketRates,
}

pub fn run_projection(inputs: &ProjectionInput) -> Result<ProjectionResult, ProjectionError> {
    validate_input(inputs)?;

    let fire = fire_number(inputs)
        .ok_or_else(|| ProjectionError::invalid("safe_withdrawal_rate", "must be > 0"))?;
    let coast = coast_fire_number(inputs).ok_or_else(|| {
        ProjectionError::invalid(
            "inflation_rate",
            "real return rate must be greater than -100%",
        )
    })?;

    let path = GrowthPath::for_inputs(inputs);
    let years_to_fire = path.years_to_fire_target(fire);
    let years_to_coast_fire = path.years_to_coast_target(coast);
    let years = simulate_years(inputs, fire);

    debug!(
        "projection: fire_number={fire:.2} coast_fire_number={coast:.2} years_to_fire={years_to_fire:?} years_to_coast_fire={years_to_coast_fire:?} simulated_years={}",
        years.len()
    );

    Ok(build_projection_result(
        inputs,
        fire,
        coast,
        years_to_fire,
        years_to_coast_fire,
        years,
    ))
}

pub fn validate_input(inputs: &ProjectionInput) -> Result<(), ProjectionError> {
    if inputs.current_age > MAX_AGE {
        return Err(ProjectionError::invalid(
            "current_age",
            format!("must be <= {MAX_AGE}"),
        ));
    }
    if inputs.retirement_age > MAX_AGE {
        return Err(ProjectionError::invalid(
            "retirement_age",
            format!("must be <= {MAX_AGE}"),
        ));
    }
    if inputs.retirement_age <= inputs.current_age {
        return Err(ProjectionError::invalid(
            "retirement_age",
            "must be greater than current_age",
        ));
    }

    require_amount("current_assets", inputs.current_assets)?;
    require_amount("monthly_income", inputs.monthly_income)?;
    require_amount("monthly_expenses", inputs.monthly_expenses)?;
    require_amount("monthly_savings", inputs.monthly_savings)?;
    require_amount("retirement_expenses", inputs.retirement_expenses)?;

    require_growth_rate("investment_return_rate", inputs.investment_return_rate)?;
    require_growth_rate("inflation_rate", inputs.inflation_rate)?;
    if inputs.real_return_rate() <= -1.0 {
        return Err(ProjectionError::invalid(
            "inflation_rate",
            "real return rate must be greater than -100%",
        ));
    }
    let swr = inputs.safe_withdrawal_rate;
    if !swr.is_finite() || swr <= 0.0 || swr > 1.0 {
        return Err(ProjectionError::invalid(
            "safe_withdrawal_rate",
            format!("must be within (0, 1], got {swr}"),
        ));
    }

    if let Some(cfg) = inputs.advanced_mode() {
        require_amount("retirement_accounts", cfg.retirement_accounts)?;
        require_amount("taxable_accounts", cfg.taxable_accounts)?;
        require_growth_rate(
            "retirement_account_return_rate",
            cfg.retirement_account_return_rate,
        )?;
    }
    if let Some(ss) = inputs.social_security() {
        require_benefit("social_security", ss)?;
    }
    if let Some(spouse) = inputs.spouse.as_ref().filter(|s| s.enabled) {
        if spouse.age > MAX_AGE {
            return Err(ProjectionError::invalid(
                "spouse_age",
                format!("must be <= {MAX_AGE}"),
            ));
        }
        if spouse.social_security.enabled {
            require_benefit("spouse_social_security", &spouse.social_security)?;
        }
    }
    Ok(())
}

fn require_amount(field: &'static str, value: f64) -> Result<(), ProjectionError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ProjectionError::invalid(
            field,
            format!("must be a finite amount >= 0, got {value}"),
        ));
    }
    Ok(())
}

fn require_growth_rate(field: &'static str, value: f64) -> Result<(), ProjectionError> {
    if !value.is_finite() || value <= -1.0 || value > 1.0 {
        return Err(ProjectionError::invalid(
            field,
            format!("must be within (-1, 1], got {value}"),
        ));
    }
    Ok(())
}

fn require_benefit(field: &'static str, ss: &SocialSecurityConfig) -> Result<(), ProjectionError> {
    if ss.start_age > MAX_AGE {
        return Err(ProjectionError::invalid(
            field,
            format!("start age must be <= {MAX_AGE}"),
        ));
    }
    require_amount(field, ss.monthly_benefit)
}

/// Year-by-year asset path from `current_age` through age 90.
///
/// Each row holds balances at the start of that year alongside the year's
/// expenses and benefit income. The series ends early once total assets are
/// gone, or in advanced mode once spendable assets are gone with no benefit
/// income to lean on.
pub fn simulate_years(inputs: &ProjectionInput, fire_number: f64) -> Vec<ProjectionYear> {
    if inputs.current_age > HORIZON_AGE {
        return Vec::new();
    }
    let sim = Simulation::new(inputs, fire_number);
    let span = HORIZON_AGE - inputs.current_age;

    (0..=span)
        .scan(Some(sim.initial_state()), |carried, year_index| {
            let state = carried.take()?;
            let (row, next) = sim.advance(state, year_index);
            *carried = next;
            Some(row)
        })
        .collect()
}

impl<'a> Simulation<'a> {
    fn new(inputs: &'a ProjectionInput, fire_number: f64) -> Self {
        let advanced = inputs.advanced_mode();
        let rates = BucketRates {
            retirement: advanced
                .map(|cfg| cfg.retirement_account_return_rate)
                .unwrap_or(inputs.investment_return_rate),
            taxable: inputs.investment_return_rate,
        };
        Self {
            inputs,
            fire_number,
            real_rate: inputs.real_return_rate(),
            two_buckets: advanced.is_some(),
            rates,
        }
    }

    fn initial_state(&self) -> YearState {
        let buckets = match self.inputs.advanced_mode() {
            Some(cfg) => Buckets {
                retirement: cfg.retirement_accounts,
                taxable: cfg.taxable_accounts,
            },
            None => Buckets {
                retirement: 0.0,
                taxable: self.inputs.current_assets,
            },
        };
        YearState {
            age: self.inputs.current_age,
            buckets,
            prior_expenses: None,
        }
    }

    fn advance(&self, state: YearState, year_index: u32) -> (ProjectionYear, Option<YearState>) {
        let flows = if state.age < self.inputs.retirement_age {
            self.accumulation_year(state)
        } else {
            self.withdrawal_year(state)
        };

        let accessible = self.accessible_assets(state.age, state.buckets);
        let milestone = coast_fire_milestone(
            self.fire_number,
            self.real_rate,
            state.age,
            self.inputs.retirement_age,
        );
        let row = ProjectionYear {
            age: state.age,
            year_index,
            total_assets: state.buckets.total(),
            retirement_bucket: state.buckets.retirement,
            taxable_bucket: state.buckets.taxable,
            accessible_assets: accessible,
            period_expenses: flows.expenses,
            social_security_benefit_applied: flows.social_security,
            coast_fire_milestone: milestone,
            achieved_coast_fire: accessible >= milestone,
            achieved_fire: accessible >= self.fire_number,
        };
        (row, flows.next)
    }

    fn accumulation_year(&self, state: YearState) -> YearFlows {
        let savings = self.inputs.annual_savings();
        let grown = state.buckets.grown(self.rates);
        let buckets = if self.two_buckets {
            let to_retirement = savings * RETIREMENT_SAVINGS_SHARE;
            Buckets {
                retirement: grown.retirement + to_retirement,
                taxable: grown.taxable + (savings - to_retirement),
            }
        } else {
            Buckets {
                retirement: grown.retirement,
                taxable: grown.taxable + savings,
            }
        };

        YearFlows {
            expenses: self.inputs.monthly_expenses * 12.0,
            social_security: 0.0,
            next: self.continue_with(state, buckets, None),
        }
    }

    fn withdrawal_year(&self, state: YearState) -> YearFlows {
        let expenses = match state.prior_expenses {
            Some(prior) => prior * (1.0 + self.inputs.inflation_rate),
            None => {
                let years_retired = state.age.saturating_sub(self.inputs.retirement_age);
                self.inputs.retirement_expenses
                    * (1.0 + self.inputs.inflation_rate).powi(years_retired as i32)
            }
        };
        let social_security = self.social_security_income(state.age);
        let net_expenses = (expenses - social_security).max(0.0);

        let grown = state.buckets.grown(self.rates);
        let buckets = if self.two_buckets {
            self.withdraw_taxable_first(state.age, grown, net_expenses)
        } else {
            Buckets {
                retirement: grown.retirement,
                taxable: grown.taxable - net_expenses,
            }
        };

        let mut next = self.continue_with(state, buckets, Some(expenses));
        if self.two_buckets
            && social_security <= 0.0
            && self.accessible_assets(state.age, buckets) <= 0.0
        {
            next = None;
        }

        YearFlows {
            expenses,
            social_security,
            next,
        }
    }

    /// Taxable first; the retirement bucket only covers what is left from
    /// the early-access age onwards. Anything uncovered before then is lost.
    fn withdraw_taxable_first(&self, age: u32, buckets: Buckets, amount: f64) -> Buckets {
        let from_taxable = amount.min(buckets.taxable.max(0.0));
        let remainder = amount - from_taxable;
        let from_retirement = if age >= EARLY_ACCESS_AGE {
            remainder.min(buckets.retirement.max(0.0))
        } else {
            0.0
        };
        Buckets {
            retirement: buckets.retirement - from_retirement,
            taxable: (buckets.taxable - from_taxable).max(0.0),
        }
    }

    fn continue_with(
        &self,
        state: YearState,
        buckets: Buckets,
        prior_expenses: Option<f64>,
    ) -> Option<YearState> {
        if buckets.total() <= 0.0 {
            return None;
        }
        Some(YearState {
            age: state.age + 1,
            buckets,
            prior_expenses,
        })
    }

    fn accessible_assets(&self, age: u32, buckets: Buckets) -> f64 {
        if self.two_buckets && age < EARLY_ACCESS_AGE {
            buckets.taxable
        } else {
            buckets.total()
        }
    }

    /// Benefit income for `age`, each person gated on their own start age.
    fn social_security_income(&self, age: u32) -> f64 {
        let primary = self
            .inputs
            .social_security()
            .filter(|ss| age >= ss.start_age)
            .map(|ss| ss.annual_benefit())
            .unwrap_or(0.0);
        let years_elapsed = age.saturating_sub(self.inputs.current_age);
        let spouse = self
            .inputs
            .spouse_social_security()
            .filter(|(spouse_age, ss)| spouse_age + years_elapsed >= ss.start_age)
            .map(|(_, ss)| ss.annual_benefit())
            .unwrap_or(0.0);
        primary + spouse
    }
}

fn build_projection_result(
    inputs: &ProjectionInput,
    fire_number: f64,
    coast_fire_number: f64,
    years_to_fire: Option<f64>,
    years_to_coast_fire: Option<f64>,
    years: Vec<ProjectionYear>,
) -> ProjectionResult {
    let current_assets = inputs.starting_assets();
    let monthly_shortfall = match years_to_fire {
        Some(t) if t > 0.0 => ((fire_number - current_assets) / t / 12.0).max(0.0),
        _ => 0.0,
    };

    ProjectionResult {
        fire_number,
        coast_fire_number,
        years_to_fire,
        years_to_coast_fire,
        coast_fire_age: years_to_coast_fire.map(|t| inputs.current_age as f64 + t),
        monthly_shortfall,
        current_fire_status: current_assets >= fire_number,
        current_coast_fire_status: current_assets >= coast_fire_number,
        years,
    }
}
