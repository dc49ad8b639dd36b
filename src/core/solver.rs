use log::debug;

use super::ProjectionInput;

/// Compound-growth path with a constant annual contribution:
/// `pv * (1 + r)^t + pmt * ((1 + r)^t - 1) / r`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthPath {
    pub present_value: f64,
    pub annual_contribution: f64,
    pub annual_rate: f64,
}

impl GrowthPath {
    pub fn for_inputs(inputs: &ProjectionInput) -> Self {
        Self {
            present_value: inputs.starting_assets(),
            annual_contribution: inputs.annual_savings(),
            annual_rate: inputs.investment_return_rate,
        }
    }

    pub fn value_after(self, years: f64) -> f64 {
        let r = self.annual_rate;
        if r == 0.0 {
            return self.present_value + self.annual_contribution * years;
        }
        let growth = (1.0 + r).powf(years);
        self.present_value * growth + self.annual_contribution * (growth - 1.0) / r
    }

    /// Years until the path reaches `target`, `None` when it never does.
    ///
    /// Always solves the algebra, even when the starting value already sits
    /// above the target.
    pub fn years_to_fire_target(self, target: f64) -> Option<f64> {
        self.solve(target)
    }

    /// Like [`years_to_fire_target`](Self::years_to_fire_target) but reports
    /// zero years straight away when the target is already met.
    pub fn years_to_coast_target(self, target: f64) -> Option<f64> {
        if self.present_value >= target {
            return Some(0.0);
        }
        self.solve(target)
    }

    fn solve(self, target: f64) -> Option<f64> {
        let pv = self.present_value;
        let pmt = self.annual_contribution;
        let r = self.annual_rate;

        if pmt <= 0.0 && pv < target {
            return None;
        }

        if r == 0.0 {
            if pmt == 0.0 {
                return None;
            }
            return Some(((target - pv) / pmt).max(0.0));
        }

        let ratio = (target * r + pmt) / (pv * r + pmt);
        let base = 1.0 + r;
        if !ratio.is_finite() || ratio <= 0.0 || base <= 0.0 {
            debug!("solver outside log domain: pv={pv} pmt={pmt} r={r} target={target}");
            return None;
        }

        let years = ratio.ln() / base.ln();
        if !years.is_finite() {
            debug!("solver produced non-finite horizon: pv={pv} pmt={pmt} r={r} target={target}");
            return None;
        }
        Some(years.max(0.0))
    }
}

/// Annual benefit income for both people, ignoring start ages.
///
/// The target formula uses this flat offset; the year simulator gates each
/// benefit on its own start age instead.
pub fn annual_social_security_offset(inputs: &ProjectionInput) -> f64 {
    let primary = inputs
        .social_security()
        .map(|ss| ss.annual_benefit())
        .unwrap_or(0.0);
    let spouse = inputs
        .spouse_social_security()
        .map(|(_, ss)| ss.annual_benefit())
        .unwrap_or(0.0);
    primary + spouse
}

/// Assets needed to fund retirement expenses at the safe withdrawal rate.
/// `None` when the withdrawal rate is zero.
pub fn fire_number(inputs: &ProjectionInput) -> Option<f64> {
    if inputs.safe_withdrawal_rate == 0.0 {
        return None;
    }
    let net_expenses =
        (inputs.retirement_expenses - annual_social_security_offset(inputs)).max(0.0);
    Some(net_expenses / inputs.safe_withdrawal_rate)
}

/// Lump sum today that compounds at the real return to the FIRE number by
/// retirement age.
pub fn coast_fire_number(inputs: &ProjectionInput) -> Option<f64> {
    let fire = fire_number(inputs)?;
    discount_over_years(fire, inputs.real_return_rate(), inputs.years_to_retirement())
}

/// Coast FIRE threshold as of `age`; equals the FIRE number from retirement on.
pub fn coast_fire_milestone(
    fire_number: f64,
    real_rate: f64,
    age: u32,
    retirement_age: u32,
) -> f64 {
    discount_over_years(fire_number, real_rate, retirement_age.saturating_sub(age))
        .unwrap_or(fire_number)
}

fn discount_over_years(amount: f64, real_rate: f64, years: u32) -> Option<f64> {
    if years == 0 {
        return Some(amount);
    }
    let exponent = i32::try_from(years).ok()?;
    let divisor = (1.0 + real_rate).powi(exponent);
    if !divisor.is_finite() || divisor <= 0.0 {
        return None;
    }
    Some(amount / divisor)
}
