mod engine;
mod error;
mod solver;
mod types;

pub use engine::{run_projection, simulate_years, validate_input};
pub use error::ProjectionError;
pub use solver::{
    GrowthPath, annual_social_security_offset, coast_fire_milestone, coast_fire_number,
    fire_number,
};
pub use types::{
    AdvancedModeConfig, ChartSeries, EARLY_ACCESS_AGE, HORIZON_AGE, ProjectionInput,
    ProjectionResult, ProjectionYear, RETIREMENT_SAVINGS_SHARE, SocialSecurityConfig,
    SpouseConfig,
};
