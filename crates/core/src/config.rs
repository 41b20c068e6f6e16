//! Engine configuration.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ANNUAL_GROWTH_RATE, DEFAULT_MAX_ACTIVE_GOALS, MAX_PROJECTION_MONTHS,
};
use crate::errors::{Error, Result};
use crate::goals::{monthly_rate_from_annual, ProjectionParams};

const ENV_ANNUAL_GROWTH_RATE: &str = "GOALFUND_ANNUAL_GROWTH_RATE";
const ENV_MAX_ACTIVE_GOALS: &str = "GOALFUND_MAX_ACTIVE_GOALS";
const ENV_PROJECTION_HORIZON_MONTHS: &str = "GOALFUND_PROJECTION_HORIZON_MONTHS";

/// Tunables of the goal engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalEngineConfig {
    /// Annual growth applied to saved balances, e.g. `0.02` for 2%.
    pub annual_growth_rate: Decimal,
    pub max_active_goals: usize,
    /// Upper bound (exclusive) of the months-to-target search.
    pub projection_horizon_months: u32,
}

impl Default for GoalEngineConfig {
    fn default() -> Self {
        Self {
            annual_growth_rate: Decimal::from_str(DEFAULT_ANNUAL_GROWTH_RATE)
                .unwrap_or(dec!(0.02)),
            max_active_goals: DEFAULT_MAX_ACTIVE_GOALS,
            projection_horizon_months: MAX_PROJECTION_MONTHS,
        }
    }
}

impl GoalEngineConfig {
    /// Builds the configuration from `GOALFUND_*` environment variables,
    /// loading a `.env` file first when present. Unset keys keep defaults.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::default();

        if let Some(raw) = read_env(ENV_ANNUAL_GROWTH_RATE) {
            config.annual_growth_rate = Decimal::from_str(raw.trim()).map_err(|e| {
                Error::InvalidConfigValue(format!("{}='{}': {}", ENV_ANNUAL_GROWTH_RATE, raw, e))
            })?;
        }
        if let Some(raw) = read_env(ENV_MAX_ACTIVE_GOALS) {
            config.max_active_goals = raw.trim().parse().map_err(|e| {
                Error::InvalidConfigValue(format!("{}='{}': {}", ENV_MAX_ACTIVE_GOALS, raw, e))
            })?;
        }
        if let Some(raw) = read_env(ENV_PROJECTION_HORIZON_MONTHS) {
            config.projection_horizon_months = raw.trim().parse().map_err(|e| {
                Error::InvalidConfigValue(format!(
                    "{}='{}': {}",
                    ENV_PROJECTION_HORIZON_MONTHS, raw, e
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.annual_growth_rate <= dec!(-1) {
            return Err(Error::InvalidConfigValue(format!(
                "annual growth rate must be greater than -100%, got {}",
                self.annual_growth_rate
            )));
        }
        if self.max_active_goals == 0 {
            return Err(Error::InvalidConfigValue(
                "max active goals must be at least 1".to_string(),
            ));
        }
        if self.projection_horizon_months < 2 {
            return Err(Error::InvalidConfigValue(
                "projection horizon must span at least 2 months".to_string(),
            ));
        }
        Ok(())
    }

    /// Monthly rate and search horizon used by every projection.
    pub fn projection_params(&self) -> ProjectionParams {
        ProjectionParams {
            monthly_rate: monthly_rate_from_annual(self.annual_growth_rate),
            horizon_months: self.projection_horizon_months,
        }
    }
}

fn read_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GoalEngineConfig::default();
        assert_eq!(config.annual_growth_rate, dec!(0.02));
        assert_eq!(config.max_active_goals, 5);
        assert_eq!(config.projection_horizon_months, 600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_goal_cap() {
        let config = GoalEngineConfig {
            max_active_goals: 0,
            ..GoalEngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfigValue(_))));
    }

    #[test]
    fn test_validate_rejects_total_loss_rate() {
        let config = GoalEngineConfig {
            annual_growth_rate: dec!(-1),
            ..GoalEngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_projection_params_use_monthly_equivalent() {
        let params = GoalEngineConfig::default().projection_params();
        // (1.02)^(1/12) - 1 ≈ 0.0016516
        assert!((params.monthly_rate - dec!(0.0016516)).abs() < dec!(0.000001));
        assert_eq!(params.horizon_months, 600);
    }
}
