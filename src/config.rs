use std::path::Path;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::errors::{LendingError, Result};
use crate::scoring::CreditScore;
use crate::types::DueDatePolicy;

/// lending configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LendingConfig {
    pub schedule: ScheduleConfig,
    pub scoring: ScoringConfig,
}

/// repayment schedule settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// precision installment amounts are rounded to
    pub currency_decimal_places: u32,
    pub due_date_policy: DueDatePolicy,
    pub max_term_months: u32,
    pub max_annual_rate_percent: Decimal,
}

/// credit score weights, caps and bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub base_score: Decimal,
    pub min_score: Decimal,
    pub max_score: Decimal,
    /// substituted by callers when member history cannot be resolved
    pub neutral_fallback_score: Decimal,

    pub membership_points_per_month: Decimal,
    pub membership_cap: Decimal,

    /// share capital is scored per `share_capital_unit` held
    pub share_capital_unit: Decimal,
    pub share_capital_points_per_unit: Decimal,
    pub share_capital_cap: Decimal,

    pub savings_points_per_record: Decimal,
    pub savings_regularity_cap: Decimal,
    /// total saved is scored per `savings_amount_unit`
    pub savings_amount_unit: Decimal,
    pub savings_amount_points_per_unit: Decimal,
    pub savings_amount_cap: Decimal,

    pub repaying_clean_bonus: Decimal,
    pub repaying_minor_late_bonus: Decimal,
    /// late payments up to this count still earn the minor-late bonus
    pub minor_late_threshold: u32,
    pub completed_loan_bonus: Decimal,
    pub defaulted_loan_penalty: Decimal,
    /// repayment factor is clamped to [-cap, cap]
    pub repayment_cap: Decimal,
    pub no_history_points: Decimal,

    pub transaction_points_per_transaction: Decimal,
    pub transaction_cap: Decimal,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            currency_decimal_places: 2,
            due_date_policy: DueDatePolicy::CalendarMonth,
            max_term_months: 360,
            max_annual_rate_percent: dec!(100),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_score: dec!(550),
            min_score: dec!(300),
            max_score: dec!(850),
            neutral_fallback_score: dec!(500),
            membership_points_per_month: dec!(2),
            membership_cap: dec!(50),
            share_capital_unit: dec!(1000),
            share_capital_points_per_unit: dec!(5),
            share_capital_cap: dec!(50),
            savings_points_per_record: dec!(5),
            savings_regularity_cap: dec!(25),
            savings_amount_unit: dec!(5000),
            savings_amount_points_per_unit: dec!(50),
            savings_amount_cap: dec!(50),
            repaying_clean_bonus: dec!(20),
            repaying_minor_late_bonus: dec!(10),
            minor_late_threshold: 2,
            completed_loan_bonus: dec!(30),
            defaulted_loan_penalty: dec!(50),
            repayment_cap: dec!(150),
            no_history_points: dec!(25),
            transaction_points_per_transaction: dec!(1),
            transaction_cap: dec!(25),
        }
    }
}

impl LendingConfig {
    /// parse and validate a json configuration; missing fields take defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: LendingConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// read, parse and validate a json configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        self.schedule.validate()?;
        self.scoring.validate()
    }
}

impl ScheduleConfig {
    pub fn validate(&self) -> Result<()> {
        if self.currency_decimal_places > 8 {
            return Err(invalid("currency_decimal_places must be at most 8"));
        }
        if self.max_term_months == 0 {
            return Err(invalid("max_term_months must be at least 1"));
        }
        if self.max_annual_rate_percent <= Decimal::ZERO {
            return Err(invalid("max_annual_rate_percent must be positive"));
        }
        Ok(())
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_score < Decimal::from(CreditScore::MIN)
            || self.max_score > Decimal::from(CreditScore::MAX)
        {
            return Err(invalid("score bounds must lie within [300, 850]"));
        }
        if self.min_score >= self.max_score {
            return Err(invalid("min_score must be below max_score"));
        }
        if self.base_score < self.min_score || self.base_score > self.max_score {
            return Err(invalid("base_score must lie within [min_score, max_score]"));
        }
        if self.neutral_fallback_score < self.min_score
            || self.neutral_fallback_score > self.max_score
        {
            return Err(invalid("neutral_fallback_score must lie within [min_score, max_score]"));
        }
        for (name, unit) in [
            ("share_capital_unit", self.share_capital_unit),
            ("savings_amount_unit", self.savings_amount_unit),
        ] {
            if unit <= Decimal::ZERO {
                return Err(invalid(&format!("{} must be positive", name)));
            }
        }
        for (name, value) in [
            ("membership_cap", self.membership_cap),
            ("share_capital_cap", self.share_capital_cap),
            ("savings_regularity_cap", self.savings_regularity_cap),
            ("savings_amount_cap", self.savings_amount_cap),
            ("repayment_cap", self.repayment_cap),
            ("transaction_cap", self.transaction_cap),
        ] {
            if value < Decimal::ZERO {
                return Err(invalid(&format!("{} must not be negative", name)));
            }
        }
        Ok(())
    }
}

fn invalid(message: &str) -> LendingError {
    LendingError::InvalidConfiguration {
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = LendingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scoring.base_score, dec!(550));
        assert_eq!(config.scoring.neutral_fallback_score, dec!(500));
        assert_eq!(config.schedule.due_date_policy, DueDatePolicy::CalendarMonth);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let json = r#"{
            "schedule": { "due_date_policy": "thirty_day_blocks" },
            "scoring": { "base_score": "600" }
        }"#;
        let config = LendingConfig::from_json_str(json).unwrap();

        assert_eq!(config.schedule.due_date_policy, DueDatePolicy::ThirtyDayBlocks);
        assert_eq!(config.schedule.currency_decimal_places, 2);
        assert_eq!(config.scoring.base_score, dec!(600));
        assert_eq!(config.scoring.max_score, dec!(850));
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let json = r#"{ "scoring": { "min_score": "900" } }"#;
        let err = LendingConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, LendingError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_bounds_outside_score_scale_rejected() {
        let mut config = LendingConfig::default();
        config.scoring.min_score = dec!(250);
        assert!(config.validate().is_err());

        let mut config = LendingConfig::default();
        config.scoring.max_score = dec!(900);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_unit_rejected() {
        let mut config = LendingConfig::default();
        config.scoring.savings_amount_unit = Decimal::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        let err = LendingConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, LendingError::ConfigParse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = LendingConfig::from_json_file("/nonexistent/sacco-lending.json").unwrap_err();
        assert!(matches!(err, LendingError::ConfigIo(_)));
    }
}
