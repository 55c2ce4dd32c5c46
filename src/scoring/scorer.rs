use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ScoringConfig;
use crate::errors::{LendingError, Result};
use crate::types::LoanHistoryStatus;

use super::factors::{CreditScoreFactors, LoanRecord};
use super::CreditScore;

/// per-factor contributions behind a score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub base: Decimal,
    pub membership: Decimal,
    pub share_capital: Decimal,
    pub savings_regularity: Decimal,
    pub savings_amount: Decimal,
    pub loan_repayment: Decimal,
    pub transactions: Decimal,
    /// sum before clamping and rounding
    pub raw_total: Decimal,
    pub score: CreditScore,
}

/// weighted-factor credit scorer
#[derive(Debug, Clone, Default)]
pub struct CreditScorer {
    config: ScoringConfig,
}

impl CreditScorer {
    pub fn new(config: ScoringConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// score a member, always within [min_score, max_score]
    pub fn compute_score(&self, factors: &CreditScoreFactors) -> Result<CreditScore> {
        Ok(self.breakdown(factors)?.score)
    }

    pub fn breakdown(&self, factors: &CreditScoreFactors) -> Result<ScoreBreakdown> {
        factors.validate()?;

        let c = &self.config;
        let membership = self.membership_points(factors);
        let share_capital = self.share_capital_points(factors);
        let (savings_regularity, savings_amount) = self.savings_points(factors);
        let loan_repayment = self.repayment_points(&factors.loan_history);
        let transactions = self.transaction_points(factors);

        let raw_total = [
            membership,
            share_capital,
            savings_regularity,
            savings_amount,
            loan_repayment,
            transactions,
        ]
        .into_iter()
        .fold(c.base_score, Decimal::saturating_add);

        let score = self.to_score(raw_total)?;

        debug!(
            raw_total = %raw_total,
            score = score.value(),
            loans = factors.loan_history.len(),
            "computed credit score"
        );

        Ok(ScoreBreakdown {
            base: c.base_score,
            membership,
            share_capital,
            savings_regularity,
            savings_amount,
            loan_repayment,
            transactions,
            raw_total,
            score,
        })
    }

    /// configured neutral score
    pub fn neutral_score(&self) -> CreditScore {
        self.config
            .neutral_fallback_score
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u32()
            .and_then(|value| CreditScore::new(value).ok())
            .unwrap_or_else(CreditScore::neutral)
    }

    /// score aggregated factors, or the neutral score when aggregation failed
    pub fn score_or_neutral(&self, factors: Result<CreditScoreFactors>) -> CreditScore {
        match factors.and_then(|f| self.compute_score(&f)) {
            Ok(score) => score,
            Err(err) => {
                warn!(error = %err, "credit factors unavailable, using neutral score");
                self.neutral_score()
            }
        }
    }

    fn membership_points(&self, factors: &CreditScoreFactors) -> Decimal {
        let c = &self.config;
        capped(factors.membership_duration_months, c.membership_points_per_month, c.membership_cap)
    }

    fn share_capital_points(&self, factors: &CreditScoreFactors) -> Decimal {
        let c = &self.config;
        let units = units_of(factors.share_capital.as_decimal(), c.share_capital_unit);
        capped(units, c.share_capital_points_per_unit, c.share_capital_cap)
    }

    fn savings_points(&self, factors: &CreditScoreFactors) -> (Decimal, Decimal) {
        let c = &self.config;
        let count = Decimal::from(factors.savings_records.len() as u64);
        let regularity = capped(count, c.savings_points_per_record, c.savings_regularity_cap);

        let units = units_of(factors.total_savings().as_decimal(), c.savings_amount_unit);
        let amount = capped(units, c.savings_amount_points_per_unit, c.savings_amount_cap);

        (regularity, amount)
    }

    fn repayment_points(&self, history: &[LoanRecord]) -> Decimal {
        let c = &self.config;
        if history.is_empty() {
            return c.no_history_points;
        }

        let mut completed = 0u32;
        let mut defaulted = 0u32;
        let mut points = Decimal::ZERO;

        for loan in history {
            match loan.status {
                LoanHistoryStatus::FullyPaid => completed += 1,
                LoanHistoryStatus::Defaulted => defaulted += 1,
                LoanHistoryStatus::Repaying => {
                    points = points.saturating_add(match loan.late_payment_count {
                        0 => c.repaying_clean_bonus,
                        n if n <= c.minor_late_threshold => c.repaying_minor_late_bonus,
                        _ => Decimal::ZERO,
                    });
                }
            }
        }

        points = points
            .saturating_add(Decimal::from(completed).saturating_mul(c.completed_loan_bonus))
            .saturating_sub(Decimal::from(defaulted).saturating_mul(c.defaulted_loan_penalty));

        points.max(-c.repayment_cap).min(c.repayment_cap)
    }

    fn transaction_points(&self, factors: &CreditScoreFactors) -> Decimal {
        let c = &self.config;
        capped(
            Decimal::from(factors.transaction_count),
            c.transaction_points_per_transaction,
            c.transaction_cap,
        )
    }

    fn to_score(&self, raw_total: Decimal) -> Result<CreditScore> {
        let c = &self.config;
        raw_total
            .max(c.min_score)
            .min(c.max_score)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u32()
            .ok_or_else(|| LendingError::CalculationError {
                message: format!("score {} not representable", raw_total),
            })
            .and_then(CreditScore::new)
    }
}

/// `quantity * points_per_unit`, never above `cap`
fn capped(quantity: Decimal, points_per_unit: Decimal, cap: Decimal) -> Decimal {
    quantity.saturating_mul(points_per_unit).min(cap)
}

/// how many whole or fractional `unit`s fit in `amount`
fn units_of(amount: Decimal, unit: Decimal) -> Decimal {
    amount.checked_div(unit).unwrap_or(Decimal::MAX)
}

/// score with the default weights
pub fn compute_score(factors: &CreditScoreFactors) -> Result<CreditScore> {
    CreditScorer::default().compute_score(factors)
}
