use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LendingError, Result};
use crate::types::LoanHistoryStatus;

/// a single savings deposit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavingsRecord {
    pub amount: Money,
}

/// a settled or actively repaying loan in the member's history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanRecord {
    pub status: LoanHistoryStatus,
    pub late_payment_count: u32,
}

impl LoanRecord {
    pub fn new(status: LoanHistoryStatus, late_payment_count: u32) -> Self {
        Self {
            status,
            late_payment_count,
        }
    }
}

/// pre-aggregated member history the scorer works from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CreditScoreFactors {
    pub membership_duration_months: Decimal,
    pub share_capital: Money,
    pub savings_records: Vec<SavingsRecord>,
    pub loan_history: Vec<LoanRecord>,
    pub transaction_count: u32,
}

impl CreditScoreFactors {
    /// total saved, saturating at `Decimal::MAX`
    pub fn total_savings(&self) -> Money {
        let total = self
            .savings_records
            .iter()
            .fold(Decimal::ZERO, |acc, s| acc.saturating_add(s.amount.as_decimal()));
        Money::from_decimal(total)
    }

    pub fn validate(&self) -> Result<()> {
        if self.membership_duration_months < Decimal::ZERO {
            return Err(LendingError::InvalidFactor {
                field: "membership_duration_months",
                message: format!("{} is negative", self.membership_duration_months),
            });
        }

        if self.share_capital.is_negative() {
            return Err(LendingError::InvalidFactor {
                field: "share_capital",
                message: format!("{} is negative", self.share_capital),
            });
        }

        if let Some(record) = self.savings_records.iter().find(|s| s.amount.is_negative()) {
            return Err(LendingError::InvalidFactor {
                field: "savings_records",
                message: format!("deposit of {} is negative", record.amount),
            });
        }

        Ok(())
    }
}
