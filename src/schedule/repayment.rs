use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decimal::Money;
use crate::errors::{LendingError, Result};
use crate::types::InstallmentStatus;

use super::amortization::AmortizationSchedule;

/// portion of a repayment credited to one installment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentAllocation {
    pub installment_number: u32,
    pub amount: Money,
    pub settled: bool,
}

/// outcome of applying a repayment to a schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentResult {
    pub amount: Money,
    pub applied: Money,
    /// left over once every installment is settled
    pub excess: Money,
    pub allocations: Vec<InstallmentAllocation>,
}

impl RepaymentResult {
    /// numbers of installments this repayment finished off
    pub fn settled_installments(&self) -> Vec<u32> {
        self.allocations
            .iter()
            .filter(|a| a.settled)
            .map(|a| a.installment_number)
            .collect()
    }
}

impl AmortizationSchedule {
    /// mark pending installments whose due date has passed as overdue
    ///
    /// Returns the numbers of the installments that changed.
    pub fn refresh_overdue(&mut self, now: DateTime<Utc>) -> Vec<u32> {
        let mut changed = Vec::new();

        for installment in &mut self.installments {
            if installment.status == InstallmentStatus::Pending && installment.due_date < now {
                installment.status = InstallmentStatus::Overdue;
                changed.push(installment.installment_number);
            }
        }

        if !changed.is_empty() {
            debug!(count = changed.len(), "installments became overdue");
        }

        changed
    }

    /// apply a repayment to unpaid installments, earliest first
    pub fn apply_repayment(&mut self, amount: Money, now: DateTime<Utc>) -> Result<RepaymentResult> {
        if !amount.is_positive() {
            return Err(LendingError::InvalidRepaymentAmount { amount });
        }

        if self.is_settled() {
            return Err(LendingError::ScheduleAlreadySettled);
        }

        let mut remaining = amount;
        let mut allocations = Vec::new();

        for installment in self.installments.iter_mut().filter(|i| !i.is_paid()) {
            if remaining.is_zero() {
                break;
            }

            let credit = remaining.min(installment.outstanding());
            installment.amount_paid += credit;
            remaining -= credit;

            let settled = installment.outstanding().is_zero();
            if settled {
                installment.status = InstallmentStatus::Paid;
                installment.paid_at = Some(now);
            }

            allocations.push(InstallmentAllocation {
                installment_number: installment.installment_number,
                amount: credit,
                settled,
            });
        }

        let applied = amount - remaining;

        debug!(
            amount = %amount,
            applied = %applied,
            excess = %remaining,
            installments = allocations.len(),
            "applied repayment"
        );

        Ok(RepaymentResult {
            amount,
            applied,
            excess: remaining,
            allocations,
        })
    }
}
