use std::collections::HashMap;

use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::decimal::Money;
use crate::errors::{LendingError, Result};
use crate::types::{LoanId, LoanStatus, MemberId};

use super::factors::{CreditScoreFactors, LoanRecord, SavingsRecord};
use super::scorer::CreditScorer;
use super::CreditScore;

/// days counted as one month of membership
const DAYS_PER_MEMBERSHIP_MONTH: Decimal = dec!(30);

/// a loan as it appears in a member's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSummary {
    pub loan_id: LoanId,
    pub status: LoanStatus,
    pub late_payment_count: u32,
}

/// everything stored about a member that scoring reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberRecords {
    pub member_id: MemberId,
    pub joined_at: DateTime<Utc>,
    pub share_capital: Money,
    pub savings: Vec<SavingsRecord>,
    pub loans: Vec<LoanSummary>,
    pub transaction_count: u32,
}

impl MemberRecords {
    pub fn new(member_id: MemberId, joined_at: DateTime<Utc>) -> Self {
        Self {
            member_id,
            joined_at,
            share_capital: Money::ZERO,
            savings: Vec::new(),
            loans: Vec::new(),
            transaction_count: 0,
        }
    }
}

/// lookup of member records from whatever store backs the cooperative
pub trait MemberDirectory {
    fn member_records(&self, member_id: MemberId) -> Result<MemberRecords>;
}

/// in-memory directory
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    members: HashMap<MemberId, MemberRecords>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, records: MemberRecords) {
        self.members.insert(records.member_id, records);
    }

    /// add or replace a loan in a member's history
    pub fn record_loan(&mut self, member_id: MemberId, loan: LoanSummary) -> Result<()> {
        let records = self
            .members
            .get_mut(&member_id)
            .ok_or(LendingError::MemberNotFound { member_id })?;

        match records.loans.iter_mut().find(|l| l.loan_id == loan.loan_id) {
            Some(existing) => *existing = loan,
            None => records.loans.push(loan),
        }
        Ok(())
    }
}

impl MemberDirectory for InMemoryDirectory {
    fn member_records(&self, member_id: MemberId) -> Result<MemberRecords> {
        self.members
            .get(&member_id)
            .cloned()
            .ok_or(LendingError::MemberNotFound { member_id })
    }
}

/// builds scoring factors from stored member records
pub struct FactorAssembler;

impl FactorAssembler {
    pub fn assemble(records: &MemberRecords, now: DateTime<Utc>) -> CreditScoreFactors {
        let days = (now - records.joined_at).num_days().max(0);

        let loan_history = records
            .loans
            .iter()
            .filter_map(|loan| {
                loan.status
                    .history_status()
                    .map(|status| LoanRecord::new(status, loan.late_payment_count))
            })
            .collect();

        CreditScoreFactors {
            membership_duration_months: Decimal::from(days) / DAYS_PER_MEMBERSHIP_MONTH,
            share_capital: records.share_capital,
            savings_records: records.savings.clone(),
            loan_history,
            transaction_count: records.transaction_count,
        }
    }
}

/// look up, assemble and score a member, neutral score if any step fails
pub fn score_member<D: MemberDirectory + ?Sized>(
    directory: &D,
    member_id: MemberId,
    scorer: &CreditScorer,
    time_provider: &SafeTimeProvider,
) -> CreditScore {
    let scored = directory
        .member_records(member_id)
        .map(|records| FactorAssembler::assemble(&records, time_provider.now()))
        .and_then(|factors| scorer.compute_score(&factors));

    match scored {
        Ok(score) => score,
        Err(err) => {
            warn!(member_id = %member_id, error = %err, "scoring member failed, using neutral score");
            scorer.neutral_score()
        }
    }
}
