use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// unique identifier for a loan
pub type LoanId = Uuid;

/// unique identifier for a cooperative member
pub type MemberId = Uuid;

/// loan status across origination and repayment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    /// application submitted, awaiting review
    Pending,
    /// approved, schedule generated, not yet disbursed
    Approved,
    /// declined at review
    Rejected,
    /// funds released, no repayment yet
    Disbursed,
    /// at least one repayment received
    Repaying,
    /// every installment settled
    FullyPaid,
    /// written off as unrecoverable
    Defaulted,
}

impl LoanStatus {
    /// the status as it counts toward credit history, if it counts at all
    pub fn history_status(&self) -> Option<LoanHistoryStatus> {
        match self {
            LoanStatus::FullyPaid => Some(LoanHistoryStatus::FullyPaid),
            LoanStatus::Repaying => Some(LoanHistoryStatus::Repaying),
            LoanStatus::Defaulted => Some(LoanHistoryStatus::Defaulted),
            LoanStatus::Pending
            | LoanStatus::Approved
            | LoanStatus::Rejected
            | LoanStatus::Disbursed => None,
        }
    }

    /// no further transitions possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LoanStatus::Rejected | LoanStatus::FullyPaid | LoanStatus::Defaulted
        )
    }
}

/// loan states that feed the repayment-history factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanHistoryStatus {
    FullyPaid,
    Repaying,
    Defaulted,
}

/// installment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    Pending,
    Paid,
    Overdue,
}

/// how installment due dates step forward from the generation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DueDatePolicy {
    /// same day of month, clamped to the last day of shorter months
    #[default]
    CalendarMonth,
    /// fixed 30-day blocks
    ThirtyDayBlocks,
}
