use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::scoring::CreditScore;
use crate::types::{LoanId, LoanStatus, MemberId};

/// all events that can be emitted while a loan moves through its lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // origination events
    ApplicationSubmitted {
        loan_id: LoanId,
        member_id: MemberId,
        principal: Money,
        term_months: u32,
        credit_score: CreditScore,
        timestamp: DateTime<Utc>,
    },
    ApplicationApproved {
        loan_id: LoanId,
        timestamp: DateTime<Utc>,
    },
    ApplicationRejected {
        loan_id: LoanId,
        reason: String,
        timestamp: DateTime<Utc>,
    },
    ScheduleGenerated {
        loan_id: LoanId,
        installments: u32,
        level_payment: Money,
        annual_rate: Rate,
        total_interest: Money,
        timestamp: DateTime<Utc>,
    },
    LoanDisbursed {
        loan_id: LoanId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },

    // repayment events
    RepaymentReceived {
        loan_id: LoanId,
        amount: Money,
        applied: Money,
        excess: Money,
        timestamp: DateTime<Utc>,
    },
    InstallmentPaid {
        loan_id: LoanId,
        installment_number: u32,
        due_date: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },
    InstallmentOverdue {
        loan_id: LoanId,
        installment_number: u32,
        due_date: DateTime<Utc>,
        amount_outstanding: Money,
    },
    LoanFullyPaid {
        loan_id: LoanId,
        total_repaid: Money,
        timestamp: DateTime<Utc>,
    },
    LoanDefaulted {
        loan_id: LoanId,
        outstanding: Money,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    // status change events
    StatusChanged {
        loan_id: LoanId,
        old_status: LoanStatus,
        new_status: LoanStatus,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
