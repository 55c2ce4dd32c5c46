/// serialization support for loan applications and schedules
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::LoanApplication;
use crate::decimal::{Money, Rate};
use crate::schedule::{AmortizationSchedule, Installment};
use crate::scoring::CreditScore;
use crate::types::{DueDatePolicy, InstallmentStatus, LoanId, LoanStatus, MemberId};

/// serializable view of a loan application's state
#[derive(Debug, Serialize, Deserialize)]
pub struct LoanView {
    pub id: LoanId,
    pub member_id: MemberId,
    pub purpose: String,
    pub status: LoanStatus,
    pub credit_score: CreditScore,
    pub dates: DatesView,
    pub terms: TermsView,
    pub repayment: RepaymentView,
    pub rejection_reason: Option<String>,
    pub schedule: Option<ScheduleView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatesView {
    pub submitted_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub disbursed_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TermsView {
    pub principal: Money,
    pub annual_rate: Rate,
    pub term_months: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RepaymentView {
    pub total_paid: Money,
    pub outstanding: Money,
    pub installments_paid: u32,
    pub late_payment_count: u32,
    pub next_due_date: Option<DateTime<Utc>>,
    pub next_due_amount: Option<Money>,
}

/// serializable view of a repayment schedule
#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleView {
    pub generated_at: DateTime<Utc>,
    pub due_date_policy: DueDatePolicy,
    pub level_payment: Money,
    pub total_interest: Money,
    pub total_amount: Money,
    pub installments: Vec<InstallmentView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InstallmentView {
    pub number: u32,
    pub due_date: DateTime<Utc>,
    pub total_amount: Money,
    pub principal: Money,
    pub interest: Money,
    pub remaining_balance: Money,
    pub status: InstallmentStatus,
    pub amount_paid: Money,
    pub paid_at: Option<DateTime<Utc>>,
}

impl LoanView {
    pub fn from_application(application: &LoanApplication) -> Self {
        let schedule = application.schedule();
        let next_due = schedule.and_then(|s| s.next_due());

        LoanView {
            id: application.id,
            member_id: application.member_id,
            purpose: application.purpose.clone(),
            status: application.status,
            credit_score: application.credit_score,
            dates: DatesView {
                submitted_at: application.submitted_at,
                approved_at: application.approved_at,
                disbursed_at: application.disbursed_at,
                closed_at: application.closed_at,
            },
            terms: TermsView {
                principal: application.terms.principal,
                annual_rate: application.terms.annual_rate(),
                term_months: application.terms.term_months,
            },
            repayment: RepaymentView {
                total_paid: schedule.map_or(Money::ZERO, |s| s.total_paid()),
                outstanding: application.outstanding(),
                installments_paid: schedule
                    .map_or(0, |s| s.installments.iter().filter(|i| i.is_paid()).count() as u32),
                late_payment_count: application.late_payment_count(),
                next_due_date: next_due.map(|i| i.due_date),
                next_due_amount: next_due.map(|i| i.outstanding()),
            },
            rejection_reason: application.rejection_reason.clone(),
            schedule: schedule.map(ScheduleView::from_schedule),
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl ScheduleView {
    pub fn from_schedule(schedule: &AmortizationSchedule) -> Self {
        ScheduleView {
            generated_at: schedule.generated_at,
            due_date_policy: schedule.due_date_policy,
            level_payment: schedule.level_payment,
            total_interest: schedule.total_interest,
            total_amount: schedule.total_amount,
            installments: schedule.installments.iter().map(InstallmentView::from).collect(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl From<&Installment> for InstallmentView {
    fn from(installment: &Installment) -> Self {
        InstallmentView {
            number: installment.installment_number,
            due_date: installment.due_date,
            total_amount: installment.total_amount,
            principal: installment.principal_portion,
            interest: installment.interest_portion,
            remaining_balance: installment.remaining_balance,
            status: installment.status,
            amount_paid: installment.amount_paid,
            paid_at: installment.paid_at,
        }
    }
}
