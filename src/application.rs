use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use tracing::info;
use uuid::Uuid;

use crate::config::ScheduleConfig;
use crate::decimal::Money;
use crate::errors::{LendingError, Result};
use crate::events::{Event, EventStore};
use crate::schedule::{AmortizationInput, AmortizationSchedule, RepaymentResult};
use crate::scoring::{CreditScore, LoanSummary};
use crate::types::{LoanId, LoanStatus, MemberId};

/// a member's loan from application through final repayment
pub struct LoanApplication {
    pub id: LoanId,
    pub member_id: MemberId,
    pub terms: AmortizationInput,
    pub purpose: String,
    /// score computed when the application was submitted
    pub credit_score: CreditScore,
    pub status: LoanStatus,
    pub submitted_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub disbursed_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub last_status_change: DateTime<Utc>,
    pub rejection_reason: Option<String>,
    pub schedule: Option<AmortizationSchedule>,
    pub events: EventStore,
}

impl LoanApplication {
    /// submit a new application
    pub fn submit(
        member_id: MemberId,
        terms: AmortizationInput,
        purpose: impl Into<String>,
        credit_score: CreditScore,
        config: &ScheduleConfig,
        time_provider: &SafeTimeProvider,
    ) -> Result<Self> {
        terms.validate(config)?;

        let id = Uuid::new_v4();
        let now = time_provider.now();

        let mut application = Self {
            id,
            member_id,
            terms,
            purpose: purpose.into(),
            credit_score,
            status: LoanStatus::Pending,
            submitted_at: now,
            approved_at: None,
            disbursed_at: None,
            closed_at: None,
            last_status_change: now,
            rejection_reason: None,
            schedule: None,
            events: EventStore::new(),
        };

        application.events.emit(Event::ApplicationSubmitted {
            loan_id: id,
            member_id,
            principal: application.terms.principal,
            term_months: application.terms.term_months,
            credit_score,
            timestamp: now,
        });

        info!(
            loan_id = %id,
            member_id = %member_id,
            principal = %application.terms.principal,
            credit_score = credit_score.value(),
            "loan application submitted"
        );

        Ok(application)
    }

    /// approve and generate the repayment schedule
    pub fn approve(
        &mut self,
        config: &ScheduleConfig,
        time_provider: &SafeTimeProvider,
    ) -> Result<&AmortizationSchedule> {
        self.ensure_status(&[LoanStatus::Pending], LoanStatus::Approved)?;

        let schedule = AmortizationSchedule::generate(&self.terms, config, time_provider)?;
        let now = time_provider.now();

        self.events.emit(Event::ApplicationApproved {
            loan_id: self.id,
            timestamp: now,
        });
        self.events.emit(Event::ScheduleGenerated {
            loan_id: self.id,
            installments: schedule.term_months,
            level_payment: schedule.level_payment,
            annual_rate: schedule.annual_rate,
            total_interest: schedule.total_interest,
            timestamp: now,
        });

        self.approved_at = Some(now);
        self.transition(LoanStatus::Approved, now);

        Ok(self.schedule.insert(schedule))
    }

    pub fn reject(&mut self, reason: impl Into<String>, time_provider: &SafeTimeProvider) -> Result<()> {
        self.ensure_status(&[LoanStatus::Pending], LoanStatus::Rejected)?;

        let now = time_provider.now();
        let reason = reason.into();

        self.events.emit(Event::ApplicationRejected {
            loan_id: self.id,
            reason: reason.clone(),
            timestamp: now,
        });

        self.rejection_reason = Some(reason);
        self.closed_at = Some(now);
        self.transition(LoanStatus::Rejected, now);
        Ok(())
    }

    /// release the principal to the member
    pub fn disburse(&mut self, time_provider: &SafeTimeProvider) -> Result<Money> {
        self.ensure_status(&[LoanStatus::Approved], LoanStatus::Disbursed)?;

        let now = time_provider.now();
        let amount = self.terms.principal;

        self.events.emit(Event::LoanDisbursed {
            loan_id: self.id,
            amount,
            timestamp: now,
        });

        self.disbursed_at = Some(now);
        self.transition(LoanStatus::Disbursed, now);
        Ok(amount)
    }

    /// apply a member repayment to the schedule
    pub fn record_repayment(
        &mut self,
        amount: Money,
        time_provider: &SafeTimeProvider,
    ) -> Result<RepaymentResult> {
        self.ensure_status(&[LoanStatus::Disbursed, LoanStatus::Repaying], LoanStatus::Repaying)?;
        self.update_overdue(time_provider)?;

        let now = time_provider.now();
        let schedule = self.schedule.as_mut().ok_or(LendingError::ScheduleNotGenerated)?;
        let result = schedule.apply_repayment(amount, now)?;
        let settled = schedule.is_settled();
        let total_repaid = schedule.total_paid();

        self.events.emit(Event::RepaymentReceived {
            loan_id: self.id,
            amount,
            applied: result.applied,
            excess: result.excess,
            timestamp: now,
        });

        for allocation in result.allocations.iter().filter(|a| a.settled) {
            let due_date = self
                .schedule
                .as_ref()
                .and_then(|s| s.installment(allocation.installment_number))
                .map(|i| i.due_date)
                .ok_or(LendingError::InstallmentNotFound {
                    number: allocation.installment_number,
                })?;

            self.events.emit(Event::InstallmentPaid {
                loan_id: self.id,
                installment_number: allocation.installment_number,
                due_date,
                timestamp: now,
            });
        }

        if self.status == LoanStatus::Disbursed {
            self.transition(LoanStatus::Repaying, now);
        }

        if settled {
            self.events.emit(Event::LoanFullyPaid {
                loan_id: self.id,
                total_repaid,
                timestamp: now,
            });
            self.closed_at = Some(now);
            self.transition(LoanStatus::FullyPaid, now);
        }

        Ok(result)
    }

    /// mark lapsed installments overdue, returns their numbers
    pub fn update_overdue(&mut self, time_provider: &SafeTimeProvider) -> Result<Vec<u32>> {
        if !matches!(self.status, LoanStatus::Disbursed | LoanStatus::Repaying) {
            return Ok(Vec::new());
        }

        let schedule = self.schedule.as_mut().ok_or(LendingError::ScheduleNotGenerated)?;
        let changed = schedule.refresh_overdue(time_provider.now());

        for number in &changed {
            if let Some(installment) = schedule.installment(*number) {
                self.events.emit(Event::InstallmentOverdue {
                    loan_id: self.id,
                    installment_number: *number,
                    due_date: installment.due_date,
                    amount_outstanding: installment.outstanding(),
                });
            }
        }

        Ok(changed)
    }

    pub fn mark_defaulted(
        &mut self,
        reason: impl Into<String>,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        self.ensure_status(&[LoanStatus::Disbursed, LoanStatus::Repaying], LoanStatus::Defaulted)?;
        self.update_overdue(time_provider)?;

        let now = time_provider.now();
        self.events.emit(Event::LoanDefaulted {
            loan_id: self.id,
            outstanding: self.outstanding(),
            reason: reason.into(),
            timestamp: now,
        });

        self.closed_at = Some(now);
        self.transition(LoanStatus::Defaulted, now);
        Ok(())
    }

    pub fn schedule(&self) -> Option<&AmortizationSchedule> {
        self.schedule.as_ref()
    }

    /// amount still owed, zero before approval
    pub fn outstanding(&self) -> Money {
        self.schedule.as_ref().map_or(Money::ZERO, |s| s.outstanding())
    }

    pub fn late_payment_count(&self) -> u32 {
        self.schedule.as_ref().map_or(0, |s| s.late_payment_count())
    }

    /// this loan as it counts toward the member's credit history
    pub fn summary(&self) -> LoanSummary {
        LoanSummary {
            loan_id: self.id,
            status: self.status,
            late_payment_count: self.late_payment_count(),
        }
    }

    fn ensure_status(&self, allowed: &[LoanStatus], attempted: LoanStatus) -> Result<()> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(LendingError::InvalidStatusTransition {
                current: self.status,
                attempted,
            })
        }
    }

    fn transition(&mut self, new_status: LoanStatus, timestamp: DateTime<Utc>) {
        let old_status = self.status;
        self.status = new_status;
        self.last_status_change = timestamp;

        self.events.emit(Event::StatusChanged {
            loan_id: self.id,
            old_status,
            new_status,
            timestamp,
        });

        info!(loan_id = %self.id, from = ?old_status, to = ?new_status, "loan status changed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use hourglass_rs::TimeSource;
    use rust_decimal_macros::dec;

    use crate::types::InstallmentStatus;

    fn test_time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap(),
        ))
    }

    fn submit(time: &SafeTimeProvider) -> LoanApplication {
        LoanApplication::submit(
            Uuid::new_v4(),
            AmortizationInput::new(Money::from_major(1_200), dec!(0), 3),
            "school fees",
            CreditScore::new(640).unwrap(),
            &ScheduleConfig::default(),
            time,
        )
        .unwrap()
    }

    fn count_status_changes(application: &LoanApplication) -> usize {
        application
            .events
            .events()
            .iter()
            .filter(|e| matches!(e, Event::StatusChanged { .. }))
            .count()
    }

    #[test]
    fn test_submission_attaches_score() {
        let time = test_time();
        let application = submit(&time);

        assert_eq!(application.status, LoanStatus::Pending);
        assert_eq!(application.credit_score.value(), 640);
        assert!(application.schedule().is_none());
        assert!(matches!(
            application.events.events()[0],
            Event::ApplicationSubmitted { .. }
        ));
    }

    #[test]
    fn test_invalid_terms_rejected_at_submission() {
        let time = test_time();
        let result = LoanApplication::submit(
            Uuid::new_v4(),
            AmortizationInput::new(Money::ZERO, dec!(12), 12),
            "stock",
            CreditScore::neutral(),
            &ScheduleConfig::default(),
            &time,
        );

        assert!(matches!(result, Err(LendingError::InvalidPrincipal { .. })));
    }

    #[test]
    fn test_approval_generates_schedule_at_approval_time() {
        let time = test_time();
        let mut application = submit(&time);
        let control = time.test_control().unwrap();
        control.advance(Duration::days(5));

        let schedule = application.approve(&ScheduleConfig::default(), &time).unwrap();
        assert_eq!(schedule.installments.len(), 3);
        assert_eq!(schedule.generated_at, time.now());

        assert_eq!(application.status, LoanStatus::Approved);
        assert_eq!(application.approved_at, Some(time.now()));
        assert_eq!(application.outstanding(), Money::from_major(1_200));
    }

    #[test]
    fn test_rejection_closes_application() {
        let time = test_time();
        let mut application = submit(&time);

        application.reject("insufficient share capital", &time).unwrap();

        assert_eq!(application.status, LoanStatus::Rejected);
        assert_eq!(application.rejection_reason.as_deref(), Some("insufficient share capital"));
        assert!(application.status.is_terminal());

        let err = application.approve(&ScheduleConfig::default(), &time).unwrap_err();
        assert!(matches!(
            err,
            LendingError::InvalidStatusTransition {
                current: LoanStatus::Rejected,
                attempted: LoanStatus::Approved,
            }
        ));
    }

    #[test]
    fn test_cannot_disburse_or_repay_before_approval() {
        let time = test_time();
        let mut application = submit(&time);

        assert!(application.disburse(&time).is_err());
        assert!(application.record_repayment(Money::from_major(100), &time).is_err());
        assert!(application.mark_defaulted("no contact", &time).is_err());
    }

    #[test]
    fn test_full_repayment_lifecycle() {
        let time = test_time();
        let mut application = submit(&time);
        application.approve(&ScheduleConfig::default(), &time).unwrap();
        assert_eq!(application.disburse(&time).unwrap(), Money::from_major(1_200));

        application.record_repayment(Money::from_major(400), &time).unwrap();
        assert_eq!(application.status, LoanStatus::Repaying);
        assert_eq!(application.outstanding(), Money::from_major(800));

        let result = application.record_repayment(Money::from_major(900), &time).unwrap();
        assert_eq!(result.excess, Money::from_major(100));
        assert_eq!(application.status, LoanStatus::FullyPaid);
        assert!(application.closed_at.is_some());
        assert_eq!(application.outstanding(), Money::ZERO);

        let paid_events = application
            .events
            .events()
            .iter()
            .filter(|e| matches!(e, Event::InstallmentPaid { .. }))
            .count();
        assert_eq!(paid_events, 3);
        assert!(application
            .events
            .events()
            .iter()
            .any(|e| matches!(e, Event::LoanFullyPaid { .. })));

        // approved, disbursed, repaying, fully paid
        assert_eq!(count_status_changes(&application), 4);

        let err = application.record_repayment(Money::from_major(10), &time).unwrap_err();
        assert!(matches!(err, LendingError::InvalidStatusTransition { .. }));
    }

    #[test]
    fn test_late_repayment_is_counted_in_summary() {
        let time = test_time();
        let control = time.test_control().unwrap();
        let mut application = submit(&time);
        application.approve(&ScheduleConfig::default(), &time).unwrap();
        application.disburse(&time).unwrap();

        control.advance(Duration::days(40));
        let overdue = application.update_overdue(&time).unwrap();
        assert_eq!(overdue, vec![1]);
        assert!(application
            .events
            .events()
            .iter()
            .any(|e| matches!(e, Event::InstallmentOverdue { installment_number: 1, .. })));

        application.record_repayment(Money::from_major(400), &time).unwrap();

        let schedule = application.schedule().unwrap();
        assert_eq!(schedule.installment(1).unwrap().status, InstallmentStatus::Paid);

        let summary = application.summary();
        assert_eq!(summary.status, LoanStatus::Repaying);
        assert_eq!(summary.late_payment_count, 1);
    }

    #[test]
    fn test_default_records_outstanding_balance() {
        let time = test_time();
        let control = time.test_control().unwrap();
        let mut application = submit(&time);
        application.approve(&ScheduleConfig::default(), &time).unwrap();
        application.disburse(&time).unwrap();
        application.record_repayment(Money::from_major(400), &time).unwrap();

        control.advance(Duration::days(120));
        application.mark_defaulted("unresponsive after recovery attempts", &time).unwrap();

        assert_eq!(application.status, LoanStatus::Defaulted);
        assert_eq!(application.late_payment_count(), 2);
        assert!(application.events.events().iter().any(|e| matches!(
            e,
            Event::LoanDefaulted { outstanding, .. } if *outstanding == Money::from_major(800)
        )));
    }
}
