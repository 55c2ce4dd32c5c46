use chrono::{DateTime, Duration, Months, Utc};
use hourglass_rs::SafeTimeProvider;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ScheduleConfig;
use crate::decimal::{Money, Rate};
use crate::errors::{LendingError, Result};
use crate::types::{DueDatePolicy, InstallmentStatus};

/// loan terms a schedule is generated from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationInput {
    pub principal: Money,
    /// 14 means 14% a year
    pub annual_interest_rate_percent: Decimal,
    pub term_months: u32,
}

impl AmortizationInput {
    pub fn new(principal: Money, annual_interest_rate_percent: Decimal, term_months: u32) -> Self {
        Self {
            principal,
            annual_interest_rate_percent,
            term_months,
        }
    }

    pub fn annual_rate(&self) -> Rate {
        Rate::from_percent_decimal(self.annual_interest_rate_percent)
    }

    /// reject inputs the annuity formula cannot handle
    pub fn validate(&self, config: &ScheduleConfig) -> Result<()> {
        if !self.principal.is_positive() {
            return Err(LendingError::InvalidPrincipal {
                amount: self.principal,
            });
        }

        if self.term_months == 0 || self.term_months > config.max_term_months {
            return Err(LendingError::InvalidTerm {
                months: self.term_months,
                max: config.max_term_months,
            });
        }

        if self.annual_interest_rate_percent < Decimal::ZERO
            || self.annual_interest_rate_percent > config.max_annual_rate_percent
        {
            return Err(LendingError::InvalidInterestRate {
                percent: self.annual_interest_rate_percent,
                max: config.max_annual_rate_percent,
            });
        }

        Ok(())
    }
}

/// one installment of a repayment schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub installment_number: u32,
    pub due_date: DateTime<Utc>,
    pub total_amount: Money,
    pub principal_portion: Money,
    pub interest_portion: Money,
    /// principal still owed once this installment is settled
    pub remaining_balance: Money,
    pub status: InstallmentStatus,
    pub amount_paid: Money,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Installment {
    /// amount still owed on this installment
    pub fn outstanding(&self) -> Money {
        (self.total_amount - self.amount_paid).max(Money::ZERO)
    }

    pub fn is_paid(&self) -> bool {
        self.status == InstallmentStatus::Paid
    }

    /// overdue now, or settled after its due date
    pub fn is_late(&self) -> bool {
        match self.status {
            InstallmentStatus::Overdue => true,
            InstallmentStatus::Paid => self.paid_at.map_or(false, |paid| paid > self.due_date),
            InstallmentStatus::Pending => false,
        }
    }
}

/// equal-installment repayment schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub principal: Money,
    pub annual_rate: Rate,
    pub term_months: u32,
    pub generated_at: DateTime<Utc>,
    pub due_date_policy: DueDatePolicy,
    pub level_payment: Money,
    pub installments: Vec<Installment>,
    pub total_interest: Money,
    pub total_amount: Money,
}

impl AmortizationSchedule {
    /// generate the schedule, due dates counted from the provider's current time
    pub fn generate(
        input: &AmortizationInput,
        config: &ScheduleConfig,
        time_provider: &SafeTimeProvider,
    ) -> Result<Self> {
        input.validate(config)?;

        let generated_at = time_provider.now();
        let dp = config.currency_decimal_places;
        let annual_rate = input.annual_rate();
        let monthly_rate = annual_rate.monthly_rate().as_decimal();
        let term = input.term_months;

        let level_payment = calculate_level_payment(input.principal, annual_rate, term)?.round_dp(dp);

        let mut installments = Vec::with_capacity(term as usize);
        let mut balance = input.principal;

        for number in 1..=term {
            let interest_portion = Money::from_decimal(balance.as_decimal() * monthly_rate).round_dp(dp);

            let principal_portion = if number == term {
                // last installment absorbs the accumulated rounding residue
                balance
            } else {
                (level_payment - interest_portion).min(balance).max(Money::ZERO)
            };
            balance -= principal_portion;

            installments.push(Installment {
                installment_number: number,
                due_date: due_date(generated_at, number, config.due_date_policy)?,
                total_amount: principal_portion + interest_portion,
                principal_portion,
                interest_portion,
                remaining_balance: balance,
                status: InstallmentStatus::Pending,
                amount_paid: Money::ZERO,
                paid_at: None,
            });
        }

        let total_interest: Money = installments.iter().map(|i| i.interest_portion).sum();
        let total_amount: Money = installments.iter().map(|i| i.total_amount).sum();

        debug!(
            principal = %input.principal,
            annual_rate = %annual_rate,
            term_months = term,
            level_payment = %level_payment,
            total_interest = %total_interest,
            "generated amortization schedule"
        );

        Ok(Self {
            principal: input.principal,
            annual_rate,
            term_months: term,
            generated_at,
            due_date_policy: config.due_date_policy,
            level_payment,
            installments,
            total_interest,
            total_amount,
        })
    }

    /// get installment by its 1-based number
    pub fn installment(&self, number: u32) -> Option<&Installment> {
        number
            .checked_sub(1)
            .and_then(|index| self.installments.get(index as usize))
    }

    /// first installment not yet settled
    pub fn next_due(&self) -> Option<&Installment> {
        self.installments.iter().find(|i| !i.is_paid())
    }

    /// total still owed across all installments
    pub fn outstanding(&self) -> Money {
        self.installments.iter().map(|i| i.outstanding()).sum()
    }

    pub fn total_paid(&self) -> Money {
        self.installments.iter().map(|i| i.amount_paid).sum()
    }

    pub fn is_settled(&self) -> bool {
        self.installments.iter().all(|i| i.is_paid())
    }

    /// installments overdue now or paid after their due date
    pub fn late_payment_count(&self) -> u32 {
        self.installments.iter().filter(|i| i.is_late()).count() as u32
    }
}

/// generate a schedule with default settings
pub fn generate_schedule(
    principal: Money,
    annual_interest_rate_percent: Decimal,
    term_months: u32,
    time_provider: &SafeTimeProvider,
) -> Result<AmortizationSchedule> {
    let input = AmortizationInput::new(principal, annual_interest_rate_percent, term_months);
    AmortizationSchedule::generate(&input, &ScheduleConfig::default(), time_provider)
}

/// level monthly payment, unrounded
///
/// `M = P * r / (1 - (1 + r)^-n)` for a monthly rate `r > 0`; a zero rate
/// splits the principal evenly.
pub fn calculate_level_payment(principal: Money, annual_rate: Rate, months: u32) -> Result<Money> {
    if months == 0 {
        return Err(LendingError::InvalidTerm { months, max: 0 });
    }

    let r = annual_rate.monthly_rate().as_decimal();

    if r.is_zero() {
        return Ok(principal / Decimal::from(months));
    }

    let base = Decimal::ONE + r;
    let mut compound = Decimal::ONE;
    for _ in 0..months {
        compound = compound.checked_mul(base).ok_or_else(|| overflow("compound factor"))?;
    }

    let discount = Decimal::ONE.checked_div(compound).ok_or_else(|| overflow("discount factor"))?;
    let denominator = Decimal::ONE - discount;
    if denominator.is_zero() {
        return Ok(principal / Decimal::from(months));
    }

    let numerator = principal
        .as_decimal()
        .checked_mul(r)
        .ok_or_else(|| overflow("periodic interest"))?;
    let payment = numerator.checked_div(denominator).ok_or_else(|| overflow("level payment"))?;

    Ok(Money::from_decimal(payment))
}

fn due_date(generated_at: DateTime<Utc>, number: u32, policy: DueDatePolicy) -> Result<DateTime<Utc>> {
    let due = match policy {
        DueDatePolicy::CalendarMonth => generated_at.checked_add_months(Months::new(number)),
        DueDatePolicy::ThirtyDayBlocks => {
            generated_at.checked_add_signed(Duration::days(30 * i64::from(number)))
        }
    };

    due.ok_or_else(|| LendingError::CalculationError {
        message: format!("due date of installment {} out of range", number),
    })
}

fn overflow(what: &str) -> LendingError {
    LendingError::CalculationError {
        message: format!("{} overflowed", what),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use hourglass_rs::TimeSource;
    use rust_decimal_macros::dec;

    fn test_time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap(),
        ))
    }

    fn money(d: Decimal) -> Money {
        Money::from_decimal(d)
    }

    #[test]
    fn test_known_twelve_month_schedule() {
        let time = test_time();
        let schedule = generate_schedule(Money::from_major(120_000), dec!(12), 12, &time).unwrap();

        assert_eq!(schedule.installments.len(), 12);
        assert_eq!(schedule.annual_rate.monthly_rate().as_decimal(), dec!(0.01));
        assert_eq!(schedule.level_payment, money(dec!(10661.85)));

        let first = &schedule.installments[0];
        assert_eq!(first.interest_portion, money(dec!(1200.00)));
        assert_eq!(first.principal_portion, money(dec!(9461.85)));
        assert_eq!(first.remaining_balance, money(dec!(110538.15)));

        let principal_paid: Money = schedule.installments.iter().map(|i| i.principal_portion).sum();
        assert_eq!(principal_paid, Money::from_major(120_000));
        assert_eq!(schedule.installments[11].remaining_balance, Money::ZERO);
    }

    #[test]
    fn test_installments_are_numbered_and_pending() {
        let time = test_time();
        let schedule = generate_schedule(Money::from_major(50_000), dec!(14), 24, &time).unwrap();

        for (index, installment) in schedule.installments.iter().enumerate() {
            assert_eq!(installment.installment_number, index as u32 + 1);
            assert_eq!(installment.status, InstallmentStatus::Pending);
            assert_eq!(installment.amount_paid, Money::ZERO);
            assert!(installment.paid_at.is_none());
        }
    }

    #[test]
    fn test_conservation_and_decomposition_across_terms() {
        let time = test_time();
        let cases = [
            (dec!(1000), dec!(0), 1),
            (dec!(999.99), dec!(7.5), 7),
            (dec!(25000), dec!(14), 36),
            (dec!(1234567.89), dec!(18.25), 120),
            (dec!(300), dec!(100), 360),
            (dec!(0.05), dec!(12), 9),
        ];

        for (principal, rate, term) in cases {
            let principal = money(principal);
            let schedule = generate_schedule(principal, rate, term, &time).unwrap();

            assert_eq!(schedule.installments.len(), term as usize);

            let principal_paid: Money = schedule.installments.iter().map(|i| i.principal_portion).sum();
            assert!((principal_paid - principal).abs() <= money(dec!(0.01)));

            for installment in &schedule.installments {
                assert_eq!(
                    installment.total_amount,
                    installment.principal_portion + installment.interest_portion
                );
                assert!(!installment.principal_portion.is_negative());
                assert!(!installment.remaining_balance.is_negative());
            }

            let last = schedule.installments.last().unwrap();
            assert_eq!(last.remaining_balance, Money::ZERO);
            assert_eq!(schedule.total_amount, principal + schedule.total_interest);
        }
    }

    #[test]
    fn test_total_interest_matches_level_payment() {
        let time = test_time();
        let principal = Money::from_major(80_000);
        let schedule = generate_schedule(principal, dec!(10), 48, &time).unwrap();

        let expected = schedule.level_payment * Decimal::from(48) - principal;
        assert!((schedule.total_interest - expected).abs() < Money::ONE);
    }

    #[test]
    fn test_zero_rate_splits_principal_evenly() {
        let time = test_time();
        let schedule = generate_schedule(Money::from_major(1_000), dec!(0), 3, &time).unwrap();

        assert_eq!(schedule.level_payment, money(dec!(333.33)));
        assert_eq!(schedule.total_interest, Money::ZERO);
        assert_eq!(schedule.installments[0].total_amount, money(dec!(333.33)));
        assert_eq!(schedule.installments[1].total_amount, money(dec!(333.33)));
        assert_eq!(schedule.installments[2].total_amount, money(dec!(333.34)));
    }

    #[test]
    fn test_single_month_term() {
        let time = test_time();
        let schedule = generate_schedule(Money::from_major(10_000), dec!(12), 1, &time).unwrap();

        assert_eq!(schedule.installments.len(), 1);
        let only = &schedule.installments[0];
        assert_eq!(only.principal_portion, Money::from_major(10_000));
        assert_eq!(only.interest_portion, Money::from_major(100));
        assert_eq!(only.total_amount, Money::from_major(10_100));
    }

    #[test]
    fn test_calendar_month_due_dates_clamp_to_month_end() {
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap(),
        ));
        let schedule = generate_schedule(Money::from_major(3_000), dec!(12), 3, &time).unwrap();

        assert_eq!(schedule.installments[0].due_date, Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap());
        assert_eq!(schedule.installments[1].due_date, Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap());
        assert_eq!(schedule.installments[2].due_date, Utc.with_ymd_and_hms(2024, 4, 30, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_thirty_day_due_dates() {
        let time = test_time();
        let config = ScheduleConfig {
            due_date_policy: DueDatePolicy::ThirtyDayBlocks,
            ..ScheduleConfig::default()
        };
        let input = AmortizationInput::new(Money::from_major(3_000), dec!(12), 3);
        let schedule = AmortizationSchedule::generate(&input, &config, &time).unwrap();

        let start = time.now();
        for installment in &schedule.installments {
            let expected = start + Duration::days(30 * i64::from(installment.installment_number));
            assert_eq!(installment.due_date, expected);
        }
        assert_eq!(schedule.due_date_policy, DueDatePolicy::ThirtyDayBlocks);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let time = test_time();

        let err = generate_schedule(Money::ZERO, dec!(12), 12, &time).unwrap_err();
        assert!(matches!(err, LendingError::InvalidPrincipal { .. }));

        let err = generate_schedule(Money::from_major(-5), dec!(12), 12, &time).unwrap_err();
        assert!(matches!(err, LendingError::InvalidPrincipal { .. }));

        let err = generate_schedule(Money::from_major(1_000), dec!(12), 0, &time).unwrap_err();
        assert!(matches!(err, LendingError::InvalidTerm { .. }));

        let err = generate_schedule(Money::from_major(1_000), dec!(12), 361, &time).unwrap_err();
        assert!(matches!(err, LendingError::InvalidTerm { .. }));

        let err = generate_schedule(Money::from_major(1_000), dec!(-1), 12, &time).unwrap_err();
        assert!(matches!(err, LendingError::InvalidInterestRate { .. }));
    }

    #[test]
    fn test_rounding_to_configured_precision() {
        let time = test_time();
        let config = ScheduleConfig {
            currency_decimal_places: 0,
            ..ScheduleConfig::default()
        };
        let input = AmortizationInput::new(Money::from_major(120_000), dec!(12), 12);
        let schedule = AmortizationSchedule::generate(&input, &config, &time).unwrap();

        assert_eq!(schedule.level_payment, Money::from_major(10_662));
        assert_eq!(schedule.installments[0].interest_portion, Money::from_major(1_200));
        let principal_paid: Money = schedule.installments.iter().map(|i| i.principal_portion).sum();
        assert_eq!(principal_paid, Money::from_major(120_000));
    }

    #[test]
    fn test_lookup_helpers() {
        let time = test_time();
        let schedule = generate_schedule(Money::from_major(6_000), dec!(12), 6, &time).unwrap();

        assert!(schedule.installment(0).is_none());
        assert_eq!(schedule.installment(1).map(|i| i.installment_number), Some(1));
        assert!(schedule.installment(7).is_none());
        assert_eq!(schedule.next_due().map(|i| i.installment_number), Some(1));
        assert_eq!(schedule.outstanding(), schedule.total_amount);
        assert!(!schedule.is_settled());
        assert_eq!(schedule.late_payment_count(), 0);
    }
}
