use rust_decimal::Decimal;
use thiserror::Error;

use crate::decimal::Money;
use crate::types::{LoanStatus, MemberId};

#[derive(Error, Debug)]
pub enum LendingError {
    #[error("invalid principal: {amount} (must be greater than zero)")]
    InvalidPrincipal {
        amount: Money,
    },

    #[error("invalid term: {months} months (allowed 1..={max})")]
    InvalidTerm {
        months: u32,
        max: u32,
    },

    #[error("invalid interest rate: {percent}% (allowed 0..={max}%)")]
    InvalidInterestRate {
        percent: Decimal,
        max: Decimal,
    },

    #[error("invalid credit factor {field}: {message}")]
    InvalidFactor {
        field: &'static str,
        message: String,
    },

    #[error("invalid repayment amount: {amount}")]
    InvalidRepaymentAmount {
        amount: Money,
    },

    #[error("invalid credit score: {value} (allowed {min}..={max})")]
    InvalidCreditScore {
        value: u32,
        min: u32,
        max: u32,
    },

    #[error("installment not found: {number}")]
    InstallmentNotFound {
        number: u32,
    },

    #[error("repayment schedule already settled")]
    ScheduleAlreadySettled,

    #[error("no repayment schedule generated for this loan")]
    ScheduleNotGenerated,

    #[error("invalid status transition: {current:?} -> {attempted:?}")]
    InvalidStatusTransition {
        current: LoanStatus,
        attempted: LoanStatus,
    },

    #[error("member not found: {member_id}")]
    MemberNotFound {
        member_id: MemberId,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("configuration io error: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("calculation error: {message}")]
    CalculationError {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, LendingError>;
