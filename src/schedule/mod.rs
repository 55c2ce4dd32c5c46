//! Equal-installment repayment schedules and repayment tracking against them.

pub mod amortization;
pub mod repayment;

pub use amortization::{
    calculate_level_payment, generate_schedule, AmortizationInput, AmortizationSchedule, Installment,
};
pub use repayment::{InstallmentAllocation, RepaymentResult};
