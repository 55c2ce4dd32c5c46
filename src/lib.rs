pub mod application;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod schedule;
pub mod scoring;
pub mod serialization;
pub mod types;

// re-export key types
pub use application::LoanApplication;
pub use config::{LendingConfig, ScheduleConfig, ScoringConfig};
pub use decimal::{Money, Rate};
pub use errors::{LendingError, Result};
pub use events::{Event, EventStore};
pub use schedule::{
    calculate_level_payment, generate_schedule, AmortizationInput, AmortizationSchedule,
    Installment, InstallmentAllocation, RepaymentResult,
};
pub use scoring::{
    compute_score, score_member, CreditScore, CreditScoreFactors, CreditScorer, FactorAssembler,
    InMemoryDirectory, LoanRecord, LoanSummary, MemberDirectory, MemberRecords, SavingsRecord,
    ScoreBreakdown,
};
pub use serialization::{LoanView, ScheduleView};
pub use types::{
    DueDatePolicy, InstallmentStatus, LoanHistoryStatus, LoanId, LoanStatus, MemberId,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
