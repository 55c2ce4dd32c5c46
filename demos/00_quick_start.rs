/// quick start - score a member, approve a loan and print its state
use sacco_lending::{
    AmortizationInput, CreditScoreFactors, CreditScorer, LoanApplication, LoanView, Money,
    SavingsRecord, ScheduleConfig, SafeTimeProvider, TimeSource, Uuid,
};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::System);
    let config = ScheduleConfig::default();

    // score the member from their cooperative history
    let factors = CreditScoreFactors {
        membership_duration_months: dec!(18),
        share_capital: Money::from_major(5_000),
        savings_records: vec![SavingsRecord { amount: Money::from_major(1_500) }; 6],
        loan_history: Vec::new(),
        transaction_count: 20,
    };
    let score = CreditScorer::default().compute_score(&factors)?;

    // apply for a 50,000 loan at 12% over a year
    let terms = AmortizationInput::new(Money::from_major(50_000), dec!(12), 12);
    let mut loan = LoanApplication::submit(Uuid::new_v4(), terms, "poultry unit", score, &config, &time)?;

    loan.approve(&config, &time)?;
    loan.disburse(&time)?;

    println!("{}", LoanView::from_application(&loan).to_json_pretty()?);

    Ok(())
}
