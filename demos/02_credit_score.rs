/// credit score - factor breakdown and directory-backed scoring
use sacco_lending::chrono::Duration;
use sacco_lending::{
    score_member, CreditScoreFactors, CreditScorer, InMemoryDirectory, LendingConfig,
    LoanHistoryStatus, LoanRecord, LoanStatus, LoanSummary, MemberRecords, Money,
    SafeTimeProvider, SavingsRecord, TimeSource, Uuid,
};
use rust_decimal_macros::dec;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sacco_lending=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    println!("=== credit score example ===\n");

    // scoring weights can be tuned per cooperative
    let config = LendingConfig::from_json_str(r#"{ "scoring": { "transaction_cap": "30" } }"#)?;
    let scorer = CreditScorer::new(config.scoring)?;

    let factors = CreditScoreFactors {
        membership_duration_months: dec!(24),
        share_capital: Money::from_major(15_000),
        savings_records: vec![SavingsRecord { amount: Money::from_major(3_000) }; 8],
        loan_history: vec![
            LoanRecord::new(LoanHistoryStatus::FullyPaid, 0),
            LoanRecord::new(LoanHistoryStatus::Repaying, 1),
        ],
        transaction_count: 40,
    };

    let breakdown = scorer.breakdown(&factors)?;
    println!("base:               {}", breakdown.base);
    println!("membership:         {}", breakdown.membership);
    println!("share capital:      {}", breakdown.share_capital);
    println!("savings regularity: {}", breakdown.savings_regularity);
    println!("savings amount:     {}", breakdown.savings_amount);
    println!("loan repayment:     {}", breakdown.loan_repayment);
    println!("transactions:       {}", breakdown.transactions);
    println!("score:              {}\n", breakdown.score);

    // scoring from stored member records
    let time = SafeTimeProvider::new(TimeSource::System);
    let mut directory = InMemoryDirectory::new();

    let mut records = MemberRecords::new(Uuid::new_v4(), time.now() - Duration::days(400));
    records.share_capital = Money::from_major(2_000);
    records.savings = vec![SavingsRecord { amount: Money::from_major(800) }; 3];
    records.transaction_count = 9;
    let member_id = records.member_id;
    directory.insert(records);

    println!("member score: {}", score_member(&directory, member_id, &scorer, &time));

    directory.record_loan(
        member_id,
        LoanSummary {
            loan_id: Uuid::new_v4(),
            status: LoanStatus::Defaulted,
            late_payment_count: 4,
        },
    )?;
    println!("after default: {}", score_member(&directory, member_id, &scorer, &time));

    // unknown members fall back to the neutral score
    println!("unknown member: {}", score_member(&directory, Uuid::new_v4(), &scorer, &time));

    Ok(())
}
