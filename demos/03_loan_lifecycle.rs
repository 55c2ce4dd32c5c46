/// loan lifecycle - application through repayment with controlled time
use sacco_lending::chrono::{Duration, TimeZone, Utc};
use sacco_lending::{
    score_member, AmortizationInput, CreditScorer, InMemoryDirectory, LoanApplication,
    MemberRecords, Money, SafeTimeProvider, SavingsRecord, ScheduleConfig, TimeSource, Uuid,
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
    println!("=== loan lifecycle example ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();
    let config = ScheduleConfig::default();
    let scorer = CreditScorer::default();

    let mut directory = InMemoryDirectory::new();
    let mut records = MemberRecords::new(Uuid::new_v4(), time.now() - Duration::days(730));
    records.share_capital = Money::from_major(8_000);
    records.savings = vec![SavingsRecord { amount: Money::from_major(1_000) }; 5];
    records.transaction_count = 15;
    let member_id = records.member_id;
    directory.insert(records);

    let score = score_member(&directory, member_id, &scorer, &time);
    println!("member score at application: {}", score);

    let terms = AmortizationInput::new(Money::from_major(30_000), dec!(14), 6);
    let mut loan = LoanApplication::submit(member_id, terms, "school fees", score, &config, &time)?;
    let level_payment = loan.approve(&config, &time)?.level_payment;
    loan.disburse(&time)?;
    println!("disbursed on {}, level payment {}", time.now().format("%Y-%m-%d"), level_payment);

    // pay on time for three months, then fall behind
    for _ in 0..3 {
        controller.advance(Duration::days(28));
        loan.record_repayment(level_payment, &time)?;
    }

    controller.advance(Duration::days(45));
    let overdue = loan.update_overdue(&time)?;
    println!("{}: overdue installments {:?}", time.now().format("%Y-%m-%d"), overdue);

    // catch up in one payment
    let outstanding = loan.outstanding();
    let result = loan.record_repayment(outstanding, &time)?;
    println!(
        "settled {} installments, loan status {:?}",
        result.settled_installments().len(),
        loan.status
    );

    directory.record_loan(member_id, loan.summary())?;
    println!(
        "member score after repayment: {}",
        score_member(&directory, member_id, &scorer, &time)
    );

    println!("\nevents:");
    for event in loan.events.take_events() {
        println!("  {:?}", event);
    }

    Ok(())
}
