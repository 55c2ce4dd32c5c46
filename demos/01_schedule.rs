/// schedule - generate an amortization table under both due-date policies
use sacco_lending::chrono::{TimeZone, Utc};
use sacco_lending::{
    AmortizationInput, AmortizationSchedule, DueDatePolicy, Money, SafeTimeProvider,
    ScheduleConfig, TimeSource,
};
use rust_decimal_macros::dec;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sacco_lending=debug"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();
}

fn print_schedule(schedule: &AmortizationSchedule) {
    println!(
        "{:>3}  {:<10}  {:>12}  {:>12}  {:>12}  {:>12}",
        "#", "due", "payment", "principal", "interest", "balance"
    );
    for installment in &schedule.installments {
        println!(
            "{:>3}  {:<10}  {:>12}  {:>12}  {:>12}  {:>12}",
            installment.installment_number,
            installment.due_date.format("%Y-%m-%d"),
            installment.total_amount,
            installment.principal_portion,
            installment.interest_portion,
            installment.remaining_balance,
        );
    }
    println!(
        "level payment: {}  total interest: {}  total repayable: {}\n",
        schedule.level_payment, schedule.total_interest, schedule.total_amount
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    println!("=== amortization schedule example ===\n");

    // month-end start shows how calendar due dates clamp
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 31, 9, 0, 0).unwrap(),
    ));
    let input = AmortizationInput::new(Money::from_major(120_000), dec!(12), 12);

    println!("calendar month due dates:");
    let schedule = AmortizationSchedule::generate(&input, &ScheduleConfig::default(), &time)?;
    print_schedule(&schedule);

    println!("thirty day due dates:");
    let config = ScheduleConfig {
        due_date_policy: DueDatePolicy::ThirtyDayBlocks,
        ..ScheduleConfig::default()
    };
    let schedule = AmortizationSchedule::generate(&input, &config, &time)?;
    print_schedule(&schedule);

    println!("interest-free loan:");
    let input = AmortizationInput::new(Money::from_major(1_000), dec!(0), 3);
    let schedule = AmortizationSchedule::generate(&input, &ScheduleConfig::default(), &time)?;
    print_schedule(&schedule);

    Ok(())
}
