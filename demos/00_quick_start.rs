/// quick start - billing a weekly flat-rate loan
use loan_ledger_rs::{LoanTerms, Money, PaymentLedger, Rate, ScheduleOrder};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 5,000,000 at a flat 1000% over 50 weeks
    let terms = LoanTerms::new(Money::from_major(5_000_000), Rate::from_decimal(dec!(10)), 50);
    let mut ledger = PaymentLedger::new(terms)?;

    println!("schedule:\n{}", ledger.schedule().render(ScheduleOrder::Ascending));

    let payments = [1_000_000, 1_000_000, 1_000_000, 1_000_000, 0, 200];
    for amount in payments {
        if let Err(e) = ledger.apply_payment(Money::from_major(amount)) {
            println!("could not make payment of {}: {}", amount, e);
        }
    }

    println!("remaining schedule:\n{}", ledger.remaining_schedule());
    println!("outstanding: {}", ledger.current_outstanding());

    ledger.apply_payment(Money::ZERO)?;
    println!("delinquent after second missed payment: {}", ledger.is_delinquent());

    ledger.apply_payment(ledger.payable_amount())?;
    println!("delinquent after paying: {}", ledger.is_delinquent());

    Ok(())
}
