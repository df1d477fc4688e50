/// lifecycle - proposed to disbursed, then weekly billing
use chrono::{Duration, TimeZone, Utc};
use loan_ledger_rs::{
    ApprovalInfo, DisbursementInfo, InvestmentInfo, Investor, Loan, LoanConfig, Money, Rate,
    SafeTimeProvider, TimeSource,
};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== loan lifecycle ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();

    let config = LoanConfig::loan_service(Money::from_major(5_000), Rate::from_decimal(dec!(0.1)), 50);
    let mut loan = Loan::propose(config, "BOR-001".to_string(), &time)?;
    println!("1. proposed: {} ({})", loan.id, loan.state());

    // disbursing straight away is refused
    if let Err(e) = loan.disburse(
        DisbursementInfo {
            signed_agreement_url: "https://docs.example.com/signed/001.pdf".to_string(),
            field_officer_id: "OFF-7".to_string(),
            disbursement_date: time.now(),
        },
        &time,
    ) {
        println!("   cannot disburse yet: {}", e);
    }

    controller.advance(Duration::days(2));
    loan.approve(
        ApprovalInfo {
            picture_proof_url: "https://proofs.example.com/visit/001.jpg".to_string(),
            field_validator_id: "EMP-42".to_string(),
            approval_date: time.now(),
        },
        &time,
    )?;
    println!("2. approved: {}", loan.state());

    controller.advance(Duration::days(3));
    loan.invest(
        InvestmentInfo {
            investors: vec![
                Investor { investor_id: "INV-1".to_string(), amount: Money::from_major(3_000) },
                Investor { investor_id: "INV-2".to_string(), amount: Money::from_major(2_000) },
            ],
        },
        &time,
    )?;
    println!("3. invested: {} ({} invested)", loan.state(), loan.invested_amount());

    controller.advance(Duration::days(1));
    loan.disburse(
        DisbursementInfo {
            signed_agreement_url: "https://docs.example.com/signed/001.pdf".to_string(),
            field_officer_id: "OFF-7".to_string(),
            disbursement_date: time.now(),
        },
        &time,
    )?;
    println!("4. disbursed: {}", loan.state());

    println!("\n5. weekly billing");
    let payable = loan.ledger().payable_amount();
    for amount in [payable, Money::ZERO, Money::ZERO, payable] {
        controller.advance(Duration::weeks(1));
        let outcome = loan.make_payment(amount, &time)?;
        println!(
            "   week {} paid {}: outstanding {}, delinquent {}",
            outcome.record.week, amount, outcome.outstanding, outcome.is_delinquent
        );
    }

    println!("\n6. events");
    for event in loan.take_events() {
        println!("   {:?}", event);
    }

    println!("\n{}", loan.to_json_pretty());

    Ok(())
}
