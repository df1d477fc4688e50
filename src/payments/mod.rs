pub mod amortization;
pub mod ledger;

use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::PaymentRecord;

pub use amortization::{payable_amount, AmortizationSchedule};
pub use ledger::PaymentLedger;

/// result of applying a payment through the loan aggregate
///
/// Carries everything the persistence layer writes back in one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentOutcome {
    pub record: PaymentRecord,
    pub outstanding: Money,
    pub remaining_installments: u32,
    pub missed_streak: u32,
    pub is_delinquent: bool,
    pub fully_repaid: bool,
}

impl PaymentOutcome {
    pub fn from_ledger(record: PaymentRecord, ledger: &PaymentLedger) -> Self {
        Self {
            record,
            outstanding: ledger.current_outstanding(),
            remaining_installments: ledger.remaining_installments(),
            missed_streak: ledger.missed_streak(),
            is_delinquent: ledger.is_delinquent(),
            fully_repaid: ledger.is_fully_repaid(),
        }
    }
}
