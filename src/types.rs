use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;

/// unique identifier for a loan
pub type LoanId = Uuid;

/// one future installment: 1-based week counted from origination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    pub week: u32,
    pub amount: Money,
}

/// how a recorded payment was classified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentKind {
    /// exactly the payable amount
    Full,
    /// zero amount, counts toward the missed streak
    Missed,
}

/// a payment actually applied to the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// billing cycle: position in the history, contiguous from 1
    pub cycle: u32,
    /// installment week the payment was presented against:
    /// `term_weeks - remaining_before + 1`; a missed week stays due,
    /// so the next payment carries the same week
    pub week: u32,
    pub amount: Money,
    pub kind: PaymentKind,
}

impl PaymentRecord {
    pub fn is_missed(&self) -> bool {
        self.kind == PaymentKind::Missed
    }
}

/// order in which a schedule is enumerated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ScheduleOrder {
    /// earliest week first
    #[default]
    Ascending,
    /// latest week first
    Descending,
}
