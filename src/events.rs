use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::state::LoanState;
use crate::types::LoanId;

/// all events that can be emitted by a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // lifecycle events
    LoanProposed {
        loan_id: LoanId,
        borrower_id: String,
        principal: Money,
        flat_rate: Rate,
        term_weeks: u32,
        timestamp: DateTime<Utc>,
    },
    LoanApproved {
        loan_id: LoanId,
        field_validator_id: String,
        approval_date: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },
    LoanInvested {
        loan_id: LoanId,
        invested_amount: Money,
        investor_count: usize,
        timestamp: DateTime<Utc>,
    },
    /// an investor is due an email with the agreement letter link
    AgreementLetterIssued {
        loan_id: LoanId,
        investor_id: String,
        agreement_link: String,
        timestamp: DateTime<Utc>,
    },
    LoanDisbursed {
        loan_id: LoanId,
        field_officer_id: String,
        disbursement_date: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },
    StateChanged {
        loan_id: LoanId,
        old_state: LoanState,
        new_state: LoanState,
        timestamp: DateTime<Utc>,
    },

    // payment events
    PaymentReceived {
        loan_id: LoanId,
        cycle: u32,
        week: u32,
        amount: Money,
        outstanding: Money,
        timestamp: DateTime<Utc>,
    },
    PaymentMissed {
        loan_id: LoanId,
        cycle: u32,
        week: u32,
        missed_streak: u32,
        timestamp: DateTime<Utc>,
    },
    DelinquencyStarted {
        loan_id: LoanId,
        missed_streak: u32,
        timestamp: DateTime<Utc>,
    },
    DelinquencyCured {
        loan_id: LoanId,
        timestamp: DateTime<Utc>,
    },
    LoanRepaid {
        loan_id: LoanId,
        total_paid: Money,
        timestamp: DateTime<Utc>,
    },
}

impl Event {
    pub fn loan_id(&self) -> LoanId {
        match self {
            Event::LoanProposed { loan_id, .. }
            | Event::LoanApproved { loan_id, .. }
            | Event::LoanInvested { loan_id, .. }
            | Event::AgreementLetterIssued { loan_id, .. }
            | Event::LoanDisbursed { loan_id, .. }
            | Event::StateChanged { loan_id, .. }
            | Event::PaymentReceived { loan_id, .. }
            | Event::PaymentMissed { loan_id, .. }
            | Event::DelinquencyStarted { loan_id, .. }
            | Event::DelinquencyCured { loan_id, .. }
            | Event::LoanRepaid { loan_id, .. } => *loan_id,
        }
    }
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
