/// serializable views handed to the persistence and api layers
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::evidence::{ApprovalInfo, DisbursementInfo, Investor};
use crate::loan::Loan;
use crate::state::LoanState;
use crate::types::{LoanId, PaymentRecord};

/// everything a caller persists after a loan operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanView {
    pub loan_id: LoanId,
    pub borrower_id: String,
    pub state: LoanState,
    pub created_at: DateTime<Utc>,
    pub agreement_link: String,
    pub terms: TermsView,
    pub billing: BillingView,
    pub approval: Option<ApprovalInfo>,
    pub investors: Vec<Investor>,
    pub invested_amount: Money,
    pub disbursement: Option<DisbursementInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermsView {
    pub principal: Money,
    pub flat_rate: Rate,
    pub term_weeks: u32,
    pub roi: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingView {
    pub payable_amount: Money,
    pub outstanding: Money,
    pub remaining_installments: u32,
    pub payments_made: u32,
    pub missed_streak: u32,
    pub is_delinquent: bool,
    pub last_payment: Option<PaymentRecord>,
}

impl LoanView {
    pub fn from_loan(loan: &Loan) -> Self {
        let ledger = loan.ledger();
        let terms = loan.config.terms;

        LoanView {
            loan_id: loan.id,
            borrower_id: loan.borrower_id.clone(),
            state: loan.state(),
            created_at: loan.created_at,
            agreement_link: loan.agreement_link.clone(),
            terms: TermsView {
                principal: terms.principal,
                flat_rate: terms.flat_rate,
                term_weeks: terms.term_weeks,
                roi: loan.roi(),
            },
            billing: BillingView {
                payable_amount: ledger.payable_amount(),
                outstanding: ledger.current_outstanding(),
                remaining_installments: ledger.remaining_installments(),
                payments_made: ledger.payments_made(),
                missed_streak: ledger.missed_streak(),
                is_delinquent: ledger.is_delinquent(),
                last_payment: ledger.last_payment().copied(),
            },
            approval: loan.approval().cloned(),
            investors: loan
                .investment()
                .map(|i| i.investors.clone())
                .unwrap_or_default(),
            invested_amount: loan.invested_amount(),
            disbursement: loan.disbursement().cloned(),
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Loan {
    pub fn view(&self) -> LoanView {
        LoanView::from_loan(self)
    }

    /// get json representation of current state
    pub fn to_json_pretty(&self) -> String {
        self.view()
            .to_json_pretty()
            .unwrap_or_else(|e| format!("JSON error: {}", e))
    }
}
