use thiserror::Error;

use crate::decimal::Money;
use crate::state::{LoanState, Transition};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoanError {
    #[error("payment exceeds outstanding amount: outstanding {outstanding}, requested {requested}")]
    ExceedsOutstanding {
        outstanding: Money,
        requested: Money,
    },

    #[error("invalid payment amount {amount}: payment should be {payable} or 0")]
    InvalidPaymentAmount {
        amount: Money,
        payable: Money,
    },

    #[error("invalid state transition: cannot {transition} a loan that is {from}")]
    InvalidStateTransition {
        from: LoanState,
        transition: Transition,
    },

    #[error("invalid loan terms: {message}")]
    InvalidLoanTerms {
        message: String,
    },

    #[error("payment schedule already completed")]
    ScheduleCompleted,

    #[error("loan not disbursed: current state is {state}")]
    LoanNotDisbursed {
        state: LoanState,
    },

    #[error("invalid evidence: {message}")]
    InvalidEvidence {
        message: String,
    },

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },

    #[error("total invested amount {invested} exceeds the loan principal {principal}")]
    InvestmentExceedsPrincipal {
        principal: Money,
        invested: Money,
    },

    #[error("unknown loan state: {value}")]
    UnknownState {
        value: String,
    },

    #[error("invalid payment history: {message}")]
    InvalidHistory {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, LoanError>;
