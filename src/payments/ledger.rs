use serde::Serialize;
use tracing::debug;

use crate::config::{BillingPolicy, LoanTerms};
use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::payments::amortization::{payable_amount, AmortizationSchedule};
use crate::types::{PaymentKind, PaymentRecord};

/// billing ledger for a single loan
///
/// Owns the outstanding balance, the count of installments still owed, the
/// consecutive missed-payment streak and the append-only payment history.
/// The only mutation is [`PaymentLedger::apply_payment`], which either
/// applies completely or leaves the ledger untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentLedger {
    terms: LoanTerms,
    policy: BillingPolicy,
    payable_amount: Money,
    total_due: Money,
    outstanding: Money,
    remaining_installments: u32,
    missed_streak: u32,
    history: Vec<PaymentRecord>,
}

impl PaymentLedger {
    pub fn new(terms: LoanTerms) -> Result<Self> {
        Self::with_policy(terms, BillingPolicy::default())
    }

    pub fn with_policy(terms: LoanTerms, policy: BillingPolicy) -> Result<Self> {
        terms.validate()?;
        policy.validate()?;
        let total_due = terms.total_outstanding()?;
        let payable = payable_amount(&terms)?;

        Ok(Self {
            terms,
            policy,
            payable_amount: payable,
            total_due,
            outstanding: total_due,
            remaining_installments: terms.term_weeks,
            missed_streak: 0,
            history: Vec::new(),
        })
    }

    /// rebuild a ledger from a persisted history
    ///
    /// Every record is re-applied in order and must reproduce itself exactly.
    pub fn replay(terms: LoanTerms, policy: BillingPolicy, history: &[PaymentRecord]) -> Result<Self> {
        let mut ledger = Self::with_policy(terms, policy)?;

        for expected in history {
            let applied = ledger.apply_payment(expected.amount).map_err(|e| LoanError::InvalidHistory {
                message: format!("cycle {}: {}", expected.cycle, e),
            })?;

            if applied != *expected {
                return Err(LoanError::InvalidHistory {
                    message: format!(
                        "cycle {} recorded as week {} ({:?}), replay produced cycle {} week {} ({:?})",
                        expected.cycle,
                        expected.week,
                        expected.kind,
                        applied.cycle,
                        applied.week,
                        applied.kind
                    ),
                });
            }
        }

        Ok(ledger)
    }

    /// apply one billing-cycle payment
    ///
    /// The amount must be exactly the payable amount or exactly zero.
    pub fn apply_payment(&mut self, amount: Money) -> Result<PaymentRecord> {
        if amount > self.outstanding {
            debug!(%amount, outstanding = %self.outstanding, "payment exceeds outstanding");
            return Err(LoanError::ExceedsOutstanding {
                outstanding: self.outstanding,
                requested: amount,
            });
        }

        // payable is checked before zero: a zero-rate loan has a zero installment
        if amount == self.payable_amount {
            return self.apply_full(amount);
        }

        if amount.is_zero() {
            return self.apply_missed();
        }

        debug!(%amount, payable = %self.payable_amount, "payment amount rejected");
        Err(LoanError::InvalidPaymentAmount {
            amount,
            payable: self.payable_amount,
        })
    }

    fn apply_full(&mut self, amount: Money) -> Result<PaymentRecord> {
        if self.remaining_installments == 0 {
            return Err(LoanError::ScheduleCompleted);
        }

        let record = self.next_record(amount, PaymentKind::Full);

        self.outstanding -= amount;
        self.remaining_installments -= 1;
        self.missed_streak = 0;

        // clear the rounding residual left by flooring the installment
        if self.remaining_installments == 0 {
            self.outstanding = Money::ZERO;
        }

        self.history.push(record);
        Ok(record)
    }

    fn apply_missed(&mut self) -> Result<PaymentRecord> {
        if self.remaining_installments == 0 {
            return Err(LoanError::ScheduleCompleted);
        }

        let record = self.next_record(Money::ZERO, PaymentKind::Missed);

        self.missed_streak += 1;
        self.history.push(record);
        Ok(record)
    }

    fn next_record(&self, amount: Money, kind: PaymentKind) -> PaymentRecord {
        PaymentRecord {
            cycle: self.history.len() as u32 + 1,
            week: self.terms.term_weeks - self.remaining_installments + 1,
            amount,
            kind,
        }
    }

    /// two (by default) consecutive missed payments
    pub fn is_delinquent(&self) -> bool {
        self.missed_streak >= self.policy.delinquency_threshold
    }

    /// principal * flat rate, the amount owed before any payment
    pub fn total_due(&self) -> Money {
        self.total_due
    }

    pub fn current_outstanding(&self) -> Money {
        self.outstanding
    }

    pub fn payable_amount(&self) -> Money {
        self.payable_amount
    }

    pub fn remaining_installments(&self) -> u32 {
        self.remaining_installments
    }

    /// full installments paid so far
    pub fn payments_made(&self) -> u32 {
        self.terms.term_weeks - self.remaining_installments
    }

    pub fn missed_streak(&self) -> u32 {
        self.missed_streak
    }

    pub fn is_fully_repaid(&self) -> bool {
        self.remaining_installments == 0
    }

    pub fn terms(&self) -> &LoanTerms {
        &self.terms
    }

    pub fn policy(&self) -> &BillingPolicy {
        &self.policy
    }

    pub fn history(&self) -> &[PaymentRecord] {
        &self.history
    }

    pub fn last_payment(&self) -> Option<&PaymentRecord> {
        self.history.last()
    }

    pub fn total_paid(&self) -> Money {
        self.history.iter().map(|r| r.amount).sum()
    }

    /// full schedule from week 1
    pub fn schedule(&self) -> AmortizationSchedule {
        AmortizationSchedule::build(self.payable_amount, self.terms.term_weeks, self.terms.term_weeks)
    }

    /// installments still owed
    pub fn remaining_schedule(&self) -> AmortizationSchedule {
        AmortizationSchedule::build(
            self.payable_amount,
            self.terms.term_weeks,
            self.remaining_installments,
        )
    }
}
