use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::LoanTerms;
use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::types::{Installment, ScheduleOrder};

/// per-week installment for a flat-rate loan
///
/// `outstanding = principal * rate`, `payable = outstanding / weeks`,
/// rounded toward zero so the installments never sum past the outstanding.
pub fn payable_amount(terms: &LoanTerms) -> Result<Money> {
    if terms.term_weeks == 0 {
        return Err(LoanError::InvalidLoanTerms {
            message: "term must be at least one week".to_string(),
        });
    }

    terms
        .total_outstanding()?
        .split_floor(terms.term_weeks)
        .ok_or_else(|| LoanError::InvalidLoanTerms {
            message: "outstanding amount cannot be split into weekly installments".to_string(),
        })
}

/// projection of installments still owed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub payable_amount: Money,
    pub term_weeks: u32,
    /// ascending by week
    pub installments: Vec<Installment>,
}

impl AmortizationSchedule {
    /// full schedule from week 1 to the end of the term
    pub fn generate(terms: &LoanTerms) -> Result<Self> {
        Self::remaining(terms, terms.term_weeks)
    }

    /// schedule limited to the last `remaining_weeks` weeks of the term
    pub fn remaining(terms: &LoanTerms, remaining_weeks: u32) -> Result<Self> {
        let payable = payable_amount(terms)?;

        if remaining_weeks > terms.term_weeks {
            return Err(LoanError::InvalidLoanTerms {
                message: format!(
                    "remaining weeks {} exceed term of {} weeks",
                    remaining_weeks, terms.term_weeks
                ),
            });
        }

        Ok(Self::build(payable, terms.term_weeks, remaining_weeks))
    }

    /// caller guarantees `remaining_weeks <= term_weeks`
    pub(crate) fn build(payable: Money, term_weeks: u32, remaining_weeks: u32) -> Self {
        let first_week = term_weeks - remaining_weeks + 1;
        let installments = (first_week..=term_weeks)
            .map(|week| Installment {
                week,
                amount: payable,
            })
            .collect();

        Self {
            payable_amount: payable,
            term_weeks,
            installments,
        }
    }

    pub fn len(&self) -> usize {
        self.installments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.installments.is_empty()
    }

    /// installment for a specific week, if still scheduled
    pub fn installment(&self, week: u32) -> Option<&Installment> {
        self.installments.iter().find(|i| i.week == week)
    }

    /// sum of all scheduled installments
    pub fn total(&self) -> Money {
        self.installments.iter().map(|i| i.amount).sum()
    }

    /// installments in the requested order
    pub fn ordered(&self, order: ScheduleOrder) -> Vec<Installment> {
        let mut installments = self.installments.clone();
        if order == ScheduleOrder::Descending {
            installments.reverse();
        }
        installments
    }

    /// one line per installment, e.g. `Week: 1, Payable amount: 10`
    pub fn render(&self, order: ScheduleOrder) -> String {
        self.ordered(order)
            .iter()
            .map(|i| format!("Week: {}, Payable amount: {}\n", i.week, i.amount))
            .collect()
    }
}

impl fmt::Display for AmortizationSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(ScheduleOrder::Ascending))
    }
}
