use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};

/// consecutive missed payments that make a borrower delinquent
pub const DEFAULT_DELINQUENCY_THRESHOLD: u32 = 2;

/// loan configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanConfig {
    pub terms: LoanTerms,
    pub billing: BillingPolicy,
    pub origination: OriginationLimits,
    pub documents: DocumentConfig,
}

/// financial terms, fixed once the loan is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    /// total interest factor over the life of the loan
    pub flat_rate: Rate,
    pub term_weeks: u32,
}

impl LoanTerms {
    pub fn new(principal: Money, flat_rate: Rate, term_weeks: u32) -> Self {
        Self {
            principal,
            flat_rate,
            term_weeks,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.principal.is_positive() {
            return Err(LoanError::InvalidLoanTerms {
                message: format!("principal must be positive, got {}", self.principal),
            });
        }

        if self.flat_rate.is_negative() {
            return Err(LoanError::InvalidLoanTerms {
                message: format!("flat rate must not be negative, got {}", self.flat_rate.as_decimal()),
            });
        }

        if self.term_weeks == 0 {
            return Err(LoanError::InvalidLoanTerms {
                message: "term must be at least one week".to_string(),
            });
        }

        self.total_outstanding()?;

        Ok(())
    }

    /// amount owed over the whole loan: principal * flat rate
    pub fn total_outstanding(&self) -> Result<Money> {
        self.principal
            .checked_mul_rate(self.flat_rate)
            .ok_or_else(|| LoanError::InvalidLoanTerms {
                message: format!(
                    "principal {} times flat rate {} is out of range",
                    self.principal,
                    self.flat_rate.as_decimal()
                ),
            })
    }
}

/// billing behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingPolicy {
    pub delinquency_threshold: u32,
}

impl Default for BillingPolicy {
    fn default() -> Self {
        Self {
            delinquency_threshold: DEFAULT_DELINQUENCY_THRESHOLD,
        }
    }
}

impl BillingPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.delinquency_threshold == 0 {
            return Err(LoanError::InvalidLoanTerms {
                message: "delinquency threshold must be at least one missed payment".to_string(),
            });
        }
        Ok(())
    }
}

/// checks applied when a loan is proposed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OriginationLimits {
    /// exclusive ceiling on the flat rate
    pub max_flat_rate: Option<Rate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentConfig {
    pub agreement_base_url: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            agreement_base_url: "http://s3.amazonaws.com/loans".to_string(),
        }
    }
}

impl DocumentConfig {
    pub fn agreement_link(&self, loan_id: &uuid::Uuid) -> String {
        format!("{}/{}-agreement.pdf", self.agreement_base_url.trim_end_matches('/'), loan_id)
    }
}

impl LoanConfig {
    /// weekly flat-rate loan with no origination ceiling
    pub fn weekly(principal: Money, flat_rate: Rate, term_weeks: u32) -> Self {
        Self {
            terms: LoanTerms::new(principal, flat_rate, term_weeks),
            billing: BillingPolicy::default(),
            origination: OriginationLimits::default(),
            documents: DocumentConfig::default(),
        }
    }

    /// loan service defaults: rate must stay below 1.0
    pub fn loan_service(principal: Money, flat_rate: Rate, term_weeks: u32) -> Self {
        Self {
            origination: OriginationLimits {
                max_flat_rate: Some(Rate::ONE),
            },
            ..Self::weekly(principal, flat_rate, term_weeks)
        }
    }

    pub fn with_billing(mut self, billing: BillingPolicy) -> Self {
        self.billing = billing;
        self
    }

    pub fn with_documents(mut self, documents: DocumentConfig) -> Self {
        self.documents = documents;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.terms.validate()?;

        if let Some(max) = self.origination.max_flat_rate {
            if self.terms.flat_rate >= max {
                return Err(LoanError::InvalidLoanTerms {
                    message: format!(
                        "the rate must be below {}, got {}",
                        max.as_decimal(),
                        self.terms.flat_rate.as_decimal()
                    ),
                });
            }
        }

        self.billing.validate()?;

        if self.documents.agreement_base_url.trim().is_empty() {
            return Err(LoanError::InvalidLoanTerms {
                message: "agreement base url is empty".to_string(),
            });
        }

        Ok(())
    }
}
