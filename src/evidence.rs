//! supporting evidence carried by approval, investment and disbursement
//! requests

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LoanError, Result};

/// field validation of the borrower
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalInfo {
    pub picture_proof_url: String,
    pub field_validator_id: String,
    pub approval_date: DateTime<Utc>,
}

impl ApprovalInfo {
    pub fn validate(&self) -> Result<()> {
        if self.field_validator_id.trim().is_empty() {
            return Err(LoanError::InvalidEvidence {
                message: "loan must be validated with a valid employee id of a field validator".to_string(),
            });
        }

        validate_date(&self.approval_date)?;

        if !is_request_uri(&self.picture_proof_url) {
            return Err(LoanError::InvalidEvidence {
                message: format!("invalid picture proof url '{}'", self.picture_proof_url),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Investor {
    pub investor_id: String,
    pub amount: Money,
}

/// the single investment round of a loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestmentInfo {
    pub investors: Vec<Investor>,
}

impl InvestmentInfo {
    pub fn validate(&self) -> Result<()> {
        if self.investors.is_empty() {
            return Err(LoanError::InvalidEvidence {
                message: "investment has no investors".to_string(),
            });
        }

        for (idx, investor) in self.investors.iter().enumerate() {
            if investor.investor_id.trim().is_empty() {
                return Err(LoanError::InvalidEvidence {
                    message: format!("investor id is empty at idx: {}", idx),
                });
            }
            if !investor.amount.is_positive() {
                return Err(LoanError::InvalidEvidence {
                    message: format!("investor amount must be positive at idx: {}", idx),
                });
            }
        }

        let summed = self
            .investors
            .iter()
            .try_fold(Decimal::ZERO, |acc, i| acc.checked_add(i.amount.as_decimal()));
        if summed.is_none() {
            return Err(LoanError::InvalidEvidence {
                message: "investment total is out of range".to_string(),
            });
        }

        Ok(())
    }

    pub fn total(&self) -> Money {
        self.investors.iter().map(|i| i.amount).sum()
    }
}

/// hand-over of funds to the borrower
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisbursementInfo {
    pub signed_agreement_url: String,
    pub field_officer_id: String,
    pub disbursement_date: DateTime<Utc>,
}

impl DisbursementInfo {
    pub fn validate(&self) -> Result<()> {
        validate_date(&self.disbursement_date)?;

        if !is_request_uri(&self.signed_agreement_url) {
            return Err(LoanError::InvalidEvidence {
                message: format!("invalid signed agreement letter url '{}'", self.signed_agreement_url),
            });
        }

        if self.field_officer_id.trim().is_empty() {
            return Err(LoanError::InvalidEvidence {
                message: "field officer id is empty".to_string(),
            });
        }

        Ok(())
    }
}

/// dates must fall within years 1..=9999
pub fn validate_date(date: &DateTime<Utc>) -> Result<()> {
    let year = date.year();
    if !(1..=9999).contains(&year) {
        return Err(LoanError::InvalidDate {
            message: format!("year {} out of range", year),
        });
    }
    Ok(())
}

/// `event` must not precede the loan's creation
pub fn ensure_not_before(event: &DateTime<Utc>, created_at: &DateTime<Utc>, what: &str) -> Result<()> {
    if event < created_at {
        return Err(LoanError::InvalidDate {
            message: format!("{} date must be later than the loan creation date", what),
        });
    }
    Ok(())
}

/// absolute uri (`scheme:rest`) or absolute path, without whitespace
fn is_request_uri(s: &str) -> bool {
    if s.is_empty() || s.chars().any(char::is_whitespace) {
        return false;
    }

    if s.starts_with('/') {
        return true;
    }

    match s.split_once(':') {
        Some((scheme, rest)) => {
            let mut chars = scheme.chars();
            let starts_alpha = chars.next().map_or(false, |c| c.is_ascii_alphabetic());
            starts_alpha
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
                && !rest.is_empty()
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_approval_validation() {
        let ok = ApprovalInfo {
            picture_proof_url: "https://proofs.example.com/visit/123.jpg".to_string(),
            field_validator_id: "EMP-42".to_string(),
            approval_date: date(),
        };
        assert!(ok.validate().is_ok());

        let no_validator = ApprovalInfo {
            field_validator_id: " ".to_string(),
            ..ok.clone()
        };
        assert!(matches!(no_validator.validate(), Err(LoanError::InvalidEvidence { .. })));

        let bad_url = ApprovalInfo {
            picture_proof_url: "not a url".to_string(),
            ..ok
        };
        assert!(bad_url.validate().is_err());
    }

    #[test]
    fn test_investment_validation() {
        let ok = InvestmentInfo {
            investors: vec![
                Investor { investor_id: "INV-1".to_string(), amount: Money::from_major(3_000) },
                Investor { investor_id: "INV-2".to_string(), amount: Money::from_major(2_000) },
            ],
        };
        assert!(ok.validate().is_ok());
        assert_eq!(ok.total(), Money::from_major(5_000));

        let zero_amount = InvestmentInfo {
            investors: vec![Investor { investor_id: "INV-1".to_string(), amount: Money::ZERO }],
        };
        let err = zero_amount.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid evidence: investor amount must be positive at idx: 0"
        );

        let empty_id = InvestmentInfo {
            investors: vec![Investor { investor_id: String::new(), amount: Money::ONE }],
        };
        assert!(empty_id.validate().is_err());

        assert!(InvestmentInfo { investors: vec![] }.validate().is_err());

        let overflowing = InvestmentInfo {
            investors: vec![
                Investor { investor_id: "INV-1".to_string(), amount: Money::from_decimal(Decimal::MAX) },
                Investor { investor_id: "INV-2".to_string(), amount: Money::ONE },
            ],
        };
        assert!(matches!(overflowing.validate(), Err(LoanError::InvalidEvidence { .. })));
    }

    #[test]
    fn test_disbursement_validation() {
        let ok = DisbursementInfo {
            signed_agreement_url: "https://docs.example.com/signed/1.pdf".to_string(),
            field_officer_id: "OFF-7".to_string(),
            disbursement_date: date(),
        };
        assert!(ok.validate().is_ok());

        let no_officer = DisbursementInfo {
            field_officer_id: String::new(),
            ..ok.clone()
        };
        assert!(no_officer.validate().is_err());

        let relative_url = DisbursementInfo {
            signed_agreement_url: "signed/1.pdf".to_string(),
            ..ok
        };
        assert!(relative_url.validate().is_err());
    }

    #[test]
    fn test_request_uri() {
        assert!(is_request_uri("http://s3.amazonaws.com/loans/a.pdf"));
        assert!(is_request_uri("/local/proof.jpg"));
        assert!(is_request_uri("mailto:someone@example.com"));
        assert!(!is_request_uri(""));
        assert!(!is_request_uri("proof.jpg"));
        assert!(!is_request_uri("1http://x"));
        assert!(!is_request_uri("http://a b"));
    }

    #[test]
    fn test_date_ordering() {
        let created = date();
        let earlier = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        assert!(ensure_not_before(&created, &created, "approval").is_ok());
        assert!(matches!(
            ensure_not_before(&earlier, &created, "approval"),
            Err(LoanError::InvalidDate { .. })
        ));
    }
}
