use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::LoanConfig;
use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::events::{Event, EventStore};
use crate::evidence::{ensure_not_before, ApprovalInfo, DisbursementInfo, InvestmentInfo};
use crate::payments::{AmortizationSchedule, PaymentLedger, PaymentOutcome};
use crate::state::{LoanState, Transition};
use crate::types::{LoanId, PaymentKind};

/// loan aggregate
///
/// Exclusively owns its lifecycle state and its billing ledger. Nothing in
/// here is synchronized: callers hold at most one writer per loan.
#[derive(Debug)]
pub struct Loan {
    pub id: LoanId,
    pub borrower_id: String,
    pub config: LoanConfig,
    pub created_at: DateTime<Utc>,
    pub agreement_link: String,
    state: LoanState,
    ledger: PaymentLedger,
    approval: Option<ApprovalInfo>,
    investment: Option<InvestmentInfo>,
    disbursement: Option<DisbursementInfo>,
    pub events: EventStore,
}

impl Loan {
    /// propose a new loan
    #[instrument(name = "loan.propose", skip_all, fields(borrower_id = %borrower_id), err)]
    pub fn propose(config: LoanConfig, borrower_id: String, time_provider: &SafeTimeProvider) -> Result<Self> {
        config.validate()?;

        if borrower_id.trim().is_empty() {
            return Err(LoanError::InvalidEvidence {
                message: "borrower id is empty".to_string(),
            });
        }

        let ledger = PaymentLedger::with_policy(config.terms, config.billing)?;
        let id = Uuid::new_v4();
        let now = time_provider.now();
        let agreement_link = config.documents.agreement_link(&id);

        let mut loan = Self {
            id,
            borrower_id,
            created_at: now,
            agreement_link,
            state: LoanState::initial(),
            ledger,
            approval: None,
            investment: None,
            disbursement: None,
            events: EventStore::new(),
            config,
        };

        loan.events.emit(Event::LoanProposed {
            loan_id: id,
            borrower_id: loan.borrower_id.clone(),
            principal: loan.config.terms.principal,
            flat_rate: loan.config.terms.flat_rate,
            term_weeks: loan.config.terms.term_weeks,
            timestamp: now,
        });
        info!(loan_id = %id, "loan proposed");

        Ok(loan)
    }

    /// approve after field validation
    #[instrument(name = "loan.approve", skip_all, fields(loan_id = %self.id), err)]
    pub fn approve(&mut self, info: ApprovalInfo, time_provider: &SafeTimeProvider) -> Result<()> {
        info.validate()?;
        ensure_not_before(&info.approval_date, &self.created_at, "approval")?;
        let next = self.checked_transition(Transition::Approve)?;

        let now = time_provider.now();
        self.events.emit(Event::LoanApproved {
            loan_id: self.id,
            field_validator_id: info.field_validator_id.clone(),
            approval_date: info.approval_date,
            timestamp: now,
        });
        self.approval = Some(info);
        self.commit_state(next, now);

        Ok(())
    }

    /// record the one investment round
    #[instrument(name = "loan.invest", skip_all, fields(loan_id = %self.id), err)]
    pub fn invest(&mut self, info: InvestmentInfo, time_provider: &SafeTimeProvider) -> Result<()> {
        info.validate()?;

        let invested = info.total();
        let principal = self.config.terms.principal;
        if invested > principal {
            return Err(LoanError::InvestmentExceedsPrincipal { principal, invested });
        }

        let next = self.checked_transition(Transition::Invest)?;

        let now = time_provider.now();
        self.events.emit(Event::LoanInvested {
            loan_id: self.id,
            invested_amount: invested,
            investor_count: info.investors.len(),
            timestamp: now,
        });
        for investor in &info.investors {
            self.events.emit(Event::AgreementLetterIssued {
                loan_id: self.id,
                investor_id: investor.investor_id.clone(),
                agreement_link: self.agreement_link.clone(),
                timestamp: now,
            });
        }
        self.investment = Some(info);
        self.commit_state(next, now);

        Ok(())
    }

    /// hand the funds to the borrower
    #[instrument(name = "loan.disburse", skip_all, fields(loan_id = %self.id), err)]
    pub fn disburse(&mut self, info: DisbursementInfo, time_provider: &SafeTimeProvider) -> Result<()> {
        info.validate()?;
        ensure_not_before(&info.disbursement_date, &self.created_at, "disbursement")?;
        let next = self.checked_transition(Transition::Disburse)?;

        let now = time_provider.now();
        self.events.emit(Event::LoanDisbursed {
            loan_id: self.id,
            field_officer_id: info.field_officer_id.clone(),
            disbursement_date: info.disbursement_date,
            timestamp: now,
        });
        self.disbursement = Some(info);
        self.commit_state(next, now);

        Ok(())
    }

    /// apply one billing-cycle payment; exact installment or zero
    #[instrument(name = "loan.make_payment", skip(self, time_provider), fields(loan_id = %self.id), err)]
    pub fn make_payment(&mut self, amount: Money, time_provider: &SafeTimeProvider) -> Result<PaymentOutcome> {
        if self.state != LoanState::Disbursed {
            return Err(LoanError::LoanNotDisbursed { state: self.state });
        }

        let loan_id = self.id;
        let was_delinquent = self.ledger.is_delinquent();
        let record = self.ledger.apply_payment(amount).map_err(|e| {
            warn!(%loan_id, error = %e, "payment rejected");
            e
        })?;
        let now = time_provider.now();

        match record.kind {
            PaymentKind::Full => self.events.emit(Event::PaymentReceived {
                loan_id: self.id,
                cycle: record.cycle,
                week: record.week,
                amount: record.amount,
                outstanding: self.ledger.current_outstanding(),
                timestamp: now,
            }),
            PaymentKind::Missed => self.events.emit(Event::PaymentMissed {
                loan_id: self.id,
                cycle: record.cycle,
                week: record.week,
                missed_streak: self.ledger.missed_streak(),
                timestamp: now,
            }),
        }

        let is_delinquent = self.ledger.is_delinquent();
        if is_delinquent && !was_delinquent {
            warn!(loan_id = %self.id, missed_streak = self.ledger.missed_streak(), "borrower delinquent");
            self.events.emit(Event::DelinquencyStarted {
                loan_id: self.id,
                missed_streak: self.ledger.missed_streak(),
                timestamp: now,
            });
        } else if was_delinquent && !is_delinquent {
            self.events.emit(Event::DelinquencyCured {
                loan_id: self.id,
                timestamp: now,
            });
        }

        if record.kind == PaymentKind::Full && self.ledger.is_fully_repaid() {
            info!(loan_id = %self.id, "loan repaid");
            self.events.emit(Event::LoanRepaid {
                loan_id: self.id,
                total_paid: self.ledger.total_paid(),
                timestamp: now,
            });
        }

        Ok(PaymentOutcome::from_ledger(record, &self.ledger))
    }

    fn checked_transition(&self, transition: Transition) -> Result<LoanState> {
        self.state.apply(transition).map_err(|e| {
            warn!(loan_id = %self.id, state = %self.state, %transition, "transition rejected");
            e
        })
    }

    fn commit_state(&mut self, next: LoanState, timestamp: DateTime<Utc>) {
        let old_state = self.state;
        self.state = next;

        self.events.emit(Event::StateChanged {
            loan_id: self.id,
            old_state,
            new_state: next,
            timestamp,
        });
        info!(loan_id = %self.id, from = %old_state, to = %next, "loan state changed");
    }

    pub fn state(&self) -> LoanState {
        self.state
    }

    pub fn ledger(&self) -> &PaymentLedger {
        &self.ledger
    }

    pub fn outstanding(&self) -> Money {
        self.ledger.current_outstanding()
    }

    pub fn is_delinquent(&self) -> bool {
        self.ledger.is_delinquent()
    }

    pub fn schedule(&self) -> AmortizationSchedule {
        self.ledger.schedule()
    }

    pub fn remaining_schedule(&self) -> AmortizationSchedule {
        self.ledger.remaining_schedule()
    }

    /// return on investment: principal * flat rate
    pub fn roi(&self) -> Money {
        self.ledger.total_due()
    }

    pub fn invested_amount(&self) -> Money {
        self.investment.as_ref().map(|i| i.total()).unwrap_or(Money::ZERO)
    }

    pub fn approval(&self) -> Option<&ApprovalInfo> {
        self.approval.as_ref()
    }

    pub fn investment(&self) -> Option<&InvestmentInfo> {
        self.investment.as_ref()
    }

    pub fn disbursement(&self) -> Option<&DisbursementInfo> {
        self.disbursement.as_ref()
    }

    /// get events
    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use crate::evidence::Investor;
    use chrono::{Duration, TimeZone};
    use hourglass_rs::TimeSource;
    use rust_decimal_macros::dec;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn proposed(time: &SafeTimeProvider) -> Loan {
        let config = LoanConfig::weekly(Money::from_major(5_000), Rate::from_decimal(dec!(0.1)), 50);
        Loan::propose(config, "BOR-1".to_string(), time).unwrap()
    }

    fn approval(date: DateTime<Utc>) -> ApprovalInfo {
        ApprovalInfo {
            picture_proof_url: "https://proofs.example.com/1.jpg".to_string(),
            field_validator_id: "EMP-1".to_string(),
            approval_date: date,
        }
    }

    fn investment(amounts: &[i64]) -> InvestmentInfo {
        InvestmentInfo {
            investors: amounts
                .iter()
                .enumerate()
                .map(|(i, a)| Investor {
                    investor_id: format!("INV-{}", i + 1),
                    amount: Money::from_major(*a),
                })
                .collect(),
        }
    }

    fn disbursement(date: DateTime<Utc>) -> DisbursementInfo {
        DisbursementInfo {
            signed_agreement_url: "https://docs.example.com/signed/1.pdf".to_string(),
            field_officer_id: "OFF-1".to_string(),
            disbursement_date: date,
        }
    }

    fn disbursed(time: &SafeTimeProvider) -> Loan {
        let mut loan = proposed(time);
        let now = time.now();
        loan.approve(approval(now), time).unwrap();
        loan.invest(investment(&[5_000]), time).unwrap();
        loan.disburse(disbursement(now), time).unwrap();
        loan
    }

    #[test]
    fn test_propose() {
        let time = SafeTimeProvider::new(TimeSource::Test(start()));
        let loan = proposed(&time);

        assert_eq!(loan.state(), LoanState::Proposed);
        assert_eq!(loan.created_at, start());
        assert_eq!(loan.outstanding(), Money::from_major(500));
        assert_eq!(loan.roi(), Money::from_major(500));
        assert!(loan.agreement_link.ends_with(&format!("{}-agreement.pdf", loan.id)));
        assert!(matches!(loan.events.events()[0], Event::LoanProposed { .. }));
    }

    #[test]
    fn test_propose_rejects_invalid_config() {
        let time = SafeTimeProvider::new(TimeSource::Test(start()));

        let zero_weeks = LoanConfig::weekly(Money::from_major(5_000), Rate::ONE, 0);
        assert!(matches!(
            Loan::propose(zero_weeks, "BOR-1".to_string(), &time),
            Err(LoanError::InvalidLoanTerms { .. })
        ));

        let too_expensive = LoanConfig::loan_service(Money::from_major(5_000), Rate::ONE, 10);
        assert!(Loan::propose(too_expensive, "BOR-1".to_string(), &time).is_err());

        let ok = LoanConfig::weekly(Money::from_major(5_000), Rate::ONE, 10);
        assert!(Loan::propose(ok, String::new(), &time).is_err());
    }

    #[test]
    fn test_full_lifecycle() {
        let time = SafeTimeProvider::new(TimeSource::Test(start()));
        let control = time.test_control().unwrap();
        let mut loan = proposed(&time);

        control.advance(Duration::days(1));
        loan.approve(approval(time.now()), &time).unwrap();
        assert_eq!(loan.state(), LoanState::Approved);
        assert!(loan.approval().is_some());

        loan.invest(investment(&[3_000, 2_000]), &time).unwrap();
        assert_eq!(loan.state(), LoanState::Invested);
        assert_eq!(loan.invested_amount(), Money::from_major(5_000));

        loan.disburse(disbursement(time.now()), &time).unwrap();
        assert_eq!(loan.state(), LoanState::Disbursed);
        assert!(loan.disbursement().is_some());

        let events = loan.take_events();
        let letters = events
            .iter()
            .filter(|e| matches!(e, Event::AgreementLetterIssued { .. }))
            .count();
        assert_eq!(letters, 2);
        let state_changes = events
            .iter()
            .filter(|e| matches!(e, Event::StateChanged { .. }))
            .count();
        assert_eq!(state_changes, 3);
    }

    #[test]
    fn test_out_of_order_transitions_rejected() {
        let time = SafeTimeProvider::new(TimeSource::Test(start()));
        let mut loan = proposed(&time);

        let err = loan.invest(investment(&[100]), &time).unwrap_err();
        assert_eq!(
            err,
            LoanError::InvalidStateTransition {
                from: LoanState::Proposed,
                transition: Transition::Invest,
            }
        );
        assert!(loan.investment().is_none());

        assert!(loan.disburse(disbursement(time.now()), &time).is_err());
        assert_eq!(loan.state(), LoanState::Proposed);

        loan.approve(approval(time.now()), &time).unwrap();
        assert!(matches!(
            loan.approve(approval(time.now()), &time),
            Err(LoanError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn test_approval_before_creation_rejected() {
        let time = SafeTimeProvider::new(TimeSource::Test(start()));
        let mut loan = proposed(&time);

        let err = loan.approve(approval(start() - Duration::days(1)), &time).unwrap_err();
        assert!(matches!(err, LoanError::InvalidDate { .. }));
        assert_eq!(loan.state(), LoanState::Proposed);
        assert!(loan.approval().is_none());
    }

    #[test]
    fn test_investment_over_principal_rejected() {
        let time = SafeTimeProvider::new(TimeSource::Test(start()));
        let mut loan = proposed(&time);
        loan.approve(approval(time.now()), &time).unwrap();

        let err = loan.invest(investment(&[4_000, 2_000]), &time).unwrap_err();
        assert!(matches!(err, LoanError::InvestmentExceedsPrincipal { .. }));
        assert_eq!(loan.state(), LoanState::Approved);
        assert_eq!(loan.invested_amount(), Money::ZERO);
    }

    #[test]
    fn test_disbursement_before_creation_rejected() {
        let time = SafeTimeProvider::new(TimeSource::Test(start()));
        let mut loan = proposed(&time);
        loan.approve(approval(time.now()), &time).unwrap();
        loan.invest(investment(&[5_000]), &time).unwrap();

        let err = loan
            .disburse(disbursement(start() - Duration::hours(1)), &time)
            .unwrap_err();
        assert!(matches!(err, LoanError::InvalidDate { .. }));
        assert_eq!(loan.state(), LoanState::Invested);
    }

    #[test]
    fn test_payments_require_disbursement() {
        let time = SafeTimeProvider::new(TimeSource::Test(start()));
        let mut loan = proposed(&time);

        let err = loan.make_payment(Money::from_major(10), &time).unwrap_err();
        assert_eq!(err, LoanError::LoanNotDisbursed { state: LoanState::Proposed });
        assert_eq!(loan.outstanding(), Money::from_major(500));
    }

    #[test]
    fn test_payment_events_and_delinquency() {
        let time = SafeTimeProvider::new(TimeSource::Test(start()));
        let control = time.test_control().unwrap();
        let mut loan = disbursed(&time);
        loan.take_events();

        control.advance(Duration::weeks(1));
        let outcome = loan.make_payment(Money::from_major(10), &time).unwrap();
        assert_eq!(outcome.outstanding, Money::from_major(490));
        assert_eq!(outcome.remaining_installments, 49);

        control.advance(Duration::weeks(1));
        loan.make_payment(Money::ZERO, &time).unwrap();
        control.advance(Duration::weeks(1));
        let outcome = loan.make_payment(Money::ZERO, &time).unwrap();
        assert!(outcome.is_delinquent);
        assert!(loan.is_delinquent());

        control.advance(Duration::weeks(1));
        let outcome = loan.make_payment(Money::from_major(10), &time).unwrap();
        assert!(!outcome.is_delinquent);

        let events = loan.take_events();
        assert!(matches!(events[0], Event::PaymentReceived { cycle: 1, week: 1, .. }));
        assert!(matches!(events[1], Event::PaymentMissed { missed_streak: 1, .. }));
        assert!(matches!(events[2], Event::PaymentMissed { missed_streak: 2, .. }));
        assert!(matches!(events[3], Event::DelinquencyStarted { missed_streak: 2, .. }));
        assert!(matches!(events[4], Event::PaymentReceived { cycle: 4, week: 2, .. }));
        assert!(matches!(events[5], Event::DelinquencyCured { .. }));
    }

    #[test]
    fn test_rejected_payment_emits_nothing() {
        let time = SafeTimeProvider::new(TimeSource::Test(start()));
        let mut loan = disbursed(&time);
        loan.take_events();

        assert!(loan.make_payment(Money::from_major(20), &time).is_err());
        assert!(loan.take_events().is_empty());
        assert_eq!(loan.outstanding(), Money::from_major(500));
    }

    #[test]
    fn test_repayment_emits_repaid() {
        let time = SafeTimeProvider::new(TimeSource::Test(start()));
        let config = LoanConfig::weekly(Money::from_major(1_000), Rate::from_decimal(dec!(0.2)), 4);
        let mut loan = Loan::propose(config, "BOR-2".to_string(), &time).unwrap();
        loan.approve(approval(time.now()), &time).unwrap();
        loan.invest(investment(&[1_000]), &time).unwrap();
        loan.disburse(disbursement(time.now()), &time).unwrap();

        for _ in 0..4 {
            loan.make_payment(Money::from_major(50), &time).unwrap();
        }

        assert_eq!(loan.outstanding(), Money::ZERO);
        assert!(loan.remaining_schedule().is_empty());
        let repaid = loan
            .take_events()
            .into_iter()
            .find(|e| matches!(e, Event::LoanRepaid { .. }));
        assert_eq!(
            repaid.map(|e| match e {
                Event::LoanRepaid { total_paid, .. } => total_paid,
                _ => Money::ZERO,
            }),
            Some(Money::from_major(200))
        );
    }
}
