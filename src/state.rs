use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{LoanError, Result};

/// loan lifecycle state
///
/// Transitions run strictly forward, one step at a time:
/// proposed -> approved -> invested -> disbursed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoanState {
    /// created, waiting for field validation
    #[default]
    Proposed,
    /// validated by a field validator
    Approved,
    /// funded by investors
    Invested,
    /// money handed to the borrower (terminal)
    Disbursed,
}

/// named lifecycle operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    Approve,
    Invest,
    Disburse,
}

impl Transition {
    /// the only state this transition may start from
    pub fn source(&self) -> LoanState {
        match self {
            Transition::Approve => LoanState::Proposed,
            Transition::Invest => LoanState::Approved,
            Transition::Disburse => LoanState::Invested,
        }
    }

    /// the state this transition leads to
    pub fn target(&self) -> LoanState {
        match self {
            Transition::Approve => LoanState::Approved,
            Transition::Invest => LoanState::Invested,
            Transition::Disburse => LoanState::Disbursed,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Transition::Approve => "approve",
            Transition::Invest => "invest",
            Transition::Disburse => "disburse",
        };
        f.write_str(name)
    }
}

impl LoanState {
    /// state every new loan starts in
    pub fn initial() -> Self {
        LoanState::Proposed
    }

    pub fn approve(self) -> Result<LoanState> {
        self.apply(Transition::Approve)
    }

    pub fn invest(self) -> Result<LoanState> {
        self.apply(Transition::Invest)
    }

    pub fn disburse(self) -> Result<LoanState> {
        self.apply(Transition::Disburse)
    }

    /// apply a transition, returning the new state
    ///
    /// The receiver is a copy, so a failed transition leaves the caller's
    /// value untouched.
    pub fn apply(self, transition: Transition) -> Result<LoanState> {
        if self == transition.source() {
            Ok(transition.target())
        } else {
            Err(LoanError::InvalidStateTransition {
                from: self,
                transition,
            })
        }
    }

    /// the single transition legal from this state, if any
    pub fn next_transition(&self) -> Option<Transition> {
        match self {
            LoanState::Proposed => Some(Transition::Approve),
            LoanState::Approved => Some(Transition::Invest),
            LoanState::Invested => Some(Transition::Disburse),
            LoanState::Disbursed => None,
        }
    }

    pub fn can(&self, transition: Transition) -> bool {
        *self == transition.source()
    }

    pub fn is_terminal(&self) -> bool {
        self.next_transition().is_none()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoanState::Proposed => "proposed",
            LoanState::Approved => "approved",
            LoanState::Invested => "invested",
            LoanState::Disbursed => "disbursed",
        }
    }
}

impl fmt::Display for LoanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoanState {
    type Err = LoanError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "proposed" => Ok(LoanState::Proposed),
            "approved" => Ok(LoanState::Approved),
            "invested" => Ok(LoanState::Invested),
            "disbursed" => Ok(LoanState::Disbursed),
            other => Err(LoanError::UnknownState {
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Transition; 3] = [Transition::Approve, Transition::Invest, Transition::Disburse];

    fn legal_from(state: LoanState) -> Vec<Transition> {
        ALL.iter().copied().filter(|t| state.apply(*t).is_ok()).collect()
    }

    #[test]
    fn test_forward_path() {
        let state = LoanState::initial();
        assert_eq!(state, LoanState::Proposed);

        let state = state.approve().unwrap();
        assert_eq!(state, LoanState::Approved);

        let state = state.invest().unwrap();
        assert_eq!(state, LoanState::Invested);

        let state = state.disburse().unwrap();
        assert_eq!(state, LoanState::Disbursed);
        assert!(state.is_terminal());
    }

    #[test]
    fn test_only_one_transition_legal_per_state() {
        assert_eq!(legal_from(LoanState::Proposed), vec![Transition::Approve]);
        assert_eq!(legal_from(LoanState::Approved), vec![Transition::Invest]);
        assert_eq!(legal_from(LoanState::Invested), vec![Transition::Disburse]);
        assert!(legal_from(LoanState::Disbursed).is_empty());
    }

    #[test]
    fn test_no_skipping() {
        let err = LoanState::Proposed.disburse().unwrap_err();
        assert_eq!(
            err,
            LoanError::InvalidStateTransition {
                from: LoanState::Proposed,
                transition: Transition::Disburse,
            }
        );
        assert!(LoanState::Proposed.invest().is_err());
    }

    #[test]
    fn test_transitions_not_idempotent() {
        let approved = LoanState::Proposed.approve().unwrap();
        assert!(matches!(
            approved.approve(),
            Err(LoanError::InvalidStateTransition { from: LoanState::Approved, .. })
        ));
    }

    #[test]
    fn test_failed_transition_keeps_value() {
        let state = LoanState::Approved;
        let _ = state.disburse();
        assert_eq!(state, LoanState::Approved);
    }

    #[test]
    fn test_state_strings() {
        for state in [
            LoanState::Proposed,
            LoanState::Approved,
            LoanState::Invested,
            LoanState::Disbursed,
        ] {
            assert_eq!(state.as_str().parse::<LoanState>().unwrap(), state);
        }
        assert!("cancelled".parse::<LoanState>().is_err());

        let json = serde_json::to_string(&LoanState::Invested).unwrap();
        assert_eq!(json, "\"invested\"");
    }

    #[test]
    fn test_next_transition_matches_can() {
        for state in [LoanState::Proposed, LoanState::Approved, LoanState::Invested] {
            let next = state.next_transition().unwrap();
            assert!(state.can(next));
            assert_eq!(next.source(), state);
        }
    }
}
